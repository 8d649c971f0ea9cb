use std::fs;

use lopdf::{Dictionary, Object, ObjectId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::path::ValidatedPath;

const DEFAULT_MAX_FILE_BYTES: u64 = 256 * 1024 * 1024;
const HEADER_SEARCH_BYTES: usize = 1024;
/// Indirect objects stored as bare references are followed at most this far.
const MAX_REFERENCE_HOPS: usize = 16;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("document is encrypted")]
    Encrypted,
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("corrupt PDF: {0}")]
    Corrupt(String),
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub max_file_bytes: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { max_file_bytes: DEFAULT_MAX_FILE_BYTES }
    }
}

/// A parsed, unencrypted PDF. Read-only for its whole lifetime.
#[derive(Debug)]
pub struct PdfDocument {
    inner: lopdf::Document,
    catalog_id: ObjectId,
}

impl PdfDocument {
    pub fn open(path: &ValidatedPath, options: &LoadOptions) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io { path: path.to_string(), source };
        let size = fs::metadata(path).map_err(io_err)?.len();
        if size > options.max_file_bytes {
            warn!(path = %path, size, limit = options.max_file_bytes, "PDF exceeds size limit");
            return Err(LoadError::TooLarge { size, limit: options.max_file_bytes });
        }
        let bytes = fs::read(path).map_err(io_err)?;
        debug!(path = %path, bytes = bytes.len(), "Read PDF");
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let head = &bytes[..bytes.len().min(HEADER_SEARCH_BYTES)];
        if !head.windows(5).any(|w| w == b"%PDF-") {
            return Err(LoadError::UnsupportedFormat("missing %PDF- header".into()));
        }
        let inner =
            lopdf::Document::load_mem(bytes).map_err(|e| LoadError::Corrupt(e.to_string()))?;
        Self::from_document(inner)
    }

    /// Wraps an already parsed document, rejecting it if it is encrypted or has
    /// no resolvable catalog.
    ///
    /// Encryption is read from the parsed trailer only. lopdf leaves strings and
    /// streams encrypted on load, so nothing here is decrypted.
    pub fn from_document(inner: lopdf::Document) -> Result<Self, LoadError> {
        if inner.trailer.get(b"Encrypt").is_ok() || inner.is_encrypted() {
            info!("Trailer declares /Encrypt; document not inspected");
            return Err(LoadError::Encrypted);
        }
        let catalog_id = match inner.trailer.get(b"Root") {
            Ok(Object::Reference(id)) => *id,
            _ => return Err(LoadError::Corrupt("trailer has no /Root reference".into())),
        };
        let doc = Self { inner, catalog_id };
        if doc.get(catalog_id).and_then(as_dict).is_none() {
            return Err(LoadError::Corrupt(format!(
                "catalog {} {} is not a dictionary",
                catalog_id.0, catalog_id.1
            )));
        }
        info!(
            version = %doc.inner.version,
            objects = doc.inner.objects.len(),
            "Loaded PDF document"
        );
        Ok(doc)
    }

    pub fn catalog_id(&self) -> ObjectId {
        self.catalog_id
    }

    pub fn catalog(&self) -> Option<&Dictionary> {
        self.get(self.catalog_id).and_then(as_dict)
    }

    /// Looks up an indirect object, following reference-to-reference chains.
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        let mut current = self.inner.objects.get(&id)?;
        for _ in 0..MAX_REFERENCE_HOPS {
            match current {
                Object::Reference(next) => current = self.inner.objects.get(next)?,
                other => return Some(other),
            }
        }
        None
    }

    /// Resolves `obj` if it is a reference, otherwise returns it unchanged.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.get(*id),
            other => Some(other),
        }
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.inner.trailer
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    pub fn object_count(&self) -> usize {
        self.inner.objects.len()
    }
}

/// Dictionary view of a dictionary or stream object.
pub fn as_dict(obj: &Object) -> Option<&Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn minimal() -> lopdf::Document {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.add_object(dictionary! { "Type" => "Pages", "Kids" => Vec::<Object>::new(), "Count" => 0 });
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn wraps_minimal_document() {
        let doc = PdfDocument::from_document(minimal()).expect("load");
        let catalog = doc.catalog().expect("catalog");
        assert!(catalog.get(b"Pages").is_ok());
        assert_eq!(doc.version(), "1.7");
    }

    #[test]
    fn rejects_encrypted_trailer() {
        let mut inner = minimal();
        let encrypt_id = inner.add_object(dictionary! { "Filter" => "Standard", "V" => 1, "R" => 2 });
        inner.trailer.set("Encrypt", encrypt_id);
        assert!(matches!(PdfDocument::from_document(inner), Err(LoadError::Encrypted)));
    }

    #[test]
    fn encrypt_text_inside_strings_is_not_encryption() {
        let mut inner = minimal();
        let info = inner.add_object(dictionary! {
            "Title" => Object::string_literal("trailer<</Encrypt 1>>"),
            "Subject" => Object::string_literal("trailer\n<< /Encrypt 2 0 R >>"),
        });
        inner.trailer.set("Info", info);
        let mut bytes = Vec::new();
        inner.save_to(&mut bytes).expect("save");
        let doc = PdfDocument::from_bytes(&bytes).expect("not encrypted");
        assert!(doc.catalog().is_some());
    }

    #[test]
    fn encrypted_trailer_survives_round_trip_through_bytes() {
        let mut inner = minimal();
        let encrypt_id = inner.add_object(dictionary! { "Filter" => "Standard", "V" => 1, "R" => 2 });
        inner.trailer.set("Encrypt", encrypt_id);
        let mut bytes = Vec::new();
        inner.save_to(&mut bytes).expect("save");
        assert!(matches!(PdfDocument::from_bytes(&bytes), Err(LoadError::Encrypted)));
    }

    #[test]
    fn rejects_missing_root() {
        let mut inner = minimal();
        inner.trailer.remove(b"Root");
        assert!(matches!(PdfDocument::from_document(inner), Err(LoadError::Corrupt(_))));
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = PdfDocument::from_bytes(b"GIF89a not a pdf").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn garbage_after_header_is_corrupt() {
        let err = PdfDocument::from_bytes(b"%PDF-1.7\nthis is not an object graph").unwrap_err();
        assert!(matches!(err, LoadError::Corrupt(_)));
    }

    #[test]
    fn follows_reference_chains() {
        let mut inner = minimal();
        let target = inner.add_object(dictionary! { "S" => "JavaScript" });
        let alias = inner.add_object(Object::Reference(target));
        let doc = PdfDocument::from_document(inner).expect("load");
        let resolved = doc.get(alias).and_then(as_dict).expect("dict");
        assert!(resolved.get(b"S").is_ok());
    }

    #[test]
    fn reference_loops_resolve_to_none() {
        let mut inner = minimal();
        let a = inner.new_object_id();
        let b = inner.new_object_id();
        inner.objects.insert(a, Object::Reference(b));
        inner.objects.insert(b, Object::Reference(a));
        let doc = PdfDocument::from_document(inner).expect("load");
        assert!(doc.get(a).is_none());
    }
}
