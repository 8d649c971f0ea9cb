pub mod document;
pub mod path;

pub use crate::document::{as_dict, LoadError, LoadOptions, PdfDocument};
pub use crate::path::{validate, InvalidPath, ValidatedPath};
pub use lopdf::{Dictionary, Object, ObjectId};
