use std::fmt;
use std::str::FromStr;

use pdfgate_pdf::ObjectId;
use serde::{Deserialize, Serialize};

/// Action types the scanner distinguishes. Anything else lands in `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ActionKind {
    Launch,
    JavaScript,
    GoToRemote,
    GoToEmbedded,
    SubmitForm,
    ImportData,
    Sound,
    Movie,
    Hide,
    Named,
    Other,
}

/// Named actions that only move between pages.
const NAVIGATION_NAMES: &[&[u8]] = &[b"NextPage", b"PrevPage", b"FirstPage", b"LastPage"];

impl ActionKind {
    pub const ALL: [ActionKind; 11] = [
        ActionKind::Launch,
        ActionKind::JavaScript,
        ActionKind::GoToRemote,
        ActionKind::GoToEmbedded,
        ActionKind::SubmitForm,
        ActionKind::ImportData,
        ActionKind::Sound,
        ActionKind::Movie,
        ActionKind::Hide,
        ActionKind::Named,
        ActionKind::Other,
    ];

    /// Maps an action dictionary's `/S` value to a kind. `named` is the `/N`
    /// entry, consulted only for `Named` actions.
    pub fn classify(subtype: &[u8], named: Option<&[u8]>) -> Self {
        match subtype {
            b"Launch" => ActionKind::Launch,
            b"JavaScript" => ActionKind::JavaScript,
            b"GoToR" => ActionKind::GoToRemote,
            b"GoToE" => ActionKind::GoToEmbedded,
            b"SubmitForm" => ActionKind::SubmitForm,
            b"ImportData" => ActionKind::ImportData,
            b"Sound" => ActionKind::Sound,
            b"Movie" => ActionKind::Movie,
            b"Hide" => ActionKind::Hide,
            b"Named" => match named {
                Some(name) if NAVIGATION_NAMES.iter().any(|nav| *nav == name) => ActionKind::Other,
                _ => ActionKind::Named,
            },
            _ => ActionKind::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Launch => "Launch",
            ActionKind::JavaScript => "JavaScript",
            ActionKind::GoToRemote => "GoToRemote",
            ActionKind::GoToEmbedded => "GoToEmbedded",
            ActionKind::SubmitForm => "SubmitForm",
            ActionKind::ImportData => "ImportData",
            ActionKind::Sound => "Sound",
            ActionKind::Movie => "Movie",
            ActionKind::Hide => "Hide",
            ActionKind::Named => "Named",
            ActionKind::Other => "Other",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the variant name or the raw PDF `/S` tag (`GoToR`, `GoToE`),
/// case-insensitively.
impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('/');
        if trimmed.eq_ignore_ascii_case("GoToR") {
            return Ok(ActionKind::GoToRemote);
        }
        if trimmed.eq_ignore_ascii_case("GoToE") {
            return Ok(ActionKind::GoToEmbedded);
        }
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown action kind '{}'", s.trim()))
    }
}

/// Where in the document an action was attached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLocation {
    DocumentOpen,
    DocumentEvent,
    DocumentScript,
    PageOpen,
    PageClose,
    Annotation,
    OutlineItem,
    FormField,
}

impl SourceLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceLocation::DocumentOpen => "document-open",
            SourceLocation::DocumentEvent => "document-event",
            SourceLocation::DocumentScript => "document-script",
            SourceLocation::PageOpen => "page-open",
            SourceLocation::PageClose => "page-close",
            SourceLocation::Annotation => "annotation",
            SourceLocation::OutlineItem => "outline-item",
            SourceLocation::FormField => "form-field",
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located action dictionary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionNode {
    pub kind: ActionKind,
    /// The `/S` value as written, empty when missing.
    pub raw_type: String,
    pub location: SourceLocation,
    /// Indirect object holding the action, `None` for inline dictionaries.
    #[serde(serialize_with = "serialize_object_id")]
    pub object: Option<ObjectId>,
    /// Event key the action hangs off (`O`, `C`, `K`, `WC`, ...), or the
    /// name-tree key for document scripts.
    pub trigger: Option<String>,
}

impl fmt::Display for ActionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.location)?;
        if let Some(trigger) = &self.trigger {
            write!(f, " [{trigger}]")?;
        }
        if let Some((num, gen)) = self.object {
            write!(f, " ({num} {gen} obj)")?;
        }
        Ok(())
    }
}

fn serialize_object_id<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match id {
        Some((num, gen)) => serializer.serialize_some(&format!("{num} {gen} R")),
        None => serializer.serialize_none(),
    }
}
