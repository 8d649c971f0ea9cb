//! Detects interactive PDF actions (JavaScript, launch, remote go-to and
//! friends) that a [`DisallowPolicy`] forbids.
//!
//! Encrypted documents cannot be inspected and are reported as containing no
//! disallowed actions.

pub mod action;
pub mod config;
pub mod error;
pub mod locator;
pub mod policy;
pub mod scan;
pub mod security_log;

pub use crate::action::{ActionKind, ActionNode, SourceLocation};
pub use crate::config::Config;
pub use crate::error::ScanError;
pub use crate::locator::ActionLocator;
pub use crate::policy::DisallowPolicy;
pub use crate::scan::{contains_disallowed_actions, ActionScanner, Inventory, ScanOptions, ScanOutcome};
pub use pdfgate_pdf::{validate, LoadError, PdfDocument};
