use std::path::Path;

use pdfgate_pdf::{validate, LoadError, LoadOptions, PdfDocument, ValidatedPath};
use serde::Serialize;
use tracing::{debug, info, Level};

use crate::action::ActionNode;
use crate::error::ScanError;
use crate::locator::ActionLocator;
use crate::policy::DisallowPolicy;
use crate::security_log::{SecurityDomain, SecurityEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Upper bound on visited nodes per document; `None` walks everything.
    pub max_visits: Option<usize>,
    pub max_file_bytes: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { max_visits: None, max_file_bytes: LoadOptions::default().max_file_bytes }
    }
}

/// Serializable result of scanning one file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanOutcome {
    pub path: String,
    pub encrypted: bool,
    pub disallowed: bool,
    pub first_match: Option<ActionNode>,
}

/// Every action found in a document, without short-circuiting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Inventory {
    pub actions: Vec<ActionNode>,
    pub truncated: bool,
}

/// Checks documents against an immutable [`DisallowPolicy`]. Holds no
/// per-document state, so one scanner can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct ActionScanner {
    policy: DisallowPolicy,
    options: ScanOptions,
}

impl ActionScanner {
    pub fn new(policy: DisallowPolicy) -> Self {
        Self { policy, options: ScanOptions::default() }
    }

    pub fn with_options(policy: DisallowPolicy, options: ScanOptions) -> Self {
        Self { policy, options }
    }

    pub fn policy(&self) -> &DisallowPolicy {
        &self.policy
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn locate<'a>(&self, doc: &'a PdfDocument) -> ActionLocator<'a> {
        let locator = ActionLocator::new(doc);
        match self.options.max_visits {
            Some(max) => locator.with_max_visits(max),
            None => locator,
        }
    }

    /// True iff some reachable action's kind is in the policy. A walk cut
    /// short by `max_visits` before any hit also answers `true`.
    pub fn scan(&self, doc: &PdfDocument) -> bool {
        let search = self.search(doc);
        search.hit.is_some() || search.truncated
    }

    /// First disallowed action in walk order. Stops the walk on the first hit.
    /// `None` only means "none found within the visit budget".
    pub fn find_disallowed(&self, doc: &PdfDocument) -> Option<ActionNode> {
        self.search(doc).hit
    }

    pub fn inventory(&self, doc: &PdfDocument) -> Inventory {
        let mut locator = self.locate(doc);
        let actions: Vec<ActionNode> = locator.by_ref().collect();
        Inventory { actions, truncated: locator.truncated() }
    }

    /// Path-level predicate. Encrypted documents report `false`; a walk that
    /// exhausts `max_visits` without a hit is [`ScanError::Truncated`].
    pub fn contains_disallowed_actions(&self, path: Option<&Path>) -> Result<bool, ScanError> {
        self.scan_path(path).map(|outcome| outcome.disallowed)
    }

    pub fn scan_path(&self, path: Option<&Path>) -> Result<ScanOutcome, ScanError> {
        let validated = validate(path)?;
        let span = tracing::info_span!("scan_path", path = %validated);
        let _guard = span.enter();
        let display = validated.to_string();
        let doc = match self.open(&validated) {
            Ok(doc) => doc,
            Err(LoadError::Encrypted) => {
                SecurityEvent {
                    path: Some(&display),
                    ..SecurityEvent::new(
                        Level::INFO,
                        SecurityDomain::Encryption,
                        "encrypted_document_skipped",
                        "Encrypted document cannot be inspected; reporting no disallowed actions",
                    )
                }
                .emit();
                return Ok(ScanOutcome {
                    path: display,
                    encrypted: true,
                    disallowed: false,
                    first_match: None,
                });
            }
            Err(err) => {
                SecurityEvent {
                    path: Some(&display),
                    ..SecurityEvent::new(
                        Level::WARN,
                        SecurityDomain::Document,
                        "document_unreadable",
                        "Document could not be loaded",
                    )
                }
                .emit();
                return Err(err.into());
            }
        };
        let Search { hit: first_match, truncated, visits } = self.search(&doc);
        if truncated && first_match.is_none() {
            SecurityEvent {
                path: Some(&display),
                ..SecurityEvent::new(
                    Level::WARN,
                    SecurityDomain::Actions,
                    "action_walk_inconclusive",
                    "Visit budget exhausted before a verdict; refusing to report clean",
                )
            }
            .emit();
            return Err(ScanError::Truncated { visits });
        }
        if let Some(node) = &first_match {
            let object_id = node.object.map(|(num, gen)| format!("{num} {gen} obj"));
            let message = format!("Disallowed {} action found", node.kind);
            SecurityEvent {
                path: Some(&display),
                object_id: object_id.as_deref(),
                location: Some(node.location.as_str()),
                ..SecurityEvent::new(
                    Level::WARN,
                    SecurityDomain::Actions,
                    "disallowed_action",
                    &message,
                )
            }
            .emit();
        }
        info!(disallowed = first_match.is_some(), visits, "Scan complete");
        Ok(ScanOutcome {
            path: display,
            encrypted: false,
            disallowed: first_match.is_some(),
            first_match,
        })
    }

    /// Opens a validated path with this scanner's load limits.
    pub fn open(&self, path: &ValidatedPath) -> Result<PdfDocument, LoadError> {
        PdfDocument::open(path, &LoadOptions { max_file_bytes: self.options.max_file_bytes })
    }

    fn search(&self, doc: &PdfDocument) -> Search {
        if self.policy.is_empty() {
            debug!("Empty policy; skipping walk");
            return Search { hit: None, truncated: false, visits: 0 };
        }
        let mut locator = self.locate(doc);
        let hit = locator.by_ref().find(|node| self.policy.is_disallowed(node.kind));
        if locator.truncated() {
            SecurityEvent::new(
                Level::WARN,
                SecurityDomain::Actions,
                "action_walk_truncated",
                "Visit budget exhausted before the action walk finished",
            )
            .emit();
        }
        debug!(visits = locator.visits(), hit = hit.is_some(), "Action walk finished");
        Search { hit, truncated: locator.truncated(), visits: locator.visits() }
    }
}

struct Search {
    hit: Option<ActionNode>,
    truncated: bool,
    visits: usize,
}

/// [`ActionScanner::contains_disallowed_actions`] with the default policy.
pub fn contains_disallowed_actions(path: impl AsRef<Path>) -> Result<bool, ScanError> {
    ActionScanner::default().contains_disallowed_actions(Some(path.as_ref()))
}
