use std::collections::BTreeSet;

use crate::action::ActionKind;

/// Immutable set of action kinds treated as non-compliant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisallowPolicy {
    kinds: BTreeSet<ActionKind>,
}

impl DisallowPolicy {
    pub fn new<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = ActionKind>,
    {
        Self { kinds: kinds.into_iter().collect() }
    }

    /// Parses kind names, either variant names or raw `/S` tags.
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<ActionKind>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|kinds| Self { kinds })
    }

    pub fn is_disallowed(&self, kind: ActionKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.kinds.iter().copied()
    }
}

/// Every recognised kind except `Other`.
impl Default for DisallowPolicy {
    fn default() -> Self {
        Self::new(ActionKind::ALL.into_iter().filter(|kind| *kind != ActionKind::Other))
    }
}
