//! Secure-content oracle.

use std::collections::BTreeMap;

use deepshell_types::error::{GameError, Result};

/// Resolves secure-content references to text.
///
/// Implementations must be idempotent and free of side effects: the tree
/// calls `resolve` once per read and never caches the answer.
pub trait ContentOracle {
    fn resolve(&self, id: &str) -> Result<String>;
}

/// Oracle backed by a fixed table, usually the `[content]` config section.
#[derive(Debug, Clone, Default)]
pub struct StaticContentOracle {
    entries: BTreeMap<String, String>,
}

impl StaticContentOracle {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl ContentOracle for StaticContentOracle {
    fn resolve(&self, id: &str) -> Result<String> {
        log::debug!("resolving secure content '{id}'");
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| GameError::Oracle(format!("unknown content id '{id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_id() {
        let mut entries = BTreeMap::new();
        entries.insert("k".to_string(), "v".to_string());
        let oracle = StaticContentOracle::new(entries);
        assert_eq!(oracle.resolve("k").unwrap(), "v");
        assert_eq!(oracle.resolve("k").unwrap(), "v");
    }

    #[test]
    fn unknown_id_is_oracle_error() {
        let oracle = StaticContentOracle::default();
        assert!(matches!(oracle.resolve("nope"), Err(GameError::Oracle(_))));
    }
}
