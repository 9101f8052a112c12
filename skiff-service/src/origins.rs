//! Origin authorization store
//!
//! Set of origins granted standing account access. Membership means future
//! account-access requests from that origin bypass user approval. Persisted
//! with the wallet so re-approval is not needed across restarts.

use std::collections::BTreeSet;

/// Set of authorized origins
#[derive(Debug, Default)]
pub struct AuthorizedOrigins {
    origins: BTreeSet<String>,
}

impl AuthorizedOrigins {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from the persisted origin list
    pub fn from_vec(origins: Vec<String>) -> Self {
        Self {
            origins: origins.into_iter().collect(),
        }
    }

    /// Grant standing access to an origin; idempotent
    pub fn add(&mut self, origin: &str) {
        self.origins.insert(origin.to_string());
    }

    /// Revoke standing access; returns whether the origin was present
    pub fn remove(&mut self, origin: &str) -> bool {
        self.origins.remove(origin)
    }

    /// Whether an origin has standing access
    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    /// Sorted list for persistence and snapshots
    pub fn to_vec(&self) -> Vec<String> {
        self.origins.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke() {
        let mut origins = AuthorizedOrigins::new();
        origins.add("https://a.example");
        assert!(origins.contains("https://a.example"));
        assert!(!origins.contains("https://b.example"));

        assert!(origins.remove("https://a.example"));
        assert!(!origins.contains("https://a.example"));
        assert!(!origins.remove("https://a.example"));
    }

    #[test]
    fn test_roundtrip_is_sorted_and_deduped() {
        let origins = AuthorizedOrigins::from_vec(vec![
            "https://b.example".to_string(),
            "https://a.example".to_string(),
            "https://a.example".to_string(),
        ]);
        assert_eq!(
            origins.to_vec(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
