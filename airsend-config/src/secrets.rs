//! Secret storage and reference resolution.

use std::collections::HashMap;

use crate::document::{Block, Scalar};

/// Marker that introduces a secret reference in a configuration value.
pub const SECRET_PREFIX: &str = "!secret";

/// Secret providing the store-wide default device credential.
pub const DEFAULT_CREDENTIAL_SECRET: &str = "airsend_password";

/// A read-only mapping from secret name to scalar value.
///
/// Loaded once at startup from the secrets document; only top-level scalar
/// entries are kept.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    values: HashMap<String, Scalar>,
}

impl SecretStore {
    pub fn from_block(block: &Block) -> Self {
        let values = block
            .entries()
            .filter_map(|(key, node)| {
                node.as_scalar()
                    .map(|scalar| (key.to_string(), scalar.clone()))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    /// Secret value rendered as a string.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).map(Scalar::to_display_string)
    }

    /// Resolve a possible secret reference.
    ///
    /// A value starting with `!secret` is replaced by the referenced secret.
    /// When the referenced key does not exist, the literal reference text is
    /// returned unchanged so a misconfigured secret never aborts startup.
    pub fn resolve(&self, value: &str) -> String {
        if let Some(rest) = value.strip_prefix(SECRET_PREFIX) {
            let key = rest.trim();
            if let Some(resolved) = self.get_str(key) {
                return resolved;
            }
        }
        value.to_string()
    }

    /// The store-wide default device credential, if configured.
    pub fn default_credential(&self) -> Option<String> {
        self.get_str(DEFAULT_CREDENTIAL_SECRET)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
