// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Opaque bearer credential shared between a manager and one agent node.
///
/// The canonical form is a 256-bit random value, hex-encoded (64 characters),
/// but the type accepts any non-empty opaque string so that externally
/// provisioned secrets can be carried unchanged.
///
/// # Invariants
///
/// - Immutable after construction. The loaded credential is injected into the
///   trust gateway at startup and never mutated for the lifetime of the
///   process.
/// - Comparison is constant-time (`subtle::ConstantTimeEq`). Inputs of a
///   different length short-circuit to `false`; only the length is leaked.
/// - `Debug` output is redacted so the secret never reaches the structured
///   log by accident.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Wrap an existing secret. Returns `None` for an empty string.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Build a credential from raw key material, hex-encoding it.
    pub fn from_key_material(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Access the secret value. Callers must not log the returned string.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Constant-time equality against a presented secret.
    pub fn matches(&self, presented: &str) -> bool {
        let ours = self.0.as_bytes();
        let theirs = presented.as_bytes();
        if ours.len() != theirs.len() {
            return false;
        }
        ours.ct_eq(theirs).into()
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiCredential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_identical_secret() {
        let credential = ApiCredential::new("a".repeat(64)).unwrap();
        assert!(credential.matches(&"a".repeat(64)));
    }

    #[test]
    fn test_rejects_different_secret_of_same_length() {
        let credential = ApiCredential::new("a".repeat(64)).unwrap();
        assert!(!credential.matches(&"b".repeat(64)));
    }

    #[test]
    fn test_rejects_different_length() {
        let credential = ApiCredential::new("abcdef").unwrap();
        assert!(!credential.matches("abcde"));
        assert!(!credential.matches("abcdef0"));
    }

    #[test]
    fn test_empty_secret_rejected_at_construction() {
        assert!(ApiCredential::new("").is_none());
    }

    #[test]
    fn test_from_key_material_is_hex() {
        let credential = ApiCredential::from_key_material(&[0u8; 32]);
        assert_eq!(credential.expose().len(), 64);
        assert!(credential.expose().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = ApiCredential::new("super-secret-value").unwrap();
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_serde_transparent_roundtrip() {
        let credential = ApiCredential::new("0f".repeat(32)).unwrap();
        let json = serde_json::to_string(&credential).unwrap();
        assert_eq!(json, format!("\"{}\"", credential.expose()));
        let parsed: ApiCredential = serde_json::from_str(&json).unwrap();
        assert!(parsed.matches(credential.expose()));
    }
}
