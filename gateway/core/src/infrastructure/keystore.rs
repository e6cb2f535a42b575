// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # File-Backed Credential Store
//!
//! Load-or-generate-once persistence for the shared-secret trust layer.
//!
//! ## Invariants
//!
//! - A credential already on disk is **never** regenerated: doing so would
//!   silently invalidate every previously-issued client credential. The
//!   store only writes when no key file exists.
//! - Generated keys are 256 bits from the OS CSPRNG, hex-encoded (64
//!   characters), stored as `{"key": "<hex>"}` — wire-compatible with
//!   earlier agent generations.
//! - The key file is chmod 0600 on Unix.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::credential::ApiCredential;

#[derive(Serialize, Deserialize)]
struct KeyFile {
    key: ApiCredential,
}

pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted credential, generating and persisting a fresh one
    /// only if no key file exists yet.
    pub fn load_or_generate(&self) -> Result<ApiCredential> {
        if self.path.exists() {
            let credential = self.load()?;
            info!(key_file = %self.path.display(), "Loaded existing API credential");
            return Ok(credential);
        }

        let mut material = [0u8; 32];
        OsRng.fill_bytes(&mut material);
        let credential = ApiCredential::from_key_material(&material);

        self.persist(&credential)?;
        info!(
            key_file = %self.path.display(),
            "Generated new API credential — copy it to the manager registration"
        );
        Ok(credential)
    }

    fn load(&self) -> Result<ApiCredential> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read key file {:?}", self.path))?;
        let key_file: KeyFile = serde_json::from_str(&content)
            .with_context(|| format!("Malformed key file {:?}", self.path))?;
        Ok(key_file.key)
    }

    fn persist(&self, credential: &ApiCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create key directory {:?}", parent))?;
            }
        }

        let content = serde_json::to_string(&KeyFile {
            key: credential.clone(),
        })?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write key file {:?}", self.path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict key file permissions {:?}", self.path))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_64_hex_character_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("key.json"));

        let credential = store.load_or_generate().unwrap();
        assert_eq!(credential.expose().len(), 64);
        assert!(credential.expose().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reload_returns_same_value_without_regenerating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");

        let first = FileKeyStore::new(&path).load_or_generate().unwrap();
        let second = FileKeyStore::new(&path).load_or_generate().unwrap();
        assert_eq!(first.expose(), second.expose());
    }

    #[test]
    fn test_existing_key_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        std::fs::write(&path, format!("{{\"key\":\"{}\"}}", "ab".repeat(32))).unwrap();

        let credential = FileKeyStore::new(&path).load_or_generate().unwrap();
        assert_eq!(credential.expose(), "ab".repeat(32));

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains(&"ab".repeat(32)));
    }

    #[test]
    fn test_malformed_key_file_is_an_error_not_a_regeneration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileKeyStore::new(&path).load_or_generate().is_err());
        // The broken file must still be on disk for the operator to inspect.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("key.json");

        let credential = FileKeyStore::new(&path).load_or_generate().unwrap();
        assert!(path.exists());
        assert_eq!(credential.expose().len(), 64);
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions_are_restricted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        FileKeyStore::new(&path).load_or_generate().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
