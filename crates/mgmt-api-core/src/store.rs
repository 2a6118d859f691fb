// ============================================
// File: crates/mgmt-api-core/src/store.rs
// ============================================
//! # Fingerprint Store
//!
//! ## Creation Reason
//! Persists the fingerprints an operator has approved, one per server,
//! so later connections can be pinned without asking again.
//!
//! ## Main Functionality
//! - `FingerprintStore::open`: creates the file with `{}` if absent
//! - `get` / `put` / `delete`: keyed by `"host:port"`
//! - `entries`: everything in the file, for listing
//!
//! ## File Format
//! ```text
//! {
//!   "mgmt.example.com:443": "BA7816BF8F01CFEA...",
//!   "10.0.0.5:4434": "5D41402ABC4B2A76..."
//! }
//! ```
//!
//! ## Concurrency
//! One `RwLock` per store guards the file. Lookups share the read side;
//! `put` and `delete` hold the write side for the whole read-modify-write.
//! Writes land in a sibling temp file which is then renamed over the
//! original, so readers never observe a half-written file.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The lock only serializes access through the same `FingerprintStore`;
//!   share one instance (behind `Arc`) between sessions in a process
//! - Stored case is kept as written; comparisons ignore case
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use mgmt_api_common::error::CommonError;
use mgmt_api_common::types::ServerEndpoint;

use crate::error::{CoreError, Result};

/// Default location of the fingerprint file.
pub const DEFAULT_FINGERPRINT_FILE: &str = "./fingerprints.txt";

type Entries = BTreeMap<String, String>;

// ============================================
// FingerprintStore
// ============================================

/// JSON-file backed map from `host:port` to fingerprint.
#[derive(Debug)]
pub struct FingerprintStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FingerprintStore {
    /// Opens the store at `path`, creating it with `{}` if it does not exist.
    ///
    /// # Errors
    /// Returns `StoreIo` if the file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                fs::write(&path, "{}")
                    .map_err(|e| CoreError::store_io(&path, "initialize", e))?;
                info!(path = %path.display(), "Created fingerprint store");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(CoreError::store_io(&path, "create", e)),
        }

        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the fingerprint stored for `host:port`.
    ///
    /// # Errors
    /// Returns a store error on I/O failure or malformed content.
    pub fn get(&self, host: &str, port: u16) -> Result<Option<String>> {
        let key = ServerEndpoint::new(host, port).store_key();
        let _guard = self.lock.read();
        Ok(self.read_entries()?.remove(&key))
    }

    /// Stores `fingerprint` for `host:port`, replacing any previous value.
    ///
    /// Does not touch the file if an equal value (ignoring case) is stored.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty host or fingerprint
    /// - Store errors on I/O failure or malformed content
    pub fn put(&self, host: &str, port: u16, fingerprint: &str) -> Result<()> {
        if host.is_empty() {
            return Err(CommonError::invalid_input("host", "cannot be empty").into());
        }
        let fingerprint = fingerprint.trim();
        if fingerprint.is_empty() {
            return Err(CommonError::invalid_input("fingerprint", "cannot be empty").into());
        }

        let key = ServerEndpoint::new(host, port).store_key();
        let _guard = self.lock.write();
        let mut entries = self.read_entries()?;

        if entries
            .get(&key)
            .is_some_and(|current| current.eq_ignore_ascii_case(fingerprint))
        {
            debug!(key = %key, "Fingerprint already stored");
            return Ok(());
        }

        entries.insert(key.clone(), fingerprint.to_owned());
        self.write_entries(&entries)?;
        info!(key = %key, "Stored server fingerprint");
        Ok(())
    }

    /// Removes the fingerprint for `host:port`. Absent keys are ignored.
    ///
    /// # Errors
    /// Returns a store error on I/O failure or malformed content.
    pub fn delete(&self, host: &str, port: u16) -> Result<()> {
        let key = ServerEndpoint::new(host, port).store_key();
        let _guard = self.lock.write();
        let mut entries = self.read_entries()?;

        if entries.remove(&key).is_none() {
            return Ok(());
        }

        self.write_entries(&entries)?;
        info!(key = %key, "Deleted server fingerprint");
        Ok(())
    }

    /// All stored `(key, fingerprint)` pairs, ordered by key.
    ///
    /// # Errors
    /// Returns a store error on I/O failure or malformed content.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let _guard = self.lock.read();
        Ok(self.read_entries()?.into_iter().collect())
    }

    // ========================================
    // File access (caller holds the lock)
    // ========================================

    fn read_entries(&self) -> Result<Entries> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| CoreError::store_io(&self.path, "read", e))?;
        serde_json::from_str(&text).map_err(|e| CoreError::store_malformed(&self.path, e))
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::from(CommonError::encoding("fingerprint store", e)))?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, text).map_err(|e| CoreError::store_io(&tmp_path, "write", e))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| CoreError::store_io(&self.path, "replace", e))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const FP1: &str = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
    const FP2: &str = "5D41402ABC4B2A76B9719D911017C592AE2B7F0F6C1E0C2E0F0A4B9A3E1C2D3F";

    fn temp_store() -> (tempfile::TempDir, FingerprintStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::open(dir.path().join("fingerprints.txt")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_empty_object() {
        let (_dir, store) = temp_store();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{}");
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_open_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fp.txt");
        fs::write(&path, format!(r#"{{"a:443":"{FP1}"}}"#)).unwrap();

        let store = FingerprintStore::open(&path).unwrap();
        assert_eq!(store.get("a", 443).unwrap().as_deref(), Some(FP1));
    }

    #[test]
    fn test_round_trip_and_overwrite() {
        let (_dir, store) = temp_store();
        store.put("mgmt", 443, FP1).unwrap();
        assert_eq!(store.get("mgmt", 443).unwrap().as_deref(), Some(FP1));

        store.put("mgmt", 443, FP2).unwrap();
        assert_eq!(store.get("mgmt", 443).unwrap().as_deref(), Some(FP2));
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_put_same_value_ignoring_case_keeps_stored_case() {
        let (_dir, store) = temp_store();
        store.put("mgmt", 443, &FP1.to_ascii_lowercase()).unwrap();
        store.put("mgmt", 443, FP1).unwrap();
        assert_eq!(
            store.get("mgmt", 443).unwrap(),
            Some(FP1.to_ascii_lowercase())
        );
    }

    #[test]
    fn test_keys_are_per_port() {
        let (_dir, store) = temp_store();
        store.put("mgmt", 443, FP1).unwrap();
        store.put("mgmt", 4434, FP2).unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                ("mgmt:443".to_owned(), FP1.to_owned()),
                ("mgmt:4434".to_owned(), FP2.to_owned()),
            ]
        );
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = temp_store();
        store.put("mgmt", 443, FP1).unwrap();
        store.delete("mgmt", 443).unwrap();
        assert_eq!(store.get("mgmt", 443).unwrap(), None);

        // absent key is a no-op
        store.delete("mgmt", 443).unwrap();
    }

    #[test]
    fn test_get_is_idempotent() {
        let (_dir, store) = temp_store();
        store.put("mgmt", 443, FP1).unwrap();
        let first = store.get("mgmt", 443).unwrap();
        for _ in 0..5 {
            assert_eq!(store.get("mgmt", 443).unwrap(), first);
        }
    }

    #[test]
    fn test_malformed_file() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "not json").unwrap();

        assert!(store.get("mgmt", 443).unwrap_err().is_store_error());
        assert!(store.put("mgmt", 443, FP1).unwrap_err().is_store_error());
        assert!(store.delete("mgmt", 443).unwrap_err().is_store_error());

        fs::write(store.path(), "[1, 2]").unwrap();
        assert!(store.entries().unwrap_err().is_store_error());
    }

    #[test]
    fn test_missing_file_after_open() {
        let (_dir, store) = temp_store();
        fs::remove_file(store.path()).unwrap();
        assert!(matches!(
            store.get("mgmt", 443),
            Err(CoreError::StoreIo { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_values() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.put("", 443, FP1),
            Err(CoreError::Common(_))
        ));
        assert!(matches!(
            store.put("mgmt", 443, "  "),
            Err(CoreError::Common(_))
        ));
    }

    #[test]
    fn test_concurrent_puts() {
        let (_dir, store) = temp_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8u16)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || store.put("mgmt", 1000 + i, FP1).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.entries().unwrap().len(), 8);
    }
}
