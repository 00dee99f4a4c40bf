//! Durable key-value slot for the cart.
//!
//! The cart is written as a single JSON document under [`CART_STORAGE_KEY`]:
//!
//! ```json
//! {"version": 1, "items": [{"product_id": "p1", "size": "M", "quantity": 2, ...}]}
//! ```
//!
//! Older clients wrote a bare array of lines with no version tag. That layout
//! is still read (as version 0) and is replaced by the tagged form on the next
//! write.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::line::{CartLine, checked_total};

/// Fixed key of the cart slot.
pub const CART_STORAGE_KEY: &str = "shoppingCart";

/// Version written by this client.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// Errors from the underlying key-value slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A durable string key-value slot (browser local storage, a file, memory).
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be durably written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a raw value, e.g. to simulate a previous
    /// session.
    #[must_use]
    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
        storage
    }

    /// Current raw value under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a crash
/// mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CartStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &target)?;
        Ok(())
    }
}

// =============================================================================
// Encoding
// =============================================================================

#[derive(Serialize)]
struct PersistedCartRef<'a> {
    version: u32,
    items: &'a [CartLine],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedCart {
    Versioned { version: u32, items: Vec<CartLine> },
    Legacy(Vec<CartLine>),
}

/// Serialize lines into the versioned slot layout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_lines(lines: &[CartLine]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&PersistedCartRef {
        version: CART_SCHEMA_VERSION,
        items: lines,
    })?)
}

/// Decode a slot value. Unreadable or unknown-version data yields an empty
/// cart.
///
/// Decoded lines are sanitized: zero quantities and negative prices are
/// dropped and repeated identities are merged into the first occurrence. A
/// line that would make the cart total overflow is dropped.
#[must_use]
pub fn decode_lines(raw: &str) -> Vec<CartLine> {
    let lines = match serde_json::from_str::<PersistedCart>(raw) {
        Ok(PersistedCart::Versioned { version, items }) if version <= CART_SCHEMA_VERSION => items,
        Ok(PersistedCart::Versioned { version, .. }) => {
            warn!(version, "Stored cart has an unsupported version, starting empty");
            return Vec::new();
        }
        Ok(PersistedCart::Legacy(items)) => items,
        Err(e) => {
            warn!(error = %e, "Stored cart is unreadable, starting empty");
            return Vec::new();
        }
    };

    sanitize(lines)
}

fn sanitize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut out: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 || line.unit_price.is_sign_negative() {
            warn!(product_id = %line.product_id, "Dropping invalid stored cart line");
            continue;
        }
        let product_id = line.product_id.clone();
        let key = line.key();
        let mut next = out.clone();
        if let Some(existing) = next.iter_mut().find(|l| l.matches(&key)) {
            let Some(quantity) = existing.quantity.checked_add(line.quantity) else {
                warn!(product_id = %product_id, "Dropping stored cart line with overflowing quantity");
                continue;
            };
            existing.quantity = quantity;
        } else {
            next.push(line);
        }
        if checked_total(&next).is_none() {
            warn!(product_id = %product_id, "Dropping stored cart line with overflowing total");
            continue;
        }
        out = next;
    }
    out
}
