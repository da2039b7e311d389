// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! String key-value storage backends.
//!
//! This is the localStorage analog of the original client: a flat map of
//! string keys to JSON-encoded string values, either held in memory or
//! mirrored to a single JSON file. Every operation degrades instead of
//! raising; a failed write returns `false` and a failed read `None`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage backend contract.
pub trait KvBackend: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> bool;
    fn remove(&mut self, key: &str) -> bool;
    fn keys(&self) -> Vec<String>;
}

/// Purely in-memory backend (tests and `--storage none` runs).
#[derive(Default)]
pub struct MemoryKv {
    map: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.map.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key);
        true
    }

    fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }
}

/// File-backed backend: the whole map is rewritten on every mutation.
pub struct FileKv {
    path: PathBuf,
    map: HashMap<String, String>,
}

impl FileKv {
    /// Open (or create) the store at `path`. A missing or corrupt file
    /// starts empty rather than failing.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Corrupt storage file, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, map }
    }

    fn persist(&self) -> bool {
        let raw = match serde_json::to_string_pretty(&self.map) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode storage map");
                return false;
            }
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        match std::fs::write(&self.path, raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to write storage file");
                false
            }
        }
    }
}

impl KvBackend for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.map.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key);
        self.persist()
    }

    fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }
}

/// Cloneable handle over a shared backend.
///
/// The store, catalog cache, and identity provider all hold one of these,
/// mirroring how a browser profile shares a single localStorage.
#[derive(Clone)]
pub struct KvStore {
    inner: Arc<Mutex<Box<dyn KvBackend>>>,
}

impl KvStore {
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryKv::new()))
    }

    pub fn open_file<P: AsRef<Path>>(path: P) -> Self {
        Self::with_backend(Box::new(FileKv::open(path)))
    }

    pub fn with_backend(backend: Box<dyn KvBackend>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backend)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KvBackend>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Read and decode a JSON value. Absent or unparseable values are `None`.
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.lock().get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to parse stored value");
                None
            }
        }
    }

    /// Encode and write a JSON value. Returns `false` on any failure.
    pub fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.lock().set(key, &raw),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode value for storage");
                false
            }
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.lock().get(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }
}
