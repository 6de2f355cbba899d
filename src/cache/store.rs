use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: u16,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

/// JSON file holding every stored response, keyed by request URL.
#[derive(Debug)]
pub struct CacheStore {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl CacheStore {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn memory() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<BTreeMap<String, CacheEntry>, CacheError> {
        let Some(path) = &self.path else {
            return Ok(BTreeMap::new());
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the file contents with the map built by `snapshot`.
    ///
    /// `snapshot` runs under the write lock, so a later writer never sees an
    /// older map than an earlier one. Writes go to a sibling temp file first
    /// so a crash never leaves a truncated store.
    pub async fn save_with<F>(&self, snapshot: F) -> Result<(), CacheError>
    where
        F: FnOnce() -> BTreeMap<String, CacheEntry>,
    {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;
        let json = serde_json::to_vec(&snapshot())?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
