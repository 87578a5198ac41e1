// # File Store
//
// File-based implementation of PersistenceStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename
// - Automatic backup: keeps `.backup` of the last known good document
// - Corruption detection: raw bytes validated as JSON on load
// - Recovery: falls back to the backup, then to an empty store
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "channels": {
//     "BBC One": { "icon": "", "commercial_detect": "none" }
//   }
// }
// ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::Error;
use crate::channel::ChannelRecord;
use crate::traits::PersistenceStore;

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-backed record store
///
/// Every `save`/`remove` rewrites the whole document atomically. A write
/// that fails leaves the in-memory copy updated and marked dirty so a later
/// `flush` can retry it.
///
/// # Example
///
/// ```rust,no_run
/// use chanreg_core::channel::ChannelRecord;
/// use chanreg_core::store::FileStore;
/// use chanreg_core::traits::PersistenceStore;
///
/// let store = FileStore::open("/var/lib/chanreg/channels.json")?;
/// store.save("BBC One", &ChannelRecord::default())?;
/// # Ok::<(), chanreg_core::Error>(())
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<FileState>,
}

#[derive(Debug)]
struct FileState {
    channels: BTreeMap<String, ChannelRecord>,
    dirty: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    saved_at: DateTime<Utc>,
    channels: BTreeMap<String, ChannelRecord>,
}

impl FileStore {
    /// Open or create a file store
    ///
    /// 1. Create parent directories if needed
    /// 2. Load the existing document
    /// 3. On corruption, load the backup and restore it over the main file
    /// 4. If both are unusable, start empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::config(format!(
                        "Failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let channels = Self::load_with_recovery(&path)?;

        Ok(Self {
            path,
            state: RwLock::new(FileState {
                channels,
                dirty: false,
            }),
        })
    }

    fn load_with_recovery(path: &Path) -> Result<BTreeMap<String, ChannelRecord>, Error> {
        match Self::load(path) {
            Ok(channels) => {
                tracing::debug!("Loaded channel store: {} records", channels.len());
                Ok(channels)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Channel store {} appears corrupted: {}. Attempting recovery from backup.",
                    path.display(),
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty channel store.");
                    return Ok(BTreeMap::new());
                }

                match Self::load(&backup_path) {
                    Ok(channels) => {
                        tracing::info!("Recovered channel store from backup: {} records", channels.len());
                        if let Err(e) = fs::copy(&backup_path, path) {
                            tracing::error!("Failed to restore channel store from backup: {}", e);
                        }
                        Ok(channels)
                    }
                    Err(e) => {
                        tracing::error!("Backup also unusable: {}. Starting with empty channel store.", e);
                        Ok(BTreeMap::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    fn load(path: &Path) -> Result<BTreeMap<String, ChannelRecord>, Error> {
        if !path.exists() {
            tracing::debug!("Channel store does not exist yet: {}", path.display());
            return Ok(BTreeMap::new());
        }

        let content = fs::read(path)?;
        let document: StoreFileFormat = serde_json::from_slice(&content)?;

        if document.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Channel store version mismatch: expected {}, got {}. Attempting to load anyway.",
                STORE_FILE_VERSION,
                document.version
            );
        }

        Ok(document.channels)
    }

    /// Write the document atomically, clearing the dirty flag on success
    fn write(&self, state: &mut RwLockWriteGuard<'_, FileState>) -> Result<(), Error> {
        let document = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            saved_at: Utc::now(),
            channels: state.channels.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).map_err(|e| {
                Error::persistence(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(json.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| {
                    Error::persistence(format!(
                        "Failed to write temp file {}: {}",
                        temp_path.display(),
                        e
                    ))
                })?;
        }

        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)) {
                tracing::warn!("Failed to create channel store backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state.dirty = false;
        tracing::trace!("Channel store written: {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, FileState>, Error> {
        self.state
            .write()
            .map_err(|_| Error::persistence("file store lock poisoned"))
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

impl PersistenceStore for FileStore {
    fn save(&self, channel_name: &str, record: &ChannelRecord) -> Result<(), Error> {
        let mut state = self.lock()?;
        state.channels.insert(channel_name.to_string(), record.clone());
        state.dirty = true;
        self.write(&mut state)
    }

    fn remove(&self, channel_name: &str) -> Result<(), Error> {
        let mut state = self.lock()?;
        if state.channels.remove(channel_name).is_none() {
            return Ok(());
        }
        state.dirty = true;
        self.write(&mut state)
    }

    fn load_all(&self) -> Result<Vec<(String, ChannelRecord)>, Error> {
        let state = self
            .state
            .read()
            .map_err(|_| Error::persistence("file store lock poisoned"))?;
        Ok(state
            .channels
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut state = self.lock()?;
        if state.dirty {
            self.write(&mut state)
        } else {
            Ok(())
        }
    }
}
