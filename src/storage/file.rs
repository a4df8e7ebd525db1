//! JSON file preference store
//!
//! Entries live in a single JSON document:
//!
//! ```json
//! { "version": 1, "entries": { "theme": { "kind": "string", "value": "dark" } } }
//! ```
//!
//! Commits take an exclusive lock on a sidecar `<file>.lock`, merge the
//! batch into the current on-disk state, and replace the document with an
//! fsynced temp file + rename. Readers are served from the in-memory view,
//! which [`FileStore::reload`] refreshes.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{validate_key, Batch, PreferenceStore, StoreError};
use crate::domain::PrefValue;

/// On-disk document layout
#[derive(Debug, Deserialize)]
struct PrefsFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, PrefValue>,
}

impl PrefsFile {
    /// Format version - bump when the layout changes
    const VERSION: u32 = 1;
}

/// Store backed by a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, PrefValue>>,
}

impl FileStore {
    /// Opens the store at `path`, loading existing entries if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = load(&path)?;

        log::debug!(
            "Opened preference file {} ({} entries)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file, picking up commits made through other handles
    pub fn reload(&self) -> Result<(), StoreError> {
        let fresh = load(&self.path)?;
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        log::debug!("Reloaded preference file {}", self.path.display());
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, "lock")
    }

    fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, "tmp")
    }

    /// Writes all entries to the file (full rewrite, atomic)
    fn write_all(&self, entries: &BTreeMap<String, PrefValue>) -> Result<(), StoreError> {
        let temp_path = self.temp_path();

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let mut writer = BufWriter::new(&file);
            let document = PrefsFileRef {
                version: PrefsFile::VERSION,
                entries,
            };
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            drop(writer);

            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// Borrowed form of [`PrefsFile`] for writing without cloning entries
#[derive(Serialize)]
struct PrefsFileRef<'a> {
    version: u32,
    entries: &'a BTreeMap<String, PrefValue>,
}

impl PreferenceStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<PrefValue>, StoreError> {
        validate_key(key)?;
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn all(&self) -> Result<BTreeMap<String, PrefValue>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.clone())
    }

    fn commit(&self, batch: &Batch) -> Result<(), StoreError> {
        batch.validate()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        // Hold the write guard across the disk write so readers never see a
        // state that failed to persist
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut merged = load(&self.path)?;
        batch.apply_to(&mut merged);
        self.write_all(&merged)?;
        *entries = merged;

        log::debug!(
            "Committed {} change(s) to {}",
            batch.len(),
            self.path.display()
        );

        // Lock is released when lock_file is dropped
        Ok(())
    }
}

/// Reads the document at `path`; a missing file is an empty store
fn load(path: &Path) -> Result<BTreeMap<String, PrefValue>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let document: PrefsFile =
        serde_json::from_reader(BufReader::new(&file)).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

    if document.version > PrefsFile::VERSION {
        log::warn!(
            "Preference file {} has newer format version {}",
            path.display(),
            document.version
        );
    }

    Ok(document.entries)
}

/// `prefs.json` -> `prefs.json.lock`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
