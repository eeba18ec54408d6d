//! JSON file store for review reply records
//!
//! The whole file is the unit of storage: every operation reads the full
//! array, and every mutation writes the full array back.
//!
//! # Consistency
//!
//! - Mutations inside this process are serialized by an async mutex, so two
//!   requests cannot interleave their read-modify-write cycles.
//! - The file is replaced atomically (temp file + rename), so readers never
//!   observe a half-written array.
//! - Other processes writing the same file (the refresh scripts) are not
//!   coordinated with; the last writer wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::records::{ListFilter, ReplyRecord, StoreScope};
use crate::Result;

/// Reply records persisted as one pretty-printed JSON array
#[derive(Debug)]
pub struct ReplyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ReplyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in file order
    ///
    /// A missing or blank file is an empty list. Malformed JSON is an error.
    pub async fn load(&self) -> Result<Vec<ReplyRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Data file {} not found, treating as empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Records matching `filter`, paired with their position in the file
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<(usize, ReplyRecord)>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .enumerate()
            .filter(|(_, record)| filter.matches(record))
            .collect())
    }

    /// Record at `index` if it exists, is visible to `scope` and is not deleted
    pub async fn get(&self, index: usize, scope: &StoreScope) -> Result<Option<ReplyRecord>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .nth(index)
            .filter(|record| !record.deleted && scope.permits(record)))
    }

    /// Overwrite the reply text of one record
    pub async fn save_reply(&self, index: usize, scope: &StoreScope, reply: &str) -> Result<bool> {
        self.update_one(index, scope, |record| {
            if record.reply == reply {
                return false;
            }
            record.reply = reply.to_string();
            true
        })
        .await
    }

    /// Mark one record as posted; posting twice changes nothing
    pub async fn mark_posted(&self, index: usize, scope: &StoreScope) -> Result<bool> {
        self.update_one(index, scope, |record| {
            !std::mem::replace(&mut record.posted, true)
        })
        .await
    }

    /// Soft-delete one record
    pub async fn soft_delete(&self, index: usize, scope: &StoreScope) -> Result<bool> {
        self.update_one(index, scope, |record| {
            !std::mem::replace(&mut record.deleted, true)
        })
        .await
    }

    /// Mark every matching, not yet posted record as posted
    ///
    /// Returns the number of records changed.
    pub async fn post_all(&self, filter: &ListFilter) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let mut changed = 0;
        for record in records.iter_mut().filter(|r| filter.matches(r) && !r.posted) {
            record.posted = true;
            changed += 1;
        }

        if changed > 0 {
            self.save(&records).await?;
            info!("Marked {} record(s) posted for scope {}", changed, filter.scope.label());
        }
        Ok(changed)
    }

    /// Apply `mutate` to the record at `index`
    ///
    /// Out-of-range indexes, records outside `scope` and deleted records are
    /// ignored. `mutate` reports whether it changed anything; the file is only
    /// rewritten when it did.
    async fn update_one<F>(&self, index: usize, scope: &StoreScope, mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut ReplyRecord) -> bool,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let Some(record) = records
            .get_mut(index)
            .filter(|record| !record.deleted && scope.permits(record))
        else {
            debug!("Ignoring update of record {} (missing or out of scope)", index);
            return Ok(false);
        };

        if !mutate(record) {
            return Ok(false);
        }

        self.save(&records).await?;
        Ok(true)
    }

    /// Replace the data file atomically
    async fn save(&self, records: &[ReplyRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)?;

        let mut temp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "replies.json".into());
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        tokio::fs::write(&temp_path, &json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!("Wrote {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}
