//! Whole-collection JSON persistence, one file per entity kind.
//!
//! Each store keeps its collection in memory behind a single async mutex and
//! rewrites the backing file on every mutation. A mutation is staged on a
//! copy of the collection and only becomes visible once the file has been
//! replaced, so memory and disk never disagree.

pub mod locks;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::utils::error::{BoxOfficeError, Result};

pub use locks::SeatLocks;

/// Layout version written into every collection file.
pub const SCHEMA_VERSION: u32 = 1;

/// A persisted entity with an immutable identifier.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + 'static {
    /// File stem of the collection, e.g. `tickets` for `tickets.json`.
    const RESOURCE: &'static str;

    fn id(&self) -> Uuid;
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    schema_version: u32,
    records: &'a [T],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCollection<T> {
    Versioned { schema_version: u32, records: Vec<T> },
    Unversioned(Vec<T>),
}

pub struct FileStore<T> {
    path: PathBuf,
    lock_timeout: Duration,
    records: Mutex<Option<Vec<T>>>,
}

impl<T: Record> FileStore<T> {
    pub fn open(root: &Path, lock_timeout: Duration) -> Self {
        Self {
            path: root.join(format!("{}.json", T::RESOURCE)),
            lock_timeout,
            records: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_all(&self) -> Result<Vec<T>> {
        let mut guard = self.lock().await?;
        Ok(loaded(&mut guard).clone())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<T>> {
        self.find(|record| record.id() == id).await
    }

    pub async fn find<P>(&self, predicate: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        let mut guard = self.lock().await?;
        Ok(loaded(&mut guard).iter().find(|r| predicate(r)).cloned())
    }

    pub async fn filter<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        let mut guard = self.lock().await?;
        Ok(loaded(&mut guard)
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    pub async fn count(&self) -> Result<usize> {
        let mut guard = self.lock().await?;
        Ok(loaded(&mut guard).len())
    }

    pub async fn save(&self, item: T) -> Result<()> {
        self.transaction(move |records| {
            records.push(item);
            Ok(())
        })
        .await
    }

    /// Replaces the first record with the same id. Returns `false`, without
    /// touching the file, when there is none.
    pub async fn update(&self, item: T) -> Result<bool> {
        let id = item.id();
        let mut guard = self.lock().await?;
        let records = loaded(&mut guard);
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            debug!(resource = T::RESOURCE, %id, "Update skipped, no such record");
            return Ok(false);
        };

        let mut staged = records.clone();
        staged[index] = item;
        self.write(&staged).await?;
        *records = staged;
        Ok(true)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.transaction(move |records| {
            records.retain(|r| r.id() != id);
            Ok(())
        })
        .await
    }

    pub async fn delete_all(&self) -> Result<()> {
        self.transaction(|records| {
            records.clear();
            Ok(())
        })
        .await
    }

    /// Runs `apply` against the whole collection under the store lock and
    /// persists the result once. Nothing is written if `apply` fails.
    pub async fn transaction<R, F>(&self, apply: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let mut guard = self.lock().await?;
        let records = loaded(&mut guard);
        let mut staged = records.clone();
        let output = apply(&mut staged)?;
        self.write(&staged).await?;
        *records = staged;
        Ok(output)
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Option<Vec<T>>>> {
        let mut guard = locks::acquire(&self.records, self.lock_timeout, T::RESOURCE).await?;
        if guard.is_none() {
            *guard = Some(self.read().await?);
        }
        Ok(guard)
    }

    async fn read(&self) -> Result<Vec<T>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = match serde_json::from_str(&raw)? {
            StoredCollection::Versioned {
                schema_version,
                records,
            } => {
                if schema_version > SCHEMA_VERSION {
                    return Err(BoxOfficeError::Storage(format!(
                        "{} uses schema version {} but only {} is supported",
                        self.path.display(),
                        schema_version,
                        SCHEMA_VERSION
                    )));
                }
                records
            }
            StoredCollection::Unversioned(records) => records,
        };

        debug!(resource = T::RESOURCE, count = records.len(), "Collection loaded");
        Ok(records)
    }

    /// Writes to a sibling temp file first and renames it over the target.
    async fn write(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(&Envelope {
            schema_version: SCHEMA_VERSION,
            records,
        })?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!(resource = T::RESOURCE, count = records.len(), "Collection written");
        Ok(())
    }
}

fn loaded<T>(slot: &mut Option<Vec<T>>) -> &mut Vec<T> {
    slot.get_or_insert_with(Vec::new)
}
