use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use blobcup_types::BlobEntry;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobAttributes, ObjectStore};

/// Failure injection for the in-memory store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultMode {
    /// Everything works.
    #[default]
    Healthy,
    /// Reads work, writes fail with [`StoreError::ReadOnly`].
    ReadOnly,
    /// Every operation fails with [`StoreError::Unavailable`].
    Offline,
    /// Existence checks fail with a 503 status while reads and writes
    /// still work, like a remote throttling `HEAD` requests.
    Throttled,
}

#[derive(Clone, Debug)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
    attributes: BlobAttributes,
    last_modified: DateTime<Utc>,
}

/// In-memory, HashMap-based object store.
///
/// Intended for tests and offline use. Containers spring into existence on
/// first write. All state sits behind a `RwLock`; blobs are cloned on read.
pub struct InMemoryObjectStore {
    containers: RwLock<HashMap<String, BTreeMap<String, StoredBlob>>>,
    fault: RwLock<FaultMode>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            fault: RwLock::new(FaultMode::Healthy),
        }
    }

    pub fn set_fault(&self, mode: FaultMode) {
        *self.fault.write().expect("lock poisoned") = mode;
    }

    pub fn fault(&self) -> FaultMode {
        *self.fault.read().expect("lock poisoned")
    }

    /// Number of blobs across all containers.
    pub fn len(&self) -> usize {
        self.containers
            .read()
            .expect("lock poisoned")
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attributes attached to a blob on write, if the blob exists.
    pub fn attributes(&self, container: &str, key: &str) -> Option<BlobAttributes> {
        let map = self.containers.read().expect("lock poisoned");
        map.get(container)
            .and_then(|c| c.get(key))
            .map(|b| b.attributes.clone())
    }

    /// Remove a blob directly, bypassing fault injection. Returns `true` if
    /// it existed.
    pub fn remove(&self, container: &str, key: &str) -> bool {
        let mut map = self.containers.write().expect("lock poisoned");
        map.get_mut(container)
            .map(|c| c.remove(key).is_some())
            .unwrap_or(false)
    }

    fn check_read(&self) -> StoreResult<()> {
        match self.fault() {
            FaultMode::Offline => Err(StoreError::Unavailable),
            _ => Ok(()),
        }
    }

    fn check_write(&self) -> StoreResult<()> {
        match self.fault() {
            FaultMode::Healthy | FaultMode::Throttled => Ok(()),
            FaultMode::ReadOnly => Err(StoreError::ReadOnly),
            FaultMode::Offline => Err(StoreError::Unavailable),
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, container: &str) -> StoreResult<Vec<BlobEntry>> {
        self.check_read()?;
        let map = self.containers.read().expect("lock poisoned");
        let Some(blobs) = map.get(container) else {
            return Ok(Vec::new());
        };
        Ok(blobs
            .iter()
            .map(|(key, blob)| BlobEntry {
                name: key.clone(),
                size: blob.data.len() as u64,
                content_type: blob.content_type.clone(),
                last_modified: Some(blob.last_modified),
                locator: self.locator(container, key),
            })
            .collect())
    }

    async fn exists(&self, container: &str, key: &str) -> StoreResult<bool> {
        match self.fault() {
            FaultMode::Offline => return Err(StoreError::Unavailable),
            FaultMode::Throttled => {
                return Err(StoreError::Status {
                    operation: "exists",
                    status: 503,
                    target: format!("{container}/{key}"),
                })
            }
            FaultMode::Healthy | FaultMode::ReadOnly => {}
        }
        let map = self.containers.read().expect("lock poisoned");
        Ok(map.get(container).is_some_and(|c| c.contains_key(key)))
    }

    async fn read_bytes(&self, container: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.check_read()?;
        let map = self.containers.read().expect("lock poisoned");
        map.get(container)
            .and_then(|c| c.get(key))
            .map(|b| b.data.to_vec())
            .ok_or_else(|| StoreError::not_found(container, key))
    }

    async fn write_binary(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        attributes: &BlobAttributes,
    ) -> StoreResult<String> {
        self.check_write()?;
        let mut map = self.containers.write().expect("lock poisoned");
        map.entry(container.to_string()).or_default().insert(
            key.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                attributes: attributes.clone(),
                last_modified: Utc::now(),
            },
        );
        Ok(key.to_string())
    }

    fn locator(&self, container: &str, key: &str) -> String {
        format!("memory://{container}/{key}")
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("blob_count", &self.len())
            .field("fault", &self.fault())
            .finish()
    }
}
