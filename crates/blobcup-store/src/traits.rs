use std::collections::BTreeMap;

use async_trait::async_trait;
use blobcup_types::BlobEntry;
use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

/// User-defined name/value pairs attached to a blob on write
/// (`uploader`, `uploadtime`, ...).
pub type BlobAttributes = BTreeMap<String, String>;

/// Key-value blob namespace partitioned into containers.
///
/// All implementations must satisfy these invariants:
/// - Writes are unconditional overwrites; last writer wins.
/// - Operations are independent and may fail individually.
/// - `exists` never fails for a missing blob; it answers `false`. Any
///   other failure is an error, never `false`, so callers cannot mistake
///   an unreachable blob for an absent one.
/// - `read_*` on a missing blob fails with [`StoreError::NotFound`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every blob in a container, ordered by key.
    async fn list(&self, container: &str) -> StoreResult<Vec<BlobEntry>>;

    /// Check whether a blob exists.
    async fn exists(&self, container: &str, key: &str) -> StoreResult<bool>;

    /// Read a blob's raw content.
    async fn read_bytes(&self, container: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Write a blob and return the key it was stored under.
    async fn write_binary(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        attributes: &BlobAttributes,
    ) -> StoreResult<String>;

    /// Dereferenceable location of a blob. Does not check existence.
    fn locator(&self, container: &str, key: &str) -> String;

    /// Read a blob as UTF-8 text.
    async fn read_text(&self, container: &str, key: &str) -> StoreResult<String> {
        let bytes = self.read_bytes(container, key).await?;
        String::from_utf8(bytes).map_err(|_| StoreError::Encoding {
            container: container.to_string(),
            key: key.to_string(),
        })
    }

    /// Write UTF-8 text as `text/plain`.
    async fn write_text(&self, container: &str, key: &str, text: &str) -> StoreResult<()> {
        self.write_binary(
            container,
            key,
            Bytes::copy_from_slice(text.as_bytes()),
            "text/plain",
            &BlobAttributes::new(),
        )
        .await?;
        Ok(())
    }

    /// Check existence first, then read. `Ok(None)` when the blob is absent.
    async fn read_text_if_exists(&self, container: &str, key: &str) -> StoreResult<Option<String>> {
        if !self.exists(container, key).await? {
            return Ok(None);
        }
        match self.read_text(container, key).await {
            Ok(text) => Ok(Some(text)),
            // Deleted between the two calls.
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
