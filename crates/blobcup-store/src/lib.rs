//! Container-partitioned blob storage for blobcup.
//!
//! Every piece of persisted blobcup state -- uploaded files, vote ledgers,
//! uploader attribution -- lives as a plain blob in a container of a
//! key-value object store. This crate is the client side of that store.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and offline use
//! - [`AzureBlobStore`] -- Azure Blob REST endpoints authorised by a SAS token
//!
//! # Design Rules
//!
//! 1. Every write unconditionally overwrites. There is no compare-and-swap.
//! 2. Operations are independent; nothing here holds a lock across calls.
//! 3. The store never interprets blob contents.
//! 4. Backends report failures as [`StoreError`]. Degrading to an empty or
//!    neutral value is the caller's decision, not the backend's.

pub mod azure;
pub mod config;
pub mod error;
pub mod listing;
pub mod memory;
pub mod traits;

pub use azure::AzureBlobStore;
pub use config::{RetryPolicy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::{FaultMode, InMemoryObjectStore};
pub use traits::{BlobAttributes, ObjectStore};
