//! Foundation types for blobcup.
//!
//! Every other blobcup crate depends on `blobcup-types`. Nothing here talks
//! to a store; these are the plain values that flow between the store
//! client, the voting ledger and the bracket engine.
//!
//! # Key Types
//!
//! - [`CandidateId`] -- Opaque key of an uploaded item inside a container
//! - [`Candidate`] -- A votable / bracketable item with its locator and uploader
//! - [`VoterId`] -- Soft, unverified per-device identity
//! - [`BlobEntry`] -- One row of a container listing
//! - [`ContentKind`] -- Coarse classification of a MIME type
//! - [`AttributionIndex`] -- Uploader attribution per container

pub mod attribution;
pub mod blob;
pub mod candidate;
pub mod error;
pub mod voter;

pub use attribution::{AttributionIndex, UploaderRecord};
pub use blob::{format_file_size, BlobEntry, ContentKind};
pub use candidate::{Candidate, CandidateId};
pub use error::TypeError;
pub use voter::VoterId;
