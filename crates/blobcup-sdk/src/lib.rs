//! High-level SDK for blobcup.
//!
//! Wires the object store, the soft identity, the vote ledger and the
//! bracket engine together per configured category. This is the entry
//! point for front ends; [`Blobcup`] is generic over the store and the
//! identity so tests and offline demos can run entirely in memory.

pub mod client;
pub mod config;
pub mod error;
pub mod worldcup;

pub use client::{BoardEntry, Blobcup, UploadReceipt, VotingBoard};
pub use config::{AppConfig, Category, CategoryKind, ACCOUNT_ENV, SAS_TOKEN_ENV};
pub use error::{SdkError, SdkResult};
pub use worldcup::WorldCup;

// Re-export key types
pub use blobcup_bracket::{Pairing, RoundName, Side, Step};
pub use blobcup_store::{AzureBlobStore, InMemoryObjectStore};
pub use blobcup_ledger::{VoteOutcome, VoteScope, VotingLedger};
pub use blobcup_types::{BlobEntry, Candidate, CandidateId, ContentKind, VoterId};
