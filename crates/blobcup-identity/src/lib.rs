//! Soft identity for blobcup voters.
//!
//! A voter is recognised by a fingerprint of coarse environment traits,
//! generated once, persisted locally and never rotated. It is a heuristic,
//! not a credential: collisions between people are possible and accepted.
//!
//! The same local profile also remembers, per voting scope, which candidate
//! this device last voted for, so a front end can render "already voted"
//! without re-reading the shared ledger.

pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod profile;
pub mod traits;

pub use error::{IdentityError, IdentityResult};
pub use fingerprint::{EnvironmentTraits, Fingerprint};
pub use memory::InMemoryIdentity;
pub use profile::{FileIdentityStore, LocalProfile};
pub use traits::IdentityProvider;
