use blobcup_types::{CandidateId, VoterId};

use crate::error::IdentityResult;

/// Source of the local voter identity and of per-scope local ballots.
///
/// Scopes are opaque strings chosen by the caller (blobcup uses category
/// ids).
pub trait IdentityProvider: Send + Sync {
    /// Stable opaque identifier for this device. Generated on first use.
    fn voter_id(&self) -> IdentityResult<VoterId>;

    /// Candidate this device last voted for in `scope`, if remembered.
    fn local_ballot(&self, scope: &str) -> IdentityResult<Option<CandidateId>>;

    /// Remember that this device's ballot in `scope` is `candidate`.
    fn set_local_ballot(&self, scope: &str, candidate: &CandidateId) -> IdentityResult<()>;
}
