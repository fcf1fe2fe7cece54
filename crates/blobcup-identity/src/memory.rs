use std::collections::BTreeMap;
use std::sync::RwLock;

use blobcup_types::{CandidateId, VoterId};

use crate::error::IdentityResult;
use crate::traits::IdentityProvider;

/// Identity provider that forgets everything on drop. For tests and
/// embedding.
pub struct InMemoryIdentity {
    voter: VoterId,
    ballots: RwLock<BTreeMap<String, CandidateId>>,
}

impl InMemoryIdentity {
    pub fn new(voter: VoterId) -> Self {
        Self {
            voter,
            ballots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Forget all local ballots, as if the user cleared their browser data
    /// but kept the same device.
    pub fn clear_ballots(&self) {
        self.ballots.write().expect("lock poisoned").clear();
    }
}

impl IdentityProvider for InMemoryIdentity {
    fn voter_id(&self) -> IdentityResult<VoterId> {
        Ok(self.voter.clone())
    }

    fn local_ballot(&self, scope: &str) -> IdentityResult<Option<CandidateId>> {
        Ok(self.ballots.read().expect("lock poisoned").get(scope).cloned())
    }

    fn set_local_ballot(&self, scope: &str, candidate: &CandidateId) -> IdentityResult<()> {
        self.ballots
            .write()
            .expect("lock poisoned")
            .insert(scope.to_string(), candidate.clone());
        Ok(())
    }
}
