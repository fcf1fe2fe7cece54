use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use blobcup_identity::IdentityProvider;
use blobcup_store::ObjectStore;
use blobcup_types::{CandidateId, VoterId};
use tracing::{debug, warn};

use crate::book::VoteBook;
use crate::error::LedgerResult;
use crate::record::VotingLedger;

/// Where a vote goes: the local-ballot key and the container whose ledger
/// holds the tallies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoteScope {
    pub key: String,
    pub container: String,
}

impl VoteScope {
    pub fn new(key: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            container: container.into(),
        }
    }
}

/// What happened to a vote request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The ledger was rewritten with this device's ballot on the candidate.
    Recorded {
        ledger: VotingLedger,
        previous: Option<CandidateId>,
    },
    /// This device's ballot is already on the candidate; nothing was written.
    Unchanged,
    /// Another vote from this session is still being persisted for the
    /// scope; the request was dropped.
    Busy,
}

/// The ledger as seen by this device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallotView {
    pub voter: VoterId,
    pub ledger: VotingLedger,
    /// The candidate this device's ballot is on, per the shared ledger.
    pub my_vote: Option<CandidateId>,
}

/// One front-end session voting on behalf of the local identity.
///
/// Guards a single session against double submission: while a vote for a
/// scope is in flight, further requests for that scope return
/// [`VoteOutcome::Busy`]. Separate sessions and separate devices are not
/// coordinated at all.
pub struct VotingSession<S: ?Sized, I: ?Sized> {
    book: VoteBook<S>,
    identity: Arc<I>,
    in_flight: Mutex<HashSet<String>>,
}

struct InFlight<'a> {
    scopes: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlight<'a> {
    fn acquire(scopes: &'a Mutex<HashSet<String>>, key: &str) -> Option<Self> {
        let mut set = scopes.lock().expect("lock poisoned");
        if !set.insert(key.to_string()) {
            return None;
        }
        Some(Self {
            scopes,
            key: key.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.scopes.lock() {
            set.remove(&self.key);
        }
    }
}

impl<S, I> VotingSession<S, I>
where
    S: ObjectStore + ?Sized,
    I: IdentityProvider + ?Sized,
{
    pub fn new(book: VoteBook<S>, identity: Arc<I>) -> Self {
        Self {
            book,
            identity,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn book(&self) -> &VoteBook<S> {
        &self.book
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Whether a vote for `scope` is currently being persisted.
    pub fn is_voting(&self, scope: &VoteScope) -> bool {
        self.in_flight
            .lock()
            .expect("lock poisoned")
            .contains(&scope.key)
    }

    /// Load the ledger and locate this device's ballot in it.
    ///
    /// When the shared ledger shows a ballot, the local ballot is refreshed
    /// from it, so a device that lost its local profile still renders its
    /// vote. Ledger failures degrade to an empty ledger.
    pub async fn view(&self, scope: &VoteScope) -> LedgerResult<BallotView> {
        let voter = self.identity.voter_id()?;
        let ledger = self.book.load(&scope.container).await;
        let my_vote = ledger.ballot_of(&voter).cloned();
        if let Some(candidate) = &my_vote {
            if let Err(e) = self.identity.set_local_ballot(&scope.key, candidate) {
                warn!(scope = %scope.key, error = %e, "could not refresh local ballot");
            }
        }
        Ok(BallotView {
            voter,
            ledger,
            my_vote,
        })
    }

    /// Put this device's ballot on `candidate`.
    ///
    /// The local ballot is updated only after the ledger write succeeded; a
    /// failed write leaves it untouched so the request can be retried.
    pub async fn vote(
        &self,
        scope: &VoteScope,
        candidate: &CandidateId,
    ) -> LedgerResult<VoteOutcome> {
        let Some(_guard) = InFlight::acquire(&self.in_flight, &scope.key) else {
            debug!(scope = %scope.key, "vote already in flight, ignoring");
            return Ok(VoteOutcome::Busy);
        };

        let voter = self.identity.voter_id()?;
        if self.identity.local_ballot(&scope.key)?.as_ref() == Some(candidate) {
            debug!(scope = %scope.key, %candidate, "ballot already on candidate");
            return Ok(VoteOutcome::Unchanged);
        }

        let receipt = self
            .book
            .cast_vote(&scope.container, candidate, &voter)
            .await?;

        if let Err(e) = self.identity.set_local_ballot(&scope.key, candidate) {
            warn!(scope = %scope.key, error = %e, "vote stored but local ballot not saved");
        }

        Ok(VoteOutcome::Recorded {
            ledger: receipt.ledger,
            previous: receipt.previous,
        })
    }
}
