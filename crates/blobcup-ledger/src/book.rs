use std::sync::Arc;

use blobcup_store::ObjectStore;
use blobcup_types::{CandidateId, VoterId};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::record::VotingLedger;

/// Blob name of the ledger inside each container.
pub const DEFAULT_LEDGER_BLOB: &str = "votes.json";

/// Result of a persisted cast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastReceipt {
    /// The ledger exactly as written.
    pub ledger: VotingLedger,
    /// Candidate the voter's ballot was moved away from.
    pub previous: Option<CandidateId>,
}

/// Loads and writes per-container ledgers.
pub struct VoteBook<S: ?Sized> {
    store: Arc<S>,
    blob_name: String,
}

impl<S: ObjectStore + ?Sized> VoteBook<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_blob_name(store, DEFAULT_LEDGER_BLOB)
    }

    pub fn with_blob_name(store: Arc<S>, blob_name: impl Into<String>) -> Self {
        Self {
            store,
            blob_name: blob_name.into(),
        }
    }

    pub fn blob_name(&self) -> &str {
        &self.blob_name
    }

    /// Read the ledger, surfacing store failures.
    ///
    /// A missing blob is an empty ledger. So is a malformed one: it is logged
    /// and ignored, never fatal.
    pub async fn fetch(&self, container: &str) -> LedgerResult<VotingLedger> {
        let Some(text) = self
            .store
            .read_text_if_exists(container, &self.blob_name)
            .await?
        else {
            debug!(container, "no ledger yet");
            return Ok(VotingLedger::new());
        };
        match VotingLedger::from_json(&text) {
            Ok(ledger) => Ok(ledger),
            Err(e) => {
                warn!(container, error = %e, "ignoring malformed ledger");
                Ok(VotingLedger::new())
            }
        }
    }

    /// Read the ledger for display. Any failure degrades to an empty ledger.
    pub async fn load(&self, container: &str) -> VotingLedger {
        match self.fetch(container).await {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!(container, error = %e, "ledger unavailable, showing empty tallies");
                VotingLedger::new()
            }
        }
    }

    /// Overwrite the stored ledger with `ledger`, unconditionally.
    pub async fn persist(&self, container: &str, ledger: &VotingLedger) -> LedgerResult<()> {
        let text = ledger.to_json_pretty()?;
        self.store
            .write_text(container, &self.blob_name, &text)
            .await
            .map_err(LedgerError::from)
    }

    /// Read, move `voter`'s ballot to `candidate`, write back.
    ///
    /// Not atomic with respect to other writers: a concurrent cast that
    /// persists between this read and this write is lost. Nothing is
    /// written if the read fails.
    pub async fn cast_vote(
        &self,
        container: &str,
        candidate: &CandidateId,
        voter: &VoterId,
    ) -> LedgerResult<CastReceipt> {
        let mut ledger = self.fetch(container).await?;
        let previous = ledger.apply_vote(candidate, voter);
        self.persist(container, &ledger).await?;
        info!(
            container,
            %candidate,
            %voter,
            previous = previous.as_ref().map(CandidateId::as_str),
            "vote recorded"
        );
        Ok(CastReceipt { ledger, previous })
    }
}

impl<S: ?Sized> std::fmt::Debug for VoteBook<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteBook")
            .field("blob_name", &self.blob_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobcup_store::{FaultMode, InMemoryObjectStore};

    fn c(id: &str) -> CandidateId {
        CandidateId::new(id).unwrap()
    }

    fn v(id: &str) -> VoterId {
        VoterId::new(id).unwrap()
    }

    fn book() -> (Arc<InMemoryObjectStore>, VoteBook<InMemoryObjectStore>) {
        let store = Arc::new(InMemoryObjectStore::new());
        (store.clone(), VoteBook::new(store))
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn absent_ledger_loads_empty() {
        let (_, book) = book();
        assert!(book.load("images").await.is_empty());
        assert!(book.fetch("images").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_ledger_loads_tally_only() {
        let (store, book) = book();
        store
            .write_text("images", "votes.json", r#"{"x": 3, "y": 1}"#)
            .await
            .unwrap();
        let ledger = book.load("images").await;
        assert_eq!(ledger.tally("x"), 3);
        assert_eq!(ledger.tally("y"), 1);
        assert!(ledger.ballots("x").is_none());
        assert!(ledger.ballots("y").is_none());
    }

    #[tokio::test]
    async fn malformed_ledger_loads_empty() {
        let (store, book) = book();
        store
            .write_text("images", "votes.json", "<html>oops</html>")
            .await
            .unwrap();
        assert!(book.load("images").await.is_empty());
        assert!(book.fetch("images").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_store_loads_empty_and_cast_fails() {
        let (store, book) = book();
        store.write_text("images", "votes.json", r#"{"x": 3}"#).await.unwrap();
        store.set_fault(FaultMode::Offline);
        assert!(book.load("images").await.is_empty());

        let err = book.cast_vote("images", &c("x"), &v("fp_1")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));

        store.set_fault(FaultMode::Healthy);
        assert_eq!(book.load("images").await.tally("x"), 3);
    }

    #[tokio::test]
    async fn unreadable_existence_check_never_overwrites() {
        let (store, book) = book();
        store
            .write_text("images", "votes.json", r#"{"votes": {"a": 7}, "voters": {}}"#)
            .await
            .unwrap();
        store.set_fault(FaultMode::Throttled);

        assert!(book.fetch("images").await.is_err());
        assert!(book.load("images").await.is_empty());
        let err = book.cast_vote("images", &c("b"), &v("fp_x")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));

        store.set_fault(FaultMode::Healthy);
        let ledger = book.load("images").await;
        assert_eq!(ledger.tally("a"), 7);
        assert_eq!(ledger.tally("b"), 0);
    }

    // -----------------------------------------------------------------------
    // Casting
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cast_persists_full_ledger() {
        let (store, book) = book();
        let receipt = book.cast_vote("images", &c("a"), &v("fp_1")).await.unwrap();
        assert_eq!(receipt.previous, None);
        assert_eq!(receipt.ledger.tally("a"), 1);

        let text = store.read_text("images", "votes.json").await.unwrap();
        assert_eq!(VotingLedger::from_json(&text).unwrap(), receipt.ledger);
    }

    #[tokio::test]
    async fn cast_switch_moves_ballot() {
        let (_, book) = book();
        book.cast_vote("images", &c("a"), &v("fp_1")).await.unwrap();
        let receipt = book.cast_vote("images", &c("b"), &v("fp_1")).await.unwrap();
        assert_eq!(receipt.previous, Some(c("a")));
        assert_eq!(receipt.ledger.tally("a"), 0);
        assert_eq!(receipt.ledger.tally("b"), 1);
        assert_eq!(book.load("images").await, receipt.ledger);
    }

    #[tokio::test]
    async fn cast_upgrades_legacy_blob() {
        let (store, book) = book();
        store
            .write_text("images", "votes.json", r#"{"x": 3, "y": 1}"#)
            .await
            .unwrap();
        book.cast_vote("images", &c("x"), &v("fp_1")).await.unwrap();
        let ledger = book.load("images").await;
        assert_eq!(ledger.tally("x"), 4);
        assert_eq!(ledger.tally("y"), 1);
        assert_eq!(ledger.ballots("x").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_write_surfaces_and_keeps_old_ledger() {
        let (store, book) = book();
        book.cast_vote("images", &c("a"), &v("fp_1")).await.unwrap();
        store.set_fault(FaultMode::ReadOnly);

        let err = book.cast_vote("images", &c("b"), &v("fp_1")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));

        store.set_fault(FaultMode::Healthy);
        let ledger = book.load("images").await;
        assert_eq!(ledger.tally("a"), 1);
        assert_eq!(ledger.tally("b"), 0);
    }

    #[tokio::test]
    async fn ledgers_are_per_container() {
        let (_, book) = book();
        book.cast_vote("images", &c("a"), &v("fp_1")).await.unwrap();
        book.cast_vote("worldcup", &c("a"), &v("fp_1")).await.unwrap();
        assert_eq!(book.load("images").await.tally("a"), 1);
        assert_eq!(book.load("worldcup").await.tally("a"), 1);
    }

    #[tokio::test]
    async fn custom_blob_name() {
        let store = Arc::new(InMemoryObjectStore::new());
        let book = VoteBook::with_blob_name(store.clone(), "ballots.json");
        book.cast_vote("images", &c("a"), &v("fp_1")).await.unwrap();
        assert!(store.exists("images", "ballots.json").await.unwrap());
        assert!(!store.exists("images", "votes.json").await.unwrap());
    }

    // -----------------------------------------------------------------------
    // Known race: lost update between concurrent read-modify-write cycles.
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn interleaved_casts_lose_the_first_write() {
        let (_, book) = book();

        // Two devices read the same (empty) ledger...
        let mut first = book.fetch("images").await.unwrap();
        let mut second = book.fetch("images").await.unwrap();

        // ...each applies its own vote...
        first.apply_vote(&c("a"), &v("fp_alice"));
        second.apply_vote(&c("b"), &v("fp_bob"));

        // ...and both write unconditionally. The later write wins.
        book.persist("images", &first).await.unwrap();
        book.persist("images", &second).await.unwrap();

        let stored = book.load("images").await;
        assert_eq!(stored.tally("a"), 0, "alice's vote is silently lost");
        assert_eq!(stored.tally("b"), 1);
        assert_eq!(stored.ballot_of(&v("fp_alice")), None);
    }
}
