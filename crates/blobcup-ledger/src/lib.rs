//! Shared vote ledger for blobcup.
//!
//! This crate provides:
//! - [`VotingLedger`] -- per-scope tallies plus the voters behind them
//! - A legacy-tolerant JSON codec for the persisted `votes.json` blob
//! - [`VoteBook`] -- load / cast / persist against an [`ObjectStore`]
//! - [`VotingSession`] -- the caller-side protocol: local-ballot precheck,
//!   per-scope double-submit guard, local ballot update after a persist
//!
//! # Consistency
//!
//! A cast is a read-modify-write of one blob with an unconditional write at
//! the end. Two devices voting at nearly the same time can both read the
//! same ledger, and the later write silently discards the earlier one. The
//! store offers no conditional write, so this crate does not pretend to
//! prevent that race.
//!
//! [`ObjectStore`]: blobcup_store::ObjectStore

pub mod book;
pub mod error;
pub mod record;
pub mod session;

pub use book::{CastReceipt, VoteBook, DEFAULT_LEDGER_BLOB};
pub use error::{LedgerError, LedgerResult};
pub use record::VotingLedger;
pub use session::{BallotView, VoteOutcome, VoteScope, VotingSession};
