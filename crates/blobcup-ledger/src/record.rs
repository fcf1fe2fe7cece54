use std::collections::{BTreeMap, BTreeSet};

use blobcup_types::{CandidateId, VoterId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

/// Vote tallies of one scope together with the voters behind them.
///
/// For a ledger built only through [`VotingLedger::apply_vote`],
/// `tally(c) == ballots(c).len()` for every candidate and a voter sits in at
/// most one ballot set. Ledgers decoded from the legacy tally-only form carry
/// counts with no known voters; those counts are preserved and never
/// reconciled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VotingLedger {
    tally: BTreeMap<CandidateId, u64>,
    ballots: BTreeMap<CandidateId, BTreeSet<VoterId>>,
}

/// Persisted form: `{ "votes": {id: n}, "voters": {id: [voter, ...]} }`.
#[derive(Serialize, Deserialize)]
struct LedgerRecord {
    #[serde(default)]
    votes: BTreeMap<CandidateId, u64>,
    #[serde(default)]
    voters: Option<BTreeMap<CandidateId, BTreeSet<VoterId>>>,
}

impl VotingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a persisted ledger.
    ///
    /// An object without a `voters` key is the legacy form: the whole object
    /// is the tally map and no voters are known.
    pub fn from_json(text: &str) -> LedgerResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| LedgerError::Malformed(e.to_string()))?;
        let Value::Object(map) = &value else {
            return Err(LedgerError::Malformed("ledger is not a JSON object".into()));
        };

        if !map.contains_key("voters") {
            let tally: BTreeMap<CandidateId, u64> = serde_json::from_value(value)
                .map_err(|e| LedgerError::Malformed(format!("legacy tally: {e}")))?;
            debug!(candidates = tally.len(), "decoded legacy tally-only ledger");
            return Ok(Self {
                tally,
                ballots: BTreeMap::new(),
            });
        }

        let record: LedgerRecord =
            serde_json::from_value(value).map_err(|e| LedgerError::Malformed(e.to_string()))?;
        Ok(Self {
            tally: record.votes,
            ballots: record.voters.unwrap_or_default(),
        })
    }

    /// Encode in the current form, pretty-printed with two-space indentation.
    pub fn to_json_pretty(&self) -> LedgerResult<String> {
        let record = LedgerRecord {
            votes: self.tally.clone(),
            voters: Some(self.ballots.clone()),
        };
        serde_json::to_string_pretty(&record).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Vote count of a candidate; zero when unknown.
    pub fn tally(&self, candidate: &str) -> u64 {
        self.tally.get(candidate).copied().unwrap_or(0)
    }

    /// Voters currently counted for a candidate.
    pub fn ballots(&self, candidate: &str) -> Option<&BTreeSet<VoterId>> {
        self.ballots.get(candidate)
    }

    /// The candidate `voter` currently holds a ballot for, if any.
    pub fn ballot_of(&self, voter: &VoterId) -> Option<&CandidateId> {
        self.ballots
            .iter()
            .find(|(_, voters)| voters.contains(voter))
            .map(|(candidate, _)| candidate)
    }

    pub fn tallies(&self) -> impl Iterator<Item = (&CandidateId, u64)> {
        self.tally.iter().map(|(c, n)| (c, *n))
    }

    pub fn total_votes(&self) -> u64 {
        self.tally.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tally.is_empty() && self.ballots.is_empty()
    }

    /// Move `voter`'s single ballot to `candidate`.
    ///
    /// The first ballot set holding `voter` loses it and that candidate's
    /// count drops by one, floored at zero. Then `voter` joins `candidate`'s
    /// set and its count rises by one. Returns the candidate the ballot was
    /// taken from.
    ///
    /// Re-casting for the candidate already held leaves the ledger as it
    /// was; callers are expected to skip that case before persisting.
    pub fn apply_vote(&mut self, candidate: &CandidateId, voter: &VoterId) -> Option<CandidateId> {
        let previous = self.ballot_of(voter).cloned();
        if let Some(prev) = &previous {
            if let Some(voters) = self.ballots.get_mut(prev) {
                voters.remove(voter);
            }
            if let Some(count) = self.tally.get_mut(prev) {
                *count = count.saturating_sub(1);
            }
        }

        *self.tally.entry(candidate.clone()).or_insert(0) += 1;
        self.ballots
            .entry(candidate.clone())
            .or_default()
            .insert(voter.clone());
        previous
    }
}
