use tracing::debug;

use crate::error::{BracketError, BracketResult};
use crate::round::RoundName;

/// Which of the two paired candidates wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A match waiting for a decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pairing<C> {
    pub left: C,
    pub right: C,
    pub round: RoundName,
    /// 1-based round counter.
    pub round_number: u32,
    /// Index of `left` inside the current round.
    pub position: usize,
}

/// Where the state machine stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase<C> {
    /// Fewer than two candidates; terminal.
    Empty,
    /// The current round still has unplayed pairings.
    InRound,
    /// Every pairing of the current round is decided.
    RoundComplete,
    /// One candidate is left.
    Finished(C),
}

/// What the caller should do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step<C> {
    /// Not enough candidates to hold a bracket.
    Insufficient,
    /// Present this pairing and call [`Bracket::decide`].
    Match(Pairing<C>),
    /// The bracket is over.
    Champion(C),
}

/// Single-elimination bracket over an ordered candidate list.
#[derive(Clone, Debug)]
pub struct Bracket<C> {
    scope: String,
    all_candidates: Vec<C>,
    current_round: Vec<C>,
    next_round: Vec<C>,
    match_cursor: usize,
    round_number: u32,
    phase: Phase<C>,
}

impl<C: Clone + PartialEq> Bracket<C> {
    /// Snapshot `candidates` (order preserved) and open the first round.
    pub fn start(scope: impl Into<String>, candidates: Vec<C>) -> Self {
        let scope = scope.into();
        let (phase, current_round, round_number) = if candidates.len() < 2 {
            (Phase::Empty, Vec::new(), 0)
        } else {
            (Phase::InRound, candidates.clone(), 1)
        };
        debug!(scope = %scope, candidates = candidates.len(), "bracket started");
        Self {
            scope,
            all_candidates: candidates,
            current_round,
            next_round: Vec::new(),
            match_cursor: 0,
            round_number,
            phase,
        }
    }

    /// Throw away all progress and start again from the original snapshot.
    pub fn restart(&mut self) {
        *self = Self::start(self.scope.clone(), self.all_candidates.clone());
    }

    /// Advance through byes and round changes up to the next point that
    /// needs the caller: a pairing, the champion, or "insufficient".
    ///
    /// Calling it again without a decision returns the same pairing.
    pub fn next_match(&mut self) -> Step<C> {
        loop {
            match &self.phase {
                Phase::Empty => return Step::Insufficient,
                Phase::Finished(winner) => return Step::Champion(winner.clone()),
                Phase::RoundComplete => self.close_round(),
                Phase::InRound => {
                    if self.match_cursor >= self.current_round.len() {
                        self.phase = Phase::RoundComplete;
                        continue;
                    }
                    let left = &self.current_round[self.match_cursor];
                    match self.current_round.get(self.match_cursor + 1) {
                        Some(right) => {
                            return Step::Match(Pairing {
                                left: left.clone(),
                                right: right.clone(),
                                round: RoundName::for_size(self.current_round.len()),
                                round_number: self.round_number,
                                position: self.match_cursor,
                            })
                        }
                        None => {
                            // Odd round: the trailing candidate advances unopposed.
                            let bye = left.clone();
                            debug!(round = self.round_number, position = self.match_cursor, "bye");
                            self.next_round.push(bye);
                            self.match_cursor += 2;
                        }
                    }
                }
            }
        }
    }

    /// Record the winner of the pending pairing.
    pub fn decide(&mut self, winner: &C) -> BracketResult<()> {
        let (left, right) = self.current_pairing().ok_or(BracketError::NoPendingMatch)?;
        let side = if winner == left {
            Side::Left
        } else if winner == right {
            Side::Right
        } else {
            return Err(BracketError::NotInPairing);
        };
        self.decide_side(side)
    }

    /// Record the winner of the pending pairing by position.
    pub fn decide_side(&mut self, side: Side) -> BracketResult<()> {
        let (left, right) = self.current_pairing().ok_or(BracketError::NoPendingMatch)?;
        let winner = match side {
            Side::Left => left.clone(),
            Side::Right => right.clone(),
        };
        self.next_round.push(winner);
        self.match_cursor += 2;
        Ok(())
    }

    /// Decide every pairing with `pick` until the bracket ends.
    /// Returns the champion, or `None` for an insufficient bracket.
    pub fn play(&mut self, mut pick: impl FnMut(&Pairing<C>) -> Side) -> Option<C> {
        loop {
            match self.next_match() {
                Step::Insufficient => return None,
                Step::Champion(winner) => return Some(winner),
                Step::Match(pairing) => {
                    let side = pick(&pairing);
                    // A pairing was just returned, so a decision is pending.
                    if self.decide_side(side).is_err() {
                        return None;
                    }
                }
            }
        }
    }

    /// The two candidates of the undecided pairing at the cursor, if any.
    pub fn current_pairing(&self) -> Option<(&C, &C)> {
        if self.phase != Phase::InRound {
            return None;
        }
        let left = self.current_round.get(self.match_cursor)?;
        let right = self.current_round.get(self.match_cursor + 1)?;
        Some((left, right))
    }

    fn close_round(&mut self) {
        if self.next_round.len() == 1 {
            let winner = self.next_round[0].clone();
            debug!(scope = %self.scope, rounds = self.round_number, "bracket finished");
            self.phase = Phase::Finished(winner);
            return;
        }
        self.current_round = std::mem::take(&mut self.next_round);
        self.match_cursor = 0;
        self.round_number += 1;
        self.phase = Phase::InRound;
        debug!(round = self.round_number, size = self.current_round.len(), "round opened");
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn all_candidates(&self) -> &[C] {
        &self.all_candidates
    }

    pub fn current_round(&self) -> &[C] {
        &self.current_round
    }

    pub fn next_round(&self) -> &[C] {
        &self.next_round
    }

    pub fn match_cursor(&self) -> usize {
        self.match_cursor
    }

    /// 1-based number of the round in progress (or the last one played).
    /// Zero for an empty bracket.
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn round_name(&self) -> RoundName {
        RoundName::for_size(self.current_round.len())
    }

    pub fn phase(&self) -> &Phase<C> {
        &self.phase
    }

    pub fn winner(&self) -> Option<&C> {
        match &self.phase {
            Phase::Finished(winner) => Some(winner),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }
}
