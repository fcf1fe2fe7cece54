use blobcup_bracket::{Bracket, BracketResult, Pairing, Side, Step};
use blobcup_types::Candidate;

use crate::config::Category;

/// An image world cup: a bracket over one category's image candidates.
///
/// Nothing about a world cup is persisted. Dropping it loses all progress.
#[derive(Clone, Debug)]
pub struct WorldCup {
    category: Category,
    bracket: Bracket<Candidate>,
}

impl WorldCup {
    pub fn new(category: Category, candidates: Vec<Candidate>) -> Self {
        let bracket = Bracket::start(category.id.clone(), candidates);
        Self { category, bracket }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn bracket(&self) -> &Bracket<Candidate> {
        &self.bracket
    }

    pub fn entrants(&self) -> usize {
        self.bracket.all_candidates().len()
    }

    pub fn next_match(&mut self) -> Step<Candidate> {
        self.bracket.next_match()
    }

    /// Pick one side of the pending pairing.
    pub fn pick(&mut self, side: Side) -> BracketResult<()> {
        self.bracket.decide_side(side)
    }

    pub fn pick_candidate(&mut self, winner: &Candidate) -> BracketResult<()> {
        self.bracket.decide(winner)
    }

    pub fn restart(&mut self) {
        self.bracket.restart();
    }

    pub fn champion(&self) -> Option<&Candidate> {
        self.bracket.winner()
    }

    pub fn play(&mut self, pick: impl FnMut(&Pairing<Candidate>) -> Side) -> Option<Candidate> {
        self.bracket.play(pick)
    }
}
