//! Single-elimination bracket engine.
//!
//! A [`Bracket`] takes an ordered candidate list and drives it through
//! successive rounds of pairwise decisions to a single winner. Candidates
//! are paired in order (`0 v 1`, `2 v 3`, ...); in an odd-sized round the
//! trailing candidate advances without a match. The engine never decides a
//! match itself: [`Bracket::next_match`] suspends on every real pairing
//! until [`Bracket::decide`] is called.
//!
//! Brackets are ephemeral. Nothing here is persisted; restarting replays
//! the candidate list captured at start.

pub mod engine;
pub mod error;
pub mod round;

pub use engine::{Bracket, Pairing, Phase, Side, Step};
pub use error::{BracketError, BracketResult};
pub use round::RoundName;
