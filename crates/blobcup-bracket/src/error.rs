use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BracketError {
    #[error("no match is waiting for a decision")]
    NoPendingMatch,

    #[error("winner is not part of the current pairing")]
    NotInPairing,
}

pub type BracketResult<T> = Result<T, BracketError>;
