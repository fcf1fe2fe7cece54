use std::fmt;

use serde::{Deserialize, Serialize};

/// Descriptive label of a round, derived from how many candidates entered
/// it. Purely presentational.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundName {
    Final,
    Semifinal,
    RoundOf(usize),
}

impl RoundName {
    pub fn for_size(round_size: usize) -> Self {
        match round_size {
            2 => Self::Final,
            4 => Self::Semifinal,
            n => Self::RoundOf(n),
        }
    }
}

impl fmt::Display for RoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Final => f.write_str("final"),
            Self::Semifinal => f.write_str("semifinal"),
            Self::RoundOf(n) => write!(f, "{n}-round"),
        }
    }
}
