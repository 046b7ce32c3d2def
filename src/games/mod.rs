//! Concrete player/memory configurations.
//!
//! Three configurations are supported, selected by the length of the
//! strategy bit-string:
//!
//! | bits | players | memory | states | module |
//! |------|---------|--------|--------|--------|
//! | 16   | 2       | 2      | 16     | [`n2m2`] |
//! | 40   | 3       | 2      | 64 (40 reduced) | [`n3m2`] |
//! | 512  | 3       | 3      | 512    | [`n3m3`] |
//!
//! Each module owns its state codec (bit-string and integer id forms), its
//! strategy table, the transition-graph builders, and the analysis entry
//! points `is_defensible` / `is_efficient` / `is_distinguishable` /
//! `minimize_dfa`.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod n2m2;
pub mod n3m2;
pub mod n3m3;

/// One player's action in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Cooperate, written `c`, bit value 0.
    C,
    /// Defect, written `d`, bit value 1.
    D,
}

impl Action {
    /// The opposite action.
    pub fn flipped(self) -> Action {
        match self {
            Action::C => Action::D,
            Action::D => Action::C,
        }
    }

    /// Bit value used by the state codecs: cooperate 0, defect 1.
    pub fn bit(self) -> usize {
        match self {
            Action::C => 0,
            Action::D => 1,
        }
    }

    /// Inverse of [`bit`](Action::bit) for the low bit of `b`.
    pub fn from_bit(b: usize) -> Action {
        if b & 1 == 1 {
            Action::D
        } else {
            Action::C
        }
    }

    /// Parse a single `c`/`d` character; `position` only feeds the error.
    pub(crate) fn from_char(ch: char, position: usize) -> Result<Action, StrategyError> {
        match ch {
            'c' => Ok(Action::C),
            'd' => Ok(Action::D),
            _ => Err(StrategyError::BadSymbol { position, found: ch }),
        }
    }
}

impl TryFrom<char> for Action {
    type Error = StrategyError;

    fn try_from(ch: char) -> Result<Action, StrategyError> {
        Action::from_char(ch, 0)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::C => write!(f, "c"),
            Action::D => write!(f, "d"),
        }
    }
}

/// A seat at the table. Player A is always the focal player; B and C are
/// the co-players (C exists only in 3-player configurations).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The focal player.
    A,
    /// First co-player.
    B,
    /// Second co-player.
    C,
}

/// A co-player seat, for queries that are meaningless for the focal
/// player (relative payoffs, per-role defensibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coplayer {
    /// First co-player.
    B,
    /// Second co-player.
    C,
}

/// Errors raised by state codecs and strategy lookups.
///
/// Every variant is a precondition violation on fully-specified input;
/// there is no retry or partial result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// A bit-string had the wrong length for its context.
    BitLength {
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
    /// A bit-string contained a character outside `{c, d}`.
    BadSymbol {
        /// Byte offset of the offending character.
        position: usize,
        /// The character found there.
        found: char,
    },
    /// A state id outside `[0, 2^(players×memory))`.
    StateOutOfRange {
        /// The id supplied.
        id: usize,
        /// Number of states in this configuration.
        num_states: usize,
    },
    /// A strategy lookup with a key outside the strategy's domain.
    KeyOutsideDomain(String),
    /// A recovery analysis was requested for a strategy that defects at
    /// full cooperation, so full cooperation is not even a fixed point.
    UnstableCooperation,
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::BitLength { expected, found } => {
                write!(f, "bit-string length {} does not match {}", found, expected)
            }
            StrategyError::BadSymbol { position, found } => {
                write!(f, "invalid symbol {:?} at position {}", found, position)
            }
            StrategyError::StateOutOfRange { id, num_states } => {
                write!(f, "state id {} outside [0, {})", id, num_states)
            }
            StrategyError::KeyOutsideDomain(key) => {
                write!(f, "state key {} outside the strategy's domain", key)
            }
            StrategyError::UnstableCooperation => {
                write!(f, "full cooperation is not a fixed point of the strategy")
            }
        }
    }
}

impl std::error::Error for StrategyError {}

/// Parse a `[cd]{expected}` bit-string into actions.
pub(crate) fn parse_actions(s: &str, expected: usize) -> Result<Vec<Action>, StrategyError> {
    if s.chars().count() != expected {
        return Err(StrategyError::BitLength {
            expected,
            found: s.chars().count(),
        });
    }
    s.chars()
        .enumerate()
        .map(|(i, ch)| Action::from_char(ch, i))
        .collect()
}
