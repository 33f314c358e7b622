//! Registration positions
//!
//! Provides [`Position`], the primary key of the entry total order.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Explicit rank of an entry within its resource
///
/// Ranked entries sort by value ascending; every ranked entry sorts before
/// every [`Position::Unranked`] entry. The derived `Ord` relies on variant
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Explicit rank
    Ranked(i32),

    /// No rank: placed after all ranked entries
    #[default]
    Unranked,
}

impl Position {
    /// Build a position from an optional rank
    #[inline]
    #[must_use]
    pub fn from_rank(rank: Option<i32>) -> Self {
        rank.map_or(Self::Unranked, Self::Ranked)
    }

    /// Rank value, if any
    #[inline]
    #[must_use]
    pub fn rank(&self) -> Option<i32> {
        match self {
            Self::Ranked(r) => Some(*r),
            Self::Unranked => None,
        }
    }

    /// Check if this position is ranked
    #[inline]
    #[must_use]
    pub fn is_ranked(&self) -> bool {
        matches!(self, Self::Ranked(_))
    }
}

impl From<i32> for Position {
    fn from(rank: i32) -> Self {
        Self::Ranked(rank)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranked(r) => write!(f, "{r}"),
            Self::Unranked => f.write_str("unranked"),
        }
    }
}
