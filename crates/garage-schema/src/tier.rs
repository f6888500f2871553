use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Physical spot category. Ordered by size: `Small < Medium < Large`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Small,
    Medium,
    Large,
}

/// A vehicle's size uses the same scale as spot tiers: a vehicle of size `S`
/// fits any spot of tier `>= S`.
pub type VehicleSize = Tier;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized size '{0}', expected small, medium or large")]
pub struct ParseTierError(pub String);

impl Tier {
    /// All tiers in ascending size order.
    pub const ALL: [Tier; 3] = [Tier::Small, Tier::Medium, Tier::Large];

    /// Dense index for per-tier arrays.
    pub fn index(self) -> usize {
        match self {
            Tier::Small => 0,
            Tier::Medium => 1,
            Tier::Large => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }

    /// The tier itself followed by every larger tier, ascending.
    pub fn and_larger(self) -> impl Iterator<Item = Tier> {
        Tier::ALL.into_iter().filter(move |t| *t >= self)
    }

    /// Whether a vehicle of this size may occupy a spot of tier `spot`.
    pub fn fits_in(self, spot: Tier) -> bool {
        spot >= self
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Tier::Small),
            "medium" => Ok(Tier::Medium),
            "large" => Ok(Tier::Large),
            _ => Err(ParseTierError(s.to_owned())),
        }
    }
}
