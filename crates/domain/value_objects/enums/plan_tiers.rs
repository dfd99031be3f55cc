use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Paid plan levels, declared in ascending price order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    Essential,
    Growth,
    Professional,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [
        PlanTier::Essential,
        PlanTier::Growth,
        PlanTier::Professional,
    ];
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tier = match self {
            PlanTier::Essential => "ESSENTIAL",
            PlanTier::Growth => "GROWTH",
            PlanTier::Professional => "PROFESSIONAL",
        };
        write!(f, "{}", tier)
    }
}

impl FromStr for PlanTier {
    type Err = UnknownTierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ESSENTIAL" => Ok(PlanTier::Essential),
            "GROWTH" => Ok(PlanTier::Growth),
            "PROFESSIONAL" => Ok(PlanTier::Professional),
            _ => Err(UnknownTierError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pricing tier: {0}")]
pub struct UnknownTierError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("growth".parse::<PlanTier>(), Ok(PlanTier::Growth));
        assert_eq!(" PROFESSIONAL ".parse::<PlanTier>(), Ok(PlanTier::Professional));
    }

    #[test]
    fn rejects_visitor_and_garbage() {
        assert_eq!(
            "VISITOR".parse::<PlanTier>(),
            Err(UnknownTierError("VISITOR".to_string()))
        );
        assert!("".parse::<PlanTier>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for tier in PlanTier::ALL {
            assert_eq!(tier.to_string().parse::<PlanTier>(), Ok(tier));
        }
    }
}
