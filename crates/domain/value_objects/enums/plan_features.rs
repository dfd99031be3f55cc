use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanFeature {
    Analytics,
    Promotions,
}

impl Display for PlanFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let feature = match self {
            PlanFeature::Analytics => "analytics",
            PlanFeature::Promotions => "promotions",
        };
        write!(f, "{}", feature)
    }
}
