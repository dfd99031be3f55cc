use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::usage_counters::UsageCounter;

/// Plan-constrained business resources checked by the enforcement gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Product,
    Order,
    Tour,
    Promotion,
}

impl ResourceKind {
    pub fn counter(&self) -> UsageCounter {
        match self {
            ResourceKind::Product => UsageCounter::ProductsCount,
            ResourceKind::Order => UsageCounter::OrdersThisPeriod,
            ResourceKind::Tour => UsageCounter::ActiveToursCount,
            ResourceKind::Promotion => UsageCounter::PromotionsUsed,
        }
    }

    /// Plural noun used in user-facing limit messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Product => "products",
            ResourceKind::Order => "orders this month",
            ResourceKind::Tour => "active tours",
            ResourceKind::Promotion => "promotions",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ResourceKind::Product => "PRODUCT",
            ResourceKind::Order => "ORDER",
            ResourceKind::Tour => "TOUR",
            ResourceKind::Promotion => "PROMOTION",
        };
        write!(f, "{}", kind)
    }
}
