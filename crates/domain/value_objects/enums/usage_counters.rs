use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Columns of the usage ledger. The column names are a closed set and are the only
/// identifiers ever interpolated into ledger SQL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UsageCounter {
    ProductsCount,
    OrdersThisPeriod,
    ActiveToursCount,
    PromotionsUsed,
}

impl UsageCounter {
    pub fn column_name(&self) -> &'static str {
        match self {
            UsageCounter::ProductsCount => "products_count",
            UsageCounter::OrdersThisPeriod => "orders_this_period",
            UsageCounter::ActiveToursCount => "active_tours_count",
            UsageCounter::PromotionsUsed => "promotions_used",
        }
    }

    /// Period counters are zeroed at every billing rollover; live counters follow the
    /// resources they track.
    pub fn is_period_scoped(&self) -> bool {
        matches!(
            self,
            UsageCounter::OrdersThisPeriod | UsageCounter::PromotionsUsed
        )
    }
}

impl Display for UsageCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}
