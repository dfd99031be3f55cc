use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::usages::UsageEntity, value_objects::enums::usage_counters::UsageCounter,
};

/// Result of a conditional ledger increment. On rejection `new_value` is the
/// unchanged current value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub accepted: bool,
    pub new_value: i32,
}

/// Usage facts a downgrade is judged against.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub products_count: i32,
    /// Reported for callers only; orders reset every period and never block a downgrade.
    pub orders_this_period: i32,
    pub active_tours_count: i32,
    pub has_analytics_usage: bool,
    pub has_promotions_usage: bool,
}

impl UsageSnapshot {
    /// Promotions count as used once any promotion ever ran, including in periods
    /// that were already rolled over.
    pub fn from_usage(usage: &UsageEntity, analytics_used: bool) -> Self {
        Self {
            products_count: usage.products_count,
            orders_this_period: usage.orders_this_period,
            active_tours_count: usage.active_tours_count,
            has_analytics_usage: analytics_used,
            has_promotions_usage: usage.promotions_ever_used || usage.promotions_used > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UsageSummary {
    pub products_count: i32,
    pub orders_this_period: i32,
    pub active_tours_count: i32,
    pub promotions_used: i32,
}

impl From<&UsageEntity> for UsageSummary {
    fn from(value: &UsageEntity) -> Self {
        Self {
            products_count: value.products_count,
            orders_this_period: value.orders_this_period,
            active_tours_count: value.active_tours_count,
            promotions_used: value.promotions_used,
        }
    }
}

/// A unit counted against the plan by the enforcement gate. Releasing it gives the
/// unit back.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UsageReservation {
    pub subscription_id: Uuid,
    pub counter: UsageCounter,
    pub new_value: i32,
}
