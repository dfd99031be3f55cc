use chrono::Duration;
use serde::Serialize;

use crate::domain::value_objects::{
    enums::{
        plan_features::PlanFeature, plan_tiers::PlanTier, resource_kinds::ResourceKind,
        support_levels::SupportLevel,
    },
    plans::{PlanLimit, format_plan_price},
};

/// Catalog entry. Plans are compiled in, not stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanEntity {
    pub tier: PlanTier,
    pub name: &'static str,
    pub description: &'static str,
    pub price_eur: i32,
    pub billing_period_days: i32,
    pub max_products: PlanLimit,
    pub max_orders_per_month: PlanLimit,
    pub max_active_tours: PlanLimit,
    pub has_analytics: bool,
    pub has_promotions: bool,
    pub support_level: SupportLevel,
    pub support_response_time_hours: i32,
}

impl PlanEntity {
    pub fn limit_for(&self, kind: ResourceKind) -> PlanLimit {
        match kind {
            ResourceKind::Product => self.max_products,
            ResourceKind::Order => self.max_orders_per_month,
            ResourceKind::Tour => self.max_active_tours,
            ResourceKind::Promotion if self.has_promotions => PlanLimit::Unlimited,
            ResourceKind::Promotion => PlanLimit::Limited(0),
        }
    }

    pub fn has_feature(&self, feature: PlanFeature) -> bool {
        match feature {
            PlanFeature::Analytics => self.has_analytics,
            PlanFeature::Promotions => self.has_promotions,
        }
    }

    pub fn billing_period(&self) -> Duration {
        Duration::days(i64::from(self.billing_period_days))
    }

    pub fn formatted_price(&self) -> String {
        format_plan_price(self.price_eur)
    }
}
