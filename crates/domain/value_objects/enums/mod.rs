pub mod change_directions;
pub mod plan_features;
pub mod plan_tiers;
pub mod resource_kinds;
pub mod subscription_statuses;
pub mod support_levels;
pub mod usage_counters;
