pub mod enums;
pub mod plan_catalog;
pub mod plan_changes;
pub mod plans;
pub mod subscriptions;
pub mod trials;
pub mod usages;
