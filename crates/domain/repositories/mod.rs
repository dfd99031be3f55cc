pub mod subscriptions;
pub mod usages;
