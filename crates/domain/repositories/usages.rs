use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::usages::UsageEntity;
use crate::domain::value_objects::{
    enums::usage_counters::UsageCounter, plans::PlanLimit, usages::IncrementOutcome,
};

#[async_trait]
#[automock]
pub trait UsageRepository {
    async fn get_usage(&self, subscription_id: Uuid) -> Result<Option<UsageEntity>>;

    /// One atomic conditional update: concurrent callers can never both pass the limit.
    async fn increment_if_under_limit(
        &self,
        subscription_id: Uuid,
        counter: UsageCounter,
        limit: PlanLimit,
    ) -> Result<IncrementOutcome>;

    /// Saturates at zero. Returns the new value.
    async fn decrement(&self, subscription_id: Uuid, counter: UsageCounter) -> Result<i32>;

    async fn reset_period_counters(&self, subscription_id: Uuid, now: DateTime<Utc>)
    -> Result<()>;
}
