use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};
use crate::domain::value_objects::enums::{
    plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus,
};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// Inserts the subscription together with its zeroed usage row. Returns `None` when the
    /// business already has a subscription.
    async fn create_with_usage(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn find_by_business_id(&self, business_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Sets the plan and the billing window; the next billing date follows the period end.
    async fn update_plan(
        &self,
        subscription_id: Uuid,
        plan_tier: PlanTier,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    /// Any status other than TRIAL also clears the trial flag.
    async fn update_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<SubscriptionEntity>;

    async fn activate(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<SubscriptionEntity>;

    async fn set_payment_reference(
        &self,
        subscription_id: Uuid,
        payment_reference: String,
    ) -> Result<SubscriptionEntity>;

    async fn list_trials_due_for_conversion(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>>;

    async fn list_periods_due_for_rollover(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>>;

    /// Moves the billing window forward and zeroes the period counters in one unit.
    /// Returns `false` without writing when the stored period end no longer equals
    /// `expected_period_end`.
    async fn advance_period_and_reset_usage(
        &self,
        subscription_id: Uuid,
        expected_period_end: DateTime<Utc>,
        new_period_start: DateTime<Utc>,
        new_period_end: DateTime<Utc>,
    ) -> Result<bool>;
}
