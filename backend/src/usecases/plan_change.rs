use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    repositories::{subscriptions::SubscriptionRepository, usages::UsageRepository},
    value_objects::{
        enums::{change_directions::ChangeDirection, plan_tiers::PlanTier},
        plan_catalog::{find_plan_by_tier, get_plan_by_tier},
        plan_changes::blocking_issues_for,
        subscriptions::PlanChange,
        usages::UsageSnapshot,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::errors::{BillingError, BillingResult};

/// Moves a subscription between tiers. There is no proration: the billing window
/// restarts at the change and usage counters are left alone.
pub struct PlanChangeUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UsageRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    usage_repo: Arc<U>,
}

impl<S, U> PlanChangeUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UsageRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, usage_repo: Arc<U>) -> Self {
        Self {
            subscription_repo,
            usage_repo,
        }
    }

    async fn load_subscription(&self, business_id: Uuid) -> BillingResult<SubscriptionEntity> {
        let subscription = self
            .subscription_repo
            .find_by_business_id(business_id)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    db_error = ?err,
                    "plan_change: failed to load subscription"
                );
                BillingError::Internal(err)
            })?;

        subscription.ok_or(BillingError::NoSubscription { business_id })
    }

    fn check_direction(
        direction: ChangeDirection,
        current: &PlanEntity,
        target: &PlanEntity,
    ) -> BillingResult<()> {
        let valid = match direction {
            ChangeDirection::Upgrade => target.price_eur > current.price_eur,
            ChangeDirection::Downgrade => target.price_eur < current.price_eur,
        };

        if valid {
            return Ok(());
        }

        Err(BillingError::InvalidDirection {
            direction,
            from: current.tier,
            to: target.tier,
        })
    }

    async fn apply(
        &self,
        subscription: &SubscriptionEntity,
        direction: ChangeDirection,
        current: &PlanEntity,
        target: &PlanEntity,
        now: DateTime<Utc>,
    ) -> BillingResult<PlanChange> {
        let period_end = now + target.billing_period();

        let updated = self
            .subscription_repo
            .update_plan(subscription.id, target.tier, now, period_end)
            .await
            .map_err(|err| {
                error!(
                    business_id = %subscription.business_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "plan_change: failed to update plan"
                );
                BillingError::Internal(err)
            })?;

        info!(
            business_id = %subscription.business_id,
            %direction,
            from = %current.tier,
            to = %target.tier,
            "plan_change: plan changed"
        );

        Ok(PlanChange {
            business_id: subscription.business_id,
            direction,
            from: current.tier,
            to: target.tier,
            current_period_start: updated.current_period_start,
            current_period_end: updated.current_period_end,
            next_billing_date: updated.next_billing_date,
        })
    }

    pub async fn upgrade(
        &self,
        business_id: Uuid,
        target_tier: PlanTier,
        now: DateTime<Utc>,
    ) -> BillingResult<PlanChange> {
        info!(%business_id, %target_tier, "plan_change: upgrade requested");

        let subscription = self.load_subscription(business_id).await?;
        let current = find_plan_by_tier(&subscription.plan_tier)?;
        let target = get_plan_by_tier(target_tier);

        if let Err(err) = Self::check_direction(ChangeDirection::Upgrade, current, target) {
            warn!(
                %business_id,
                from = %current.tier,
                to = %target.tier,
                status = err.status_code().as_u16(),
                "plan_change: upgrade target is not more expensive"
            );
            return Err(err);
        }

        self.apply(&subscription, ChangeDirection::Upgrade, current, target, now)
            .await
    }

    /// Blocked while live resources exceed the target limits or a feature in use would
    /// be lost.
    pub async fn downgrade(
        &self,
        business_id: Uuid,
        target_tier: PlanTier,
        now: DateTime<Utc>,
        usage: UsageSnapshot,
    ) -> BillingResult<PlanChange> {
        info!(%business_id, %target_tier, "plan_change: downgrade requested");

        let subscription = self.load_subscription(business_id).await?;
        self.downgrade_loaded(&subscription, target_tier, now, usage)
            .await
    }

    /// Same as [`Self::downgrade`] with live counts read from the usage ledger.
    pub async fn downgrade_with_recorded_usage(
        &self,
        business_id: Uuid,
        target_tier: PlanTier,
        now: DateTime<Utc>,
        analytics_used: bool,
    ) -> BillingResult<PlanChange> {
        info!(%business_id, %target_tier, "plan_change: downgrade from recorded usage requested");

        let subscription = self.load_subscription(business_id).await?;
        let usage = self
            .usage_repo
            .get_usage(subscription.id)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "plan_change: failed to load usage"
                );
                BillingError::Internal(err)
            })?
            .ok_or_else(|| {
                BillingError::Internal(anyhow!(
                    "usage row missing for subscription {}",
                    subscription.id
                ))
            })?;

        let snapshot = UsageSnapshot::from_usage(&usage, analytics_used);
        self.downgrade_loaded(&subscription, target_tier, now, snapshot)
            .await
    }

    async fn downgrade_loaded(
        &self,
        subscription: &SubscriptionEntity,
        target_tier: PlanTier,
        now: DateTime<Utc>,
        usage: UsageSnapshot,
    ) -> BillingResult<PlanChange> {
        let business_id = subscription.business_id;
        let current = find_plan_by_tier(&subscription.plan_tier)?;
        let target = get_plan_by_tier(target_tier);

        if let Err(err) = Self::check_direction(ChangeDirection::Downgrade, current, target) {
            warn!(
                %business_id,
                from = %current.tier,
                to = %target.tier,
                status = err.status_code().as_u16(),
                "plan_change: downgrade target is not cheaper"
            );
            return Err(err);
        }

        let blocking_issues = blocking_issues_for(target, &usage);
        if !blocking_issues.is_empty() {
            let err = BillingError::DowngradeBlocked { blocking_issues };
            warn!(
                %business_id,
                to = %target.tier,
                status = err.status_code().as_u16(),
                "plan_change: {err}"
            );
            return Err(err);
        }

        self.apply(subscription, ChangeDirection::Downgrade, current, target, now)
            .await
    }
}
