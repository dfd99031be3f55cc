use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    repositories::{subscriptions::SubscriptionRepository, usages::UsageRepository},
    value_objects::{
        enums::{
            plan_features::PlanFeature, resource_kinds::ResourceKind,
            subscription_statuses::SubscriptionStatus,
        },
        plan_catalog::find_plan_by_tier,
        usages::UsageReservation,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    errors::{BillingError, BillingResult},
    trial_lifecycle::enforce_loaded_trial,
};

pub struct EnforcementGate<S, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UsageRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    usage_repo: Arc<U>,
}

impl<S, U> EnforcementGate<S, U>
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
                    "enforcement_gate: failed to load subscription"
                );
                BillingError::Internal(err)
            })?;

        subscription.ok_or_else(|| {
            let err = BillingError::NoSubscription { business_id };
            warn!(
                %business_id,
                status = err.status_code().as_u16(),
                "enforcement_gate: no subscription for business"
            );
            err
        })
    }

    /// Lifecycle checks shared by resource and feature access.
    async fn load_with_access(
        &self,
        business_id: Uuid,
        action: &str,
        now: DateTime<Utc>,
    ) -> BillingResult<(SubscriptionEntity, &'static PlanEntity)> {
        let subscription = self.load_subscription(business_id).await?;
        let plan = find_plan_by_tier(&subscription.plan_tier)?;

        enforce_loaded_trial(&subscription, plan, action, now)?;

        if subscription.is_status(SubscriptionStatus::Cancelled)
            && subscription.trial_end_at.is_none_or(|end| now >= end)
        {
            let err = BillingError::SubscriptionRequired {
                message: "Your subscription was cancelled and its access period has ended. \
                          Please activate a subscription."
                    .to_string(),
            };
            warn!(
                %business_id,
                action,
                status = err.status_code().as_u16(),
                "enforcement_gate: cancelled subscription past access window"
            );
            return Err(err);
        }

        Ok((subscription, plan))
    }

    /// Counts one unit of `kind` against the plan. Nothing is written when the action
    /// is denied.
    pub async fn guard_action(
        &self,
        business_id: Uuid,
        kind: ResourceKind,
        now: DateTime<Utc>,
    ) -> BillingResult<UsageReservation> {
        let action = kind.to_string();
        let (subscription, plan) = self.load_with_access(business_id, &action, now).await?;

        let limit = plan.limit_for(kind);
        let counter = kind.counter();
        let outcome = self
            .usage_repo
            .increment_if_under_limit(subscription.id, counter, limit)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    subscription_id = %subscription.id,
                    %counter,
                    db_error = ?err,
                    "enforcement_gate: failed to increment usage"
                );
                BillingError::Internal(err)
            })?;

        if !outcome.accepted {
            let err = BillingError::PlanLimitReached {
                plan: plan.name.to_string(),
                resource: kind,
                limit,
                current: outcome.new_value,
            };
            warn!(
                %business_id,
                resource = %kind,
                %limit,
                current = outcome.new_value,
                status = err.status_code().as_u16(),
                "enforcement_gate: plan limit reached"
            );
            return Err(err);
        }

        info!(
            %business_id,
            resource = %kind,
            new_value = outcome.new_value,
            "enforcement_gate: action allowed"
        );

        Ok(UsageReservation {
            subscription_id: subscription.id,
            counter,
            new_value: outcome.new_value,
        })
    }

    /// Runs `write` only after the gate allowed the action and gives the unit back when
    /// the write fails.
    pub async fn run_guarded<T, E, F, Fut>(
        &self,
        business_id: Uuid,
        kind: ResourceKind,
        now: DateTime<Utc>,
        write: F,
    ) -> BillingResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BillingError>,
    {
        let reservation = self.guard_action(business_id, kind, now).await?;

        match write().await {
            Ok(value) => Ok(value),
            Err(write_err) => {
                let write_err = write_err.into();
                warn!(
                    %business_id,
                    resource = %kind,
                    write_error = %write_err,
                    "enforcement_gate: resource write failed, releasing usage"
                );

                if let Err(err) = self
                    .usage_repo
                    .decrement(reservation.subscription_id, reservation.counter)
                    .await
                {
                    error!(
                        %business_id,
                        subscription_id = %reservation.subscription_id,
                        counter = %reservation.counter,
                        db_error = ?err,
                        "enforcement_gate: failed to release usage after write failure"
                    );
                }

                Err(write_err)
            }
        }
    }

    /// Gives back one unit of `kind`, e.g. when a product is deleted.
    pub async fn release(&self, business_id: Uuid, kind: ResourceKind) -> BillingResult<i32> {
        let subscription = self.load_subscription(business_id).await?;
        let counter = kind.counter();

        let value = self
            .usage_repo
            .decrement(subscription.id, counter)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    subscription_id = %subscription.id,
                    %counter,
                    db_error = ?err,
                    "enforcement_gate: failed to release usage"
                );
                BillingError::Internal(err)
            })?;

        info!(%business_id, resource = %kind, new_value = value, "enforcement_gate: usage released");
        Ok(value)
    }

    pub async fn require_feature(
        &self,
        business_id: Uuid,
        feature: PlanFeature,
        now: DateTime<Utc>,
    ) -> BillingResult<()> {
        let action = feature.to_string();
        let (_, plan) = self.load_with_access(business_id, &action, now).await?;

        if !plan.has_feature(feature) {
            let err = BillingError::UpgradeRequired {
                feature,
                plan: plan.name.to_string(),
            };
            warn!(
                %business_id,
                %feature,
                plan = plan.name,
                status = err.status_code().as_u16(),
                "enforcement_gate: feature not included in plan"
            );
            return Err(err);
        }

        Ok(())
    }
}
