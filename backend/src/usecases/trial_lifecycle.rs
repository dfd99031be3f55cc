use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{
        plans::PlanEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::{plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus},
        plan_catalog::find_plan_by_tier,
        subscriptions::{
            ConversionReason, TrialCancellation, TrialConversion, TrialInfo, TrialStarted,
            TrialStatus,
        },
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::errors::{BillingError, BillingResult};

/// Fails with `SubscriptionRequired` when the trial has lapsed without conversion.
/// Every plan-constrained action passes through here before touching the ledger.
pub fn enforce_loaded_trial(
    subscription: &SubscriptionEntity,
    plan: &PlanEntity,
    action: &str,
    now: DateTime<Utc>,
) -> BillingResult<()> {
    let status = TrialStatus::evaluate(subscription, plan, now);

    if status.must_renew {
        let err = BillingError::SubscriptionRequired {
            message: status.message.unwrap_or_else(|| {
                "Your trial period has ended. Please activate your subscription.".to_string()
            }),
        };
        warn!(
            business_id = %subscription.business_id,
            action,
            status = err.status_code().as_u16(),
            "trial_lifecycle: action blocked, trial expired without payment"
        );
        return Err(err);
    }

    Ok(())
}

pub struct TrialLifecycleUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
}

impl<S> TrialLifecycleUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self { subscription_repo }
    }

    async fn find_subscription(&self, business_id: Uuid) -> BillingResult<Option<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_business_id(business_id)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    db_error = ?err,
                    "trial_lifecycle: failed to load subscription"
                );
                BillingError::Internal(err)
            })
    }

    pub(crate) async fn load_subscription(
        &self,
        business_id: Uuid,
    ) -> BillingResult<SubscriptionEntity> {
        match self.find_subscription(business_id).await? {
            Some(subscription) => Ok(subscription),
            None => {
                let err = BillingError::NoSubscription { business_id };
                warn!(
                    %business_id,
                    status = err.status_code().as_u16(),
                    "trial_lifecycle: no subscription for business"
                );
                Err(err)
            }
        }
    }

    pub async fn initialize_trial(
        &self,
        business_id: Uuid,
        plan_tier: PlanTier,
        now: DateTime<Utc>,
    ) -> BillingResult<TrialStarted> {
        info!(%business_id, %plan_tier, "trial_lifecycle: initializing trial");

        if self.find_subscription(business_id).await?.is_some() {
            let err = BillingError::TrialAlreadyExists { business_id };
            warn!(
                %business_id,
                status = err.status_code().as_u16(),
                "trial_lifecycle: business already has a subscription"
            );
            return Err(err);
        }

        let created = self
            .subscription_repo
            .create_with_usage(InsertSubscriptionEntity::new_trial(
                business_id,
                plan_tier,
                now,
            ))
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    db_error = ?err,
                    "trial_lifecycle: failed to create trial subscription"
                );
                BillingError::Internal(err)
            })?;

        let Some(subscription) = created else {
            let err = BillingError::TrialAlreadyExists { business_id };
            warn!(
                %business_id,
                status = err.status_code().as_u16(),
                "trial_lifecycle: concurrent trial creation lost the race"
            );
            return Err(err);
        };

        let (Some(trial_start_at), Some(trial_end_at)) =
            (subscription.trial_start_at, subscription.trial_end_at)
        else {
            return Err(BillingError::Internal(anyhow::anyhow!(
                "trial subscription {} stored without trial window",
                subscription.id
            )));
        };

        info!(
            %business_id,
            subscription_id = %subscription.id,
            %trial_end_at,
            "trial_lifecycle: trial started"
        );

        Ok(TrialStarted {
            subscription_id: subscription.id,
            trial_start_at,
            trial_end_at,
        })
    }

    pub async fn check_trial_status(
        &self,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> BillingResult<TrialStatus> {
        let subscription = self.load_subscription(business_id).await?;
        let plan = find_plan_by_tier(&subscription.plan_tier)?;

        Ok(TrialStatus::evaluate(&subscription, plan, now))
    }

    pub async fn enforce_trial_expiration(
        &self,
        business_id: Uuid,
        action: &str,
        now: DateTime<Utc>,
    ) -> BillingResult<()> {
        let subscription = self.load_subscription(business_id).await?;
        let plan = find_plan_by_tier(&subscription.plan_tier)?;

        enforce_loaded_trial(&subscription, plan, action, now)
    }

    /// Access is kept until the recorded trial end; the trial window is not shortened.
    pub async fn cancel_trial(
        &self,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> BillingResult<TrialCancellation> {
        let subscription = self.load_subscription(business_id).await?;

        if !subscription.is_status(SubscriptionStatus::Trial) {
            let err = BillingError::NotInTrial {
                status: subscription.status.clone(),
            };
            warn!(
                %business_id,
                subscription_status = %subscription.status,
                status = err.status_code().as_u16(),
                "trial_lifecycle: cancel requested outside trial"
            );
            return Err(err);
        }

        self.subscription_repo
            .update_status(subscription.id, SubscriptionStatus::Cancelled)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "trial_lifecycle: failed to cancel trial"
                );
                BillingError::Internal(err)
            })?;

        let access_until = subscription.trial_end_at.unwrap_or(now);
        info!(%business_id, %access_until, "trial_lifecycle: trial cancelled");

        Ok(TrialCancellation {
            canceled_at: now,
            access_until,
            message: format!(
                "Trial cancelled. Access kept until {}.",
                access_until.format("%Y-%m-%d")
            ),
        })
    }

    pub async fn convert_trial_to_subscription(
        &self,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> BillingResult<TrialConversion> {
        let Some(subscription) = self.find_subscription(business_id).await? else {
            return Ok(TrialConversion::skipped(ConversionReason::NoSubscription));
        };

        if !subscription.is_status(SubscriptionStatus::Trial) {
            return Ok(TrialConversion::skipped(ConversionReason::NotInTrial));
        }

        let trial_end_at = match subscription.trial_end_at {
            Some(end) if now >= end => end,
            _ => return Ok(TrialConversion::skipped(ConversionReason::TrialNotEnded)),
        };

        if !(subscription.auto_renew && subscription.has_payment_reference()) {
            info!(
                %business_id,
                "trial_lifecycle: trial ended without payment method, left unconverted"
            );
            return Ok(TrialConversion::skipped(ConversionReason::NoPaymentMethod));
        }

        let plan = find_plan_by_tier(&subscription.plan_tier)?;
        let period_end = trial_end_at + plan.billing_period();

        self.subscription_repo
            .activate(subscription.id, trial_end_at, period_end)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "trial_lifecycle: failed to activate subscription"
                );
                BillingError::Internal(err)
            })?;

        info!(
            %business_id,
            subscription_id = %subscription.id,
            %period_end,
            "trial_lifecycle: trial converted to active subscription"
        );

        Ok(TrialConversion {
            converted: true,
            reason: ConversionReason::Converted,
        })
    }

    pub async fn get_trial_info(
        &self,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> BillingResult<Option<TrialInfo>> {
        let Some(subscription) = self.find_subscription(business_id).await? else {
            return Ok(None);
        };
        let plan = find_plan_by_tier(&subscription.plan_tier)?;

        Ok(Some(TrialInfo::build(&subscription, plan, now)))
    }

    /// Stores the opaque reference handed over by the payment collaborator, trimmed.
    /// A blank reference could never convert a trial and is refused.
    pub async fn attach_payment_reference(
        &self,
        business_id: Uuid,
        payment_reference: String,
    ) -> BillingResult<()> {
        let payment_reference = payment_reference.trim();
        if payment_reference.is_empty() {
            let err = BillingError::InvalidPaymentReference;
            warn!(
                %business_id,
                status = err.status_code().as_u16(),
                "trial_lifecycle: blank payment reference refused"
            );
            return Err(err);
        }

        let subscription = self.load_subscription(business_id).await?;

        self.subscription_repo
            .set_payment_reference(subscription.id, payment_reference.to_string())
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "trial_lifecycle: failed to store payment reference"
                );
                BillingError::Internal(err)
            })?;

        info!(%business_id, "trial_lifecycle: payment reference attached");
        Ok(())
    }
}
