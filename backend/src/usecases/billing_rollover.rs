use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::subscriptions::SubscriptionEntity,
    repositories::subscriptions::SubscriptionRepository,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        plan_catalog::find_plan_by_tier,
        subscriptions::{RolloverOutcome, RolloverSkipReason},
    },
};
use tracing::{error, info};
use uuid::Uuid;

use super::errors::{BillingError, BillingResult};

pub struct BillingRolloverUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
}

impl<S> BillingRolloverUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self { subscription_repo }
    }

    pub async fn roll_over(
        &self,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> BillingResult<RolloverOutcome> {
        let subscription = self
            .subscription_repo
            .find_by_business_id(business_id)
            .await
            .map_err(|err| {
                error!(
                    %business_id,
                    db_error = ?err,
                    "billing_rollover: failed to load subscription"
                );
                BillingError::Internal(err)
            })?;

        match subscription {
            Some(subscription) => self.roll_over_subscription(&subscription, now).await,
            None => Ok(RolloverOutcome::Skipped {
                reason: RolloverSkipReason::NoSubscription,
            }),
        }
    }

    /// Advances one billing period. A subscription several periods behind catches up one
    /// period per call.
    pub async fn roll_over_subscription(
        &self,
        subscription: &SubscriptionEntity,
        now: DateTime<Utc>,
    ) -> BillingResult<RolloverOutcome> {
        let skip = if !subscription.is_status(SubscriptionStatus::Active) {
            Some(RolloverSkipReason::NotActive)
        } else if !subscription.auto_renew {
            Some(RolloverSkipReason::AutoRenewDisabled)
        } else if subscription.current_period_end > now {
            Some(RolloverSkipReason::PeriodNotEnded)
        } else {
            None
        };
        if let Some(reason) = skip {
            return Ok(RolloverOutcome::Skipped { reason });
        }

        let plan = find_plan_by_tier(&subscription.plan_tier)?;
        let period_start = subscription.current_period_end;
        let period_end = period_start + plan.billing_period();

        let advanced = self
            .subscription_repo
            .advance_period_and_reset_usage(
                subscription.id,
                subscription.current_period_end,
                period_start,
                period_end,
            )
            .await
            .map_err(|err| {
                error!(
                    business_id = %subscription.business_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "billing_rollover: failed to advance billing period"
                );
                BillingError::Internal(err)
            })?;

        if !advanced {
            info!(
                business_id = %subscription.business_id,
                subscription_id = %subscription.id,
                "billing_rollover: period already advanced elsewhere"
            );
            return Ok(RolloverOutcome::Skipped {
                reason: RolloverSkipReason::AlreadyAdvanced,
            });
        }

        info!(
            business_id = %subscription.business_id,
            subscription_id = %subscription.id,
            %period_start,
            %period_end,
            "billing_rollover: billing period advanced, period counters reset"
        );

        Ok(RolloverOutcome::Advanced {
            period_start,
            period_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_fixtures::{active_subscription, t0, trial_subscription};
    use chrono::Duration;
    use crates::domain::{
        repositories::subscriptions::MockSubscriptionRepository,
        value_objects::enums::plan_tiers::PlanTier,
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn advances_from_old_period_end() {
        let subscription = active_subscription(Uuid::new_v4(), PlanTier::Growth, t0());
        let old_end = subscription.current_period_end;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_advance_period_and_reset_usage()
            .with(
                eq(subscription.id),
                eq(old_end),
                eq(old_end),
                eq(old_end + Duration::days(30)),
            )
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(true) }));

        let usecase = BillingRolloverUseCase::new(Arc::new(subscription_repo));
        let outcome = usecase
            .roll_over_subscription(&subscription, old_end + Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RolloverOutcome::Advanced {
                period_start: old_end,
                period_end: old_end + Duration::days(30),
            }
        );
    }

    #[tokio::test]
    async fn repeated_call_is_a_no_op() {
        let subscription = active_subscription(Uuid::new_v4(), PlanTier::Essential, t0());

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_advance_period_and_reset_usage()
            .returning(|_, _, _, _| Box::pin(async { Ok(false) }));

        let usecase = BillingRolloverUseCase::new(Arc::new(subscription_repo));
        let outcome = usecase
            .roll_over_subscription(&subscription, t0() + Duration::days(31))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RolloverOutcome::Skipped {
                reason: RolloverSkipReason::AlreadyAdvanced
            }
        );
    }

    #[tokio::test]
    async fn skips_trials_and_running_periods() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_advance_period_and_reset_usage()
            .never();
        let usecase = BillingRolloverUseCase::new(Arc::new(subscription_repo));

        let trial = trial_subscription(Uuid::new_v4(), PlanTier::Growth, t0());
        let active = active_subscription(Uuid::new_v4(), PlanTier::Growth, t0());
        let mut manual = active.clone();
        manual.auto_renew = false;

        let cases = [
            (&trial, t0() + Duration::days(40), RolloverSkipReason::NotActive),
            (&active, t0() + Duration::days(10), RolloverSkipReason::PeriodNotEnded),
            (&manual, t0() + Duration::days(40), RolloverSkipReason::AutoRenewDisabled),
        ];
        for (subscription, now, reason) in cases {
            let outcome = usecase
                .roll_over_subscription(subscription, now)
                .await
                .unwrap();
            assert_eq!(outcome, RolloverOutcome::Skipped { reason });
        }
    }

    #[tokio::test]
    async fn missing_subscription_is_skipped() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_business_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = BillingRolloverUseCase::new(Arc::new(subscription_repo));
        let outcome = usecase.roll_over(Uuid::new_v4(), t0()).await.unwrap();

        assert!(!outcome.is_advanced());
    }
}
