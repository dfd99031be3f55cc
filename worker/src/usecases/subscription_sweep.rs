use std::sync::Arc;

use anyhow::Result;
use backend::usecases::{
    billing_rollover::BillingRolloverUseCase, trial_lifecycle::TrialLifecycleUseCase,
};
use chrono::{DateTime, Utc};
use crates::domain::repositories::subscriptions::SubscriptionRepository;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct SubscriptionSweepParams {
    pub batch_limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSweepResult {
    pub trials_scanned: usize,
    pub trials_converted: usize,
    pub periods_scanned: usize,
    pub periods_advanced: usize,
    pub failed_ids: Vec<Uuid>,
}

/// Time-driven side of the engine: converts trials whose window closed and rolls
/// billing periods over at their boundary.
pub struct SubscriptionSweepUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    lifecycle: TrialLifecycleUseCase<S>,
    rollover: BillingRolloverUseCase<S>,
}

impl<S> SubscriptionSweepUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self {
            lifecycle: TrialLifecycleUseCase::new(Arc::clone(&subscription_repo)),
            rollover: BillingRolloverUseCase::new(Arc::clone(&subscription_repo)),
            subscription_repo,
        }
    }

    pub async fn run(
        &self,
        now: DateTime<Utc>,
        params: SubscriptionSweepParams,
    ) -> Result<SubscriptionSweepResult> {
        let limit = params.batch_limit.max(1);
        let mut result = SubscriptionSweepResult::default();

        let due_trials = self
            .subscription_repo
            .list_trials_due_for_conversion(now, limit)
            .await?;
        result.trials_scanned = due_trials.len();

        for subscription in due_trials {
            match self
                .lifecycle
                .convert_trial_to_subscription(subscription.business_id, now)
                .await
            {
                Ok(conversion) if conversion.converted => result.trials_converted += 1,
                Ok(conversion) => info!(
                    business_id = %subscription.business_id,
                    reason = %conversion.reason,
                    "subscription_sweep: trial left unconverted"
                ),
                Err(err) => {
                    error!(
                        business_id = %subscription.business_id,
                        subscription_id = %subscription.id,
                        error = ?err,
                        "subscription_sweep: trial conversion failed; continuing"
                    );
                    result.failed_ids.push(subscription.id);
                }
            }
        }

        let due_periods = self
            .subscription_repo
            .list_periods_due_for_rollover(now, limit)
            .await?;
        result.periods_scanned = due_periods.len();

        for subscription in due_periods {
            match self.rollover.roll_over_subscription(&subscription, now).await {
                Ok(outcome) if outcome.is_advanced() => result.periods_advanced += 1,
                Ok(_) => {}
                Err(err) => {
                    error!(
                        business_id = %subscription.business_id,
                        subscription_id = %subscription.id,
                        error = ?err,
                        "subscription_sweep: billing rollover failed; continuing"
                    );
                    result.failed_ids.push(subscription.id);
                }
            }
        }

        info!(
            trials_scanned = result.trials_scanned,
            trials_converted = result.trials_converted,
            periods_scanned = result.periods_scanned,
            periods_advanced = result.periods_advanced,
            failed = result.failed_ids.len(),
            "subscription_sweep: completed"
        );

        Ok(result)
    }
}
