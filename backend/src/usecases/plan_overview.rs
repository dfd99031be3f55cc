use std::sync::Arc;

use anyhow::anyhow;
use crates::domain::{
    repositories::{subscriptions::SubscriptionRepository, usages::UsageRepository},
    value_objects::{
        plan_catalog::find_plan_by_tier,
        subscriptions::{PlanLimitsSummary, PlanOverview, SubscriptionSummary},
        usages::UsageSummary,
    },
};
use tracing::error;
use uuid::Uuid;

use super::errors::{BillingError, BillingResult};

pub struct PlanOverviewUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    U: UsageRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    usage_repo: Arc<U>,
}

impl<S, U> PlanOverviewUseCase<S, U>
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

    pub async fn overview(&self, business_id: Uuid) -> BillingResult<PlanOverview> {
        let subscription = self
            .subscription_repo
            .find_by_business_id(business_id)
            .await
            .map_err(|err| {
                error!(%business_id, db_error = ?err, "plan_overview: failed to load subscription");
                BillingError::Internal(err)
            })?
            .ok_or(BillingError::NoSubscription { business_id })?;

        let plan = find_plan_by_tier(&subscription.plan_tier)?;

        let usage = self
            .usage_repo
            .get_usage(subscription.id)
            .await
            .map_err(|err| {
                error!(%business_id, db_error = ?err, "plan_overview: failed to load usage");
                BillingError::Internal(err)
            })?
            .ok_or_else(|| {
                BillingError::Internal(anyhow!(
                    "usage row missing for subscription {}",
                    subscription.id
                ))
            })?;

        Ok(PlanOverview {
            subscription: SubscriptionSummary {
                tier: plan.tier,
                name: plan.name.to_string(),
                status: subscription.status,
                current_period_start: subscription.current_period_start,
                current_period_end: subscription.current_period_end,
                next_billing_date: subscription.next_billing_date,
                price_eur: plan.price_eur,
                formatted_price: plan.formatted_price(),
                auto_renew: subscription.auto_renew,
            },
            limits: PlanLimitsSummary::from(plan),
            usage: UsageSummary::from(&usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_fixtures::{t0, trial_subscription, usage};
    use crates::domain::{
        repositories::{
            subscriptions::MockSubscriptionRepository, usages::MockUsageRepository,
        },
        value_objects::{enums::plan_tiers::PlanTier, plans::PlanLimit},
    };

    #[tokio::test]
    async fn combines_plan_limits_and_usage() {
        let business_id = Uuid::new_v4();
        let subscription = trial_subscription(business_id, PlanTier::Growth, t0());

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_business_id()
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });
        let mut usage_repo = MockUsageRepository::new();
        usage_repo.expect_get_usage().returning(|id| {
            let recorded = usage(id, 7, 2);
            Box::pin(async move { Ok(Some(recorded)) })
        });

        let usecase = PlanOverviewUseCase::new(Arc::new(subscription_repo), Arc::new(usage_repo));
        let overview = usecase.overview(business_id).await.unwrap();

        assert_eq!(overview.subscription.name, "Growth");
        assert_eq!(overview.subscription.formatted_price, "€55.00/month");
        assert_eq!(overview.limits.max_orders_per_month, PlanLimit::Unlimited);
        assert_eq!(overview.limits.max_active_tours, PlanLimit::Limited(5));
        assert_eq!(overview.usage.products_count, 7);
        assert_eq!(overview.usage.active_tours_count, 2);
    }

    #[tokio::test]
    async fn missing_subscription_is_not_found() {
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_business_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = PlanOverviewUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(MockUsageRepository::new()),
        );
        let err = usecase.overview(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err.code(), "NO_SUBSCRIPTION");
    }
}
