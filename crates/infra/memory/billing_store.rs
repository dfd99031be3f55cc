use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use uuid::Uuid;

use crate::domain::{
    entities::{
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        usages::UsageEntity,
    },
    repositories::{subscriptions::SubscriptionRepository, usages::UsageRepository},
    value_objects::{
        enums::{
            plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus,
            usage_counters::UsageCounter,
        },
        plans::PlanLimit,
        usages::IncrementOutcome,
    },
};

#[derive(Debug, Default)]
struct BillingState {
    subscriptions: HashMap<Uuid, SubscriptionEntity>,
    business_index: HashMap<Uuid, Uuid>,
    usages: HashMap<Uuid, UsageEntity>,
}

impl BillingState {
    fn subscription_mut(&mut self, subscription_id: Uuid) -> Result<&mut SubscriptionEntity> {
        self.subscriptions
            .get_mut(&subscription_id)
            .ok_or_else(|| anyhow!("subscription {subscription_id} not found"))
    }

    fn usage_mut(&mut self, subscription_id: Uuid) -> Result<&mut UsageEntity> {
        self.usages
            .get_mut(&subscription_id)
            .ok_or_else(|| anyhow!("usage row missing for subscription {subscription_id}"))
    }
}

/// Process-local storage for subscriptions and their usage ledger. Every operation runs
/// under one lock, so each trait call is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    state: Mutex<BillingState>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, BillingState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("billing store lock poisoned"))
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn create_with_usage(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut state = self.state()?;

        if state
            .business_index
            .contains_key(&insert_subscription_entity.business_id)
        {
            return Ok(None);
        }

        let now = Utc::now();
        let subscription = SubscriptionEntity {
            id: Uuid::new_v4(),
            business_id: insert_subscription_entity.business_id,
            plan_tier: insert_subscription_entity.plan_tier,
            status: insert_subscription_entity.status,
            trial_start_at: insert_subscription_entity.trial_start_at,
            trial_end_at: insert_subscription_entity.trial_end_at,
            trial_active: insert_subscription_entity.trial_active,
            current_period_start: insert_subscription_entity.current_period_start,
            current_period_end: insert_subscription_entity.current_period_end,
            next_billing_date: insert_subscription_entity.next_billing_date,
            auto_renew: insert_subscription_entity.auto_renew,
            external_payment_ref: None,
            created_at: now,
            updated_at: now,
        };

        state
            .business_index
            .insert(subscription.business_id, subscription.id);
        state
            .usages
            .insert(subscription.id, UsageEntity::zeroed(subscription.id, now));
        state
            .subscriptions
            .insert(subscription.id, subscription.clone());

        Ok(Some(subscription))
    }

    async fn find_by_business_id(&self, business_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let state = self.state()?;

        Ok(state
            .business_index
            .get(&business_id)
            .and_then(|id| state.subscriptions.get(id))
            .cloned())
    }

    async fn update_plan(
        &self,
        subscription_id: Uuid,
        plan_tier: PlanTier,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        let mut state = self.state()?;
        let subscription = state.subscription_mut(subscription_id)?;

        subscription.plan_tier = plan_tier.to_string();
        subscription.current_period_start = period_start;
        subscription.current_period_end = period_end;
        subscription.next_billing_date = period_end;
        subscription.updated_at = Utc::now();

        Ok(subscription.clone())
    }

    async fn update_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<SubscriptionEntity> {
        let mut state = self.state()?;
        let subscription = state.subscription_mut(subscription_id)?;

        subscription.status = status.to_string();
        if status != SubscriptionStatus::Trial {
            subscription.trial_active = false;
        }
        subscription.updated_at = Utc::now();

        Ok(subscription.clone())
    }

    async fn activate(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        let mut state = self.state()?;
        let subscription = state.subscription_mut(subscription_id)?;

        subscription.status = SubscriptionStatus::Active.to_string();
        subscription.trial_active = false;
        subscription.current_period_start = period_start;
        subscription.current_period_end = period_end;
        subscription.next_billing_date = period_end;
        subscription.updated_at = Utc::now();

        Ok(subscription.clone())
    }

    async fn set_payment_reference(
        &self,
        subscription_id: Uuid,
        payment_reference: String,
    ) -> Result<SubscriptionEntity> {
        let mut state = self.state()?;
        let subscription = state.subscription_mut(subscription_id)?;

        subscription.external_payment_ref = Some(payment_reference);
        subscription.updated_at = Utc::now();

        Ok(subscription.clone())
    }

    async fn list_trials_due_for_conversion(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>> {
        let state = self.state()?;

        let mut due: Vec<SubscriptionEntity> = state
            .subscriptions
            .values()
            .filter(|sub| sub.is_status(SubscriptionStatus::Trial))
            .filter(|sub| sub.trial_end_at.is_some_and(|end| end <= now))
            .filter(|sub| sub.has_payment_reference() && sub.auto_renew)
            .cloned()
            .collect();
        due.sort_by_key(|sub| sub.trial_end_at);
        due.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(due)
    }

    async fn list_periods_due_for_rollover(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>> {
        let state = self.state()?;

        let mut due: Vec<SubscriptionEntity> = state
            .subscriptions
            .values()
            .filter(|sub| sub.is_status(SubscriptionStatus::Active))
            .filter(|sub| sub.auto_renew && sub.current_period_end <= now)
            .cloned()
            .collect();
        due.sort_by_key(|sub| sub.current_period_end);
        due.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(due)
    }

    async fn advance_period_and_reset_usage(
        &self,
        subscription_id: Uuid,
        expected_period_end: DateTime<Utc>,
        new_period_start: DateTime<Utc>,
        new_period_end: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state()?;
        let now = Utc::now();

        // Check the usage row first so a failure leaves both records untouched.
        state.usage_mut(subscription_id)?;

        let subscription = state.subscription_mut(subscription_id)?;
        if subscription.current_period_end != expected_period_end {
            return Ok(false);
        }
        subscription.current_period_start = new_period_start;
        subscription.current_period_end = new_period_end;
        subscription.next_billing_date = new_period_end;
        subscription.updated_at = now;

        state.usage_mut(subscription_id)?.reset_period(now);

        Ok(true)
    }
}

#[async_trait]
impl UsageRepository for InMemoryBillingStore {
    async fn get_usage(&self, subscription_id: Uuid) -> Result<Option<UsageEntity>> {
        let state = self.state()?;
        Ok(state.usages.get(&subscription_id).cloned())
    }

    async fn increment_if_under_limit(
        &self,
        subscription_id: Uuid,
        counter: UsageCounter,
        limit: PlanLimit,
    ) -> Result<IncrementOutcome> {
        let mut state = self.state()?;
        let usage = state.usage_mut(subscription_id)?;
        let current = usage.value_of(counter);

        if !limit.allows(current) {
            return Ok(IncrementOutcome {
                accepted: false,
                new_value: current,
            });
        }

        let value = usage.value_mut(counter);
        *value += 1;
        let new_value = *value;
        if counter == UsageCounter::PromotionsUsed {
            usage.promotions_ever_used = true;
        }
        usage.updated_at = Utc::now();

        Ok(IncrementOutcome {
            accepted: true,
            new_value,
        })
    }

    async fn decrement(&self, subscription_id: Uuid, counter: UsageCounter) -> Result<i32> {
        let mut state = self.state()?;
        let usage = state.usage_mut(subscription_id)?;

        let value = usage.value_mut(counter);
        *value = (*value - 1).max(0);
        let new_value = *value;
        usage.updated_at = Utc::now();

        Ok(new_value)
    }

    async fn reset_period_counters(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state()?;
        state.usage_mut(subscription_id)?.reset_period(now);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    async fn seeded(store: &InMemoryBillingStore) -> SubscriptionEntity {
        store
            .create_with_usage(InsertSubscriptionEntity::new_trial(
                Uuid::new_v4(),
                PlanTier::Growth,
                t0(),
            ))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn second_create_for_same_business_is_rejected() {
        let store = InMemoryBillingStore::new();
        let business_id = Uuid::new_v4();

        let first = store
            .create_with_usage(InsertSubscriptionEntity::new_trial(
                business_id,
                PlanTier::Essential,
                t0(),
            ))
            .await
            .unwrap();
        let second = store
            .create_with_usage(InsertSubscriptionEntity::new_trial(
                business_id,
                PlanTier::Growth,
                t0(),
            ))
            .await
            .unwrap();

        let first = first.unwrap();
        assert!(second.is_none());
        assert_eq!(
            store.find_by_business_id(business_id).await.unwrap(),
            Some(first.clone())
        );
        let usage = store.get_usage(first.id).await.unwrap().unwrap();
        assert_eq!(usage.products_count, 0);
        assert_eq!(usage.orders_this_period, 0);
    }

    #[tokio::test]
    async fn concurrent_increments_never_pass_the_limit() {
        let store = Arc::new(InMemoryBillingStore::new());
        let subscription_id = seeded(&store).await.id;
        let limit = PlanLimit::Limited(5);

        for _ in 0..4 {
            let outcome = store
                .increment_if_under_limit(subscription_id, UsageCounter::ActiveToursCount, limit)
                .await
                .unwrap();
            assert!(outcome.accepted);
        }

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .increment_if_under_limit(
                            subscription_id,
                            UsageCounter::ActiveToursCount,
                            limit,
                        )
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().accepted {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        let usage = store.get_usage(subscription_id).await.unwrap().unwrap();
        assert_eq!(usage.active_tours_count, 5);
    }

    #[tokio::test]
    async fn rejected_increment_reports_current_value() {
        let store = InMemoryBillingStore::new();
        let subscription = seeded(&store).await;

        let outcome = store
            .increment_if_under_limit(
                subscription.id,
                UsageCounter::PromotionsUsed,
                PlanLimit::Limited(0),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            IncrementOutcome {
                accepted: false,
                new_value: 0
            }
        );
    }

    #[tokio::test]
    async fn decrement_saturates_at_zero() {
        let store = InMemoryBillingStore::new();
        let subscription = seeded(&store).await;

        store
            .increment_if_under_limit(
                subscription.id,
                UsageCounter::ProductsCount,
                PlanLimit::Unlimited,
            )
            .await
            .unwrap();

        assert_eq!(
            store
                .decrement(subscription.id, UsageCounter::ProductsCount)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            store
                .decrement(subscription.id, UsageCounter::ProductsCount)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn advance_period_is_guarded_by_expected_end() {
        let store = InMemoryBillingStore::new();
        let subscription = seeded(&store).await;
        let old_end = subscription.current_period_end;

        for counter in [UsageCounter::OrdersThisPeriod, UsageCounter::ProductsCount] {
            store
                .increment_if_under_limit(subscription.id, counter, PlanLimit::Unlimited)
                .await
                .unwrap();
        }

        let advanced = store
            .advance_period_and_reset_usage(
                subscription.id,
                old_end,
                old_end,
                old_end + Duration::days(30),
            )
            .await
            .unwrap();
        let repeated = store
            .advance_period_and_reset_usage(
                subscription.id,
                old_end,
                old_end,
                old_end + Duration::days(30),
            )
            .await
            .unwrap();

        assert!(advanced);
        assert!(!repeated);

        let usage = store.get_usage(subscription.id).await.unwrap().unwrap();
        assert_eq!(usage.orders_this_period, 0);
        assert_eq!(usage.products_count, 1);
        assert!(usage.last_reset_at.is_some());

        let stored = store
            .find_by_business_id(subscription.business_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_period_end, old_end + Duration::days(30));
        assert_eq!(stored.next_billing_date, old_end + Duration::days(30));
    }

    #[tokio::test]
    async fn due_listings_respect_status_and_limit() {
        let store = InMemoryBillingStore::new();
        let now = t0() + Duration::days(31);

        let with_ref = seeded(&store).await;
        store
            .set_payment_reference(with_ref.id, "pm_123".to_string())
            .await
            .unwrap();
        let _without_ref = seeded(&store).await;

        let due = store.list_trials_due_for_conversion(now, 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, with_ref.id);

        assert!(
            store
                .list_trials_due_for_conversion(t0(), 10)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .list_trials_due_for_conversion(now, 0)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .list_periods_due_for_rollover(now, 10)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn reset_period_counters_keeps_live_resources() {
        let store = InMemoryBillingStore::new();
        let subscription = seeded(&store).await;
        let reset_at = t0() + Duration::days(30);

        for counter in [
            UsageCounter::ProductsCount,
            UsageCounter::OrdersThisPeriod,
            UsageCounter::ActiveToursCount,
            UsageCounter::PromotionsUsed,
        ] {
            store
                .increment_if_under_limit(subscription.id, counter, PlanLimit::Unlimited)
                .await
                .unwrap();
        }

        store
            .reset_period_counters(subscription.id, reset_at)
            .await
            .unwrap();

        let usage = store.get_usage(subscription.id).await.unwrap().unwrap();
        assert_eq!(usage.orders_this_period, 0);
        assert_eq!(usage.promotions_used, 0);
        assert_eq!(usage.products_count, 1);
        assert_eq!(usage.active_tours_count, 1);
        assert!(usage.promotions_ever_used);
        assert_eq!(usage.last_reset_at, Some(reset_at));
    }

    #[tokio::test]
    async fn reset_period_counters_requires_a_usage_row() {
        let store = InMemoryBillingStore::new();

        assert!(
            store
                .reset_period_counters(Uuid::new_v4(), t0())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn blank_payment_reference_is_not_due_for_conversion() {
        let store = InMemoryBillingStore::new();
        let now = t0() + Duration::days(31);

        let blank = seeded(&store).await;
        store
            .set_payment_reference(blank.id, "   ".to_string())
            .await
            .unwrap();
        let paid = seeded(&store).await;
        store
            .set_payment_reference(paid.id, "pm_ok".to_string())
            .await
            .unwrap();

        let due = store.list_trials_due_for_conversion(now, 1).await.unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, paid.id);
    }
}
