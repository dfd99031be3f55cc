use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, dsl::sql, insert_into, prelude::*, sql_types::Bool, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::{
        postgres::{
            postgres_connection::PgPoolSquad,
            schema::{subscription_usages, subscriptions},
        },
        repositories::usages::reset_period_counters_in,
    },
};
use domain::{
    entities::{
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        usages::InsertUsageEntity,
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::enums::{plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus},
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn create_with_usage(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = conn.transaction::<Option<SubscriptionEntity>, diesel::result::Error, _>(
            |tx| {
                // The unique business_id index settles concurrent signups.
                let inserted = insert_into(subscriptions::table)
                    .values(&insert_subscription_entity)
                    .on_conflict(subscriptions::business_id)
                    .do_nothing()
                    .returning(SubscriptionEntity::as_returning())
                    .get_result::<SubscriptionEntity>(tx)
                    .optional()?;

                if let Some(subscription) = inserted.as_ref() {
                    insert_into(subscription_usages::table)
                        .values(&InsertUsageEntity::zeroed(subscription.id))
                        .execute(tx)?;
                }

                Ok(inserted)
            },
        )?;

        Ok(created)
    }

    async fn find_by_business_id(&self, business_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscriptions::table
            .filter(subscriptions::business_id.eq(business_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_plan(
        &self,
        subscription_id: Uuid,
        plan_tier: PlanTier,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::plan_tier.eq(plan_tier.to_string()),
                subscriptions::current_period_start.eq(period_start),
                subscriptions::current_period_end.eq(period_end),
                subscriptions::next_billing_date.eq(period_end),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn update_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let result = if status == SubscriptionStatus::Trial {
            update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::status.eq(status.to_string()),
                    subscriptions::updated_at.eq(now),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(&mut conn)?
        } else {
            update(subscriptions::table.find(subscription_id))
                .set((
                    subscriptions::status.eq(status.to_string()),
                    subscriptions::trial_active.eq(false),
                    subscriptions::updated_at.eq(now),
                ))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(&mut conn)?
        };

        Ok(result)
    }

    async fn activate(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Active.to_string()),
                subscriptions::trial_active.eq(false),
                subscriptions::current_period_start.eq(period_start),
                subscriptions::current_period_end.eq(period_end),
                subscriptions::next_billing_date.eq(period_end),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn set_payment_reference(
        &self,
        subscription_id: Uuid,
        payment_reference: String,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::external_payment_ref.eq(Some(payment_reference)),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_trials_due_for_conversion(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .filter(subscriptions::status.eq(SubscriptionStatus::Trial.to_string()))
            .filter(subscriptions::trial_end_at.le(now))
            .filter(sql::<Bool>("btrim(external_payment_ref) <> ''"))
            .filter(subscriptions::auto_renew.eq(true))
            .order(subscriptions::trial_end_at.asc())
            .limit(limit)
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_periods_due_for_rollover(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.to_string()))
            .filter(subscriptions::auto_renew.eq(true))
            .filter(subscriptions::current_period_end.le(now))
            .order(subscriptions::current_period_end.asc())
            .limit(limit)
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn advance_period_and_reset_usage(
        &self,
        subscription_id: Uuid,
        expected_period_end: DateTime<Utc>,
        new_period_start: DateTime<Utc>,
        new_period_end: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let advanced = conn.transaction::<bool, diesel::result::Error, _>(|tx| {
            let updated_rows = update(subscriptions::table)
                .filter(subscriptions::id.eq(subscription_id))
                .filter(subscriptions::current_period_end.eq(expected_period_end))
                .set((
                    subscriptions::current_period_start.eq(new_period_start),
                    subscriptions::current_period_end.eq(new_period_end),
                    subscriptions::next_billing_date.eq(new_period_end),
                    subscriptions::updated_at.eq(now),
                ))
                .execute(tx)?;

            if updated_rows == 0 {
                return Ok(false);
            }

            reset_period_counters_in(tx, subscription_id, now)?;

            Ok(true)
        })?;

        Ok(advanced)
    }
}
