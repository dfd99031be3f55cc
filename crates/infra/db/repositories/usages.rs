use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    PgConnection, RunQueryDsl, prelude::*,
    sql_query,
    sql_types::{Integer, Uuid as SqlUuid},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscription_usages},
};
use domain::{
    entities::usages::UsageEntity,
    repositories::usages::UsageRepository,
    value_objects::{
        enums::usage_counters::UsageCounter, plans::PlanLimit, usages::IncrementOutcome,
    },
};

#[derive(Debug, QueryableByName)]
struct CounterValue {
    #[diesel(sql_type = Integer)]
    value: i32,
}

/// Zeroes the period-scoped counters of one usage row. Shared by the ledger reset and
/// the billing period rollover so both clear the same columns.
pub(crate) fn reset_period_counters_in(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    update(subscription_usages::table.find(subscription_id))
        .set((
            subscription_usages::orders_this_period.eq(0),
            subscription_usages::promotions_used.eq(0),
            subscription_usages::last_reset_at.eq(Some(now)),
            subscription_usages::updated_at.eq(now),
        ))
        .execute(conn)
}

pub struct UsagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UsagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UsageRepository for UsagePostgres {
    async fn get_usage(&self, subscription_id: Uuid) -> Result<Option<UsageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_usages::table
            .find(subscription_id)
            .select(UsageEntity::as_select())
            .first::<UsageEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn increment_if_under_limit(
        &self,
        subscription_id: Uuid,
        counter: UsageCounter,
        limit: PlanLimit,
    ) -> Result<IncrementOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        // Only UsageCounter column names are ever interpolated here.
        let column = counter.column_name();
        let marker = match counter {
            UsageCounter::PromotionsUsed => ", promotions_ever_used = TRUE",
            _ => "",
        };

        let incremented = match limit {
            PlanLimit::Unlimited => sql_query(format!(
                "UPDATE subscription_usages \
                 SET {column} = {column} + 1{marker}, updated_at = NOW() \
                 WHERE subscription_id = $1 \
                 RETURNING {column} AS value"
            ))
            .bind::<SqlUuid, _>(subscription_id)
            .get_result::<CounterValue>(&mut conn)
            .optional()?,
            PlanLimit::Limited(max) => sql_query(format!(
                "UPDATE subscription_usages \
                 SET {column} = {column} + 1{marker}, updated_at = NOW() \
                 WHERE subscription_id = $1 AND {column} + 1 <= $2 \
                 RETURNING {column} AS value"
            ))
            .bind::<SqlUuid, _>(subscription_id)
            .bind::<Integer, _>(max)
            .get_result::<CounterValue>(&mut conn)
            .optional()?,
        };

        if let Some(row) = incremented {
            return Ok(IncrementOutcome {
                accepted: true,
                new_value: row.value,
            });
        }

        let current = sql_query(format!(
            "SELECT {column} AS value FROM subscription_usages WHERE subscription_id = $1"
        ))
        .bind::<SqlUuid, _>(subscription_id)
        .get_result::<CounterValue>(&mut conn)
        .optional()?
        .ok_or_else(|| anyhow!("usage row missing for subscription {subscription_id}"))?;

        Ok(IncrementOutcome {
            accepted: false,
            new_value: current.value,
        })
    }

    async fn decrement(&self, subscription_id: Uuid, counter: UsageCounter) -> Result<i32> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let column = counter.column_name();

        let row = sql_query(format!(
            "UPDATE subscription_usages \
             SET {column} = GREATEST({column} - 1, 0), updated_at = NOW() \
             WHERE subscription_id = $1 \
             RETURNING {column} AS value"
        ))
        .bind::<SqlUuid, _>(subscription_id)
        .get_result::<CounterValue>(&mut conn)
        .optional()?
        .ok_or_else(|| anyhow!("usage row missing for subscription {subscription_id}"))?;

        Ok(row.value)
    }

    async fn reset_period_counters(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated_rows = reset_period_counters_in(&mut conn, subscription_id, now)?;
        if updated_rows == 0 {
            return Err(anyhow!("usage row missing for subscription {subscription_id}"));
        }

        Ok(())
    }
}
