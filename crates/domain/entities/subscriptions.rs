use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::{plan_tiers::PlanTier, subscription_statuses::SubscriptionStatus},
        trials::calculate_trial_end_date,
    },
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub business_id: Uuid,
    pub plan_tier: String,
    pub status: String,
    pub trial_start_at: Option<DateTime<Utc>>,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub trial_active: bool,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub external_payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    pub fn is_status(&self, status: SubscriptionStatus) -> bool {
        self.status == status.to_string()
    }

    pub fn has_payment_reference(&self) -> bool {
        self.external_payment_ref
            .as_deref()
            .is_some_and(|reference| !reference.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub business_id: Uuid,
    pub plan_tier: String,
    pub status: String,
    pub trial_start_at: Option<DateTime<Utc>>,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub trial_active: bool,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
    pub auto_renew: bool,
}

impl InsertSubscriptionEntity {
    /// A fresh trial: the first billing window is the trial window itself.
    pub fn new_trial(business_id: Uuid, plan_tier: PlanTier, now: DateTime<Utc>) -> Self {
        let trial_end_at = calculate_trial_end_date(now);

        Self {
            business_id,
            plan_tier: plan_tier.to_string(),
            status: SubscriptionStatus::Trial.to_string(),
            trial_start_at: Some(now),
            trial_end_at: Some(trial_end_at),
            trial_active: true,
            current_period_start: now,
            current_period_end: trial_end_at,
            next_billing_date: trial_end_at,
            auto_renew: true,
        }
    }
}
