use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    value_objects::{
        enums::{
            change_directions::ChangeDirection, plan_tiers::PlanTier,
            subscription_statuses::SubscriptionStatus, support_levels::SupportLevel,
        },
        plans::PlanLimit,
        trials::{TRIAL_REMINDER_DAYS, get_days_remaining, is_trial_active},
        usages::UsageSummary,
    },
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrialStarted {
    pub subscription_id: Uuid,
    pub trial_start_at: DateTime<Utc>,
    pub trial_end_at: DateTime<Utc>,
}

/// Effective lifecycle state derived from the stored record at `now`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrialStatus {
    pub is_in_trial: bool,
    pub days_remaining: i64,
    pub must_renew: bool,
    pub message: Option<String>,
}

impl TrialStatus {
    pub fn evaluate(
        subscription: &SubscriptionEntity,
        plan: &PlanEntity,
        now: DateTime<Utc>,
    ) -> Self {
        let in_trial = is_trial_active(
            subscription.trial_start_at,
            subscription.trial_end_at,
            subscription.trial_active,
            now,
        );

        if in_trial {
            return Self {
                is_in_trial: true,
                days_remaining: get_days_remaining(subscription.trial_end_at, now),
                must_renew: false,
                message: None,
            };
        }

        if subscription.is_status(SubscriptionStatus::Trial) {
            return Self {
                is_in_trial: false,
                days_remaining: 0,
                must_renew: true,
                message: Some(format!(
                    "Your trial period has ended ({} - €{}/month). Please activate your subscription.",
                    plan.name, plan.price_eur
                )),
            };
        }

        Self {
            is_in_trial: false,
            days_remaining: 0,
            must_renew: false,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrialCancellation {
    pub canceled_at: DateTime<Utc>,
    pub access_until: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversionReason {
    Converted,
    NoSubscription,
    NotInTrial,
    TrialNotEnded,
    NoPaymentMethod,
}

impl Display for ConversionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            ConversionReason::Converted => "Trial converted to active subscription",
            ConversionReason::NoSubscription => "No subscription found",
            ConversionReason::NotInTrial => "Not in trial status",
            ConversionReason::TrialNotEnded => "Trial has not ended yet",
            ConversionReason::NoPaymentMethod => {
                "No payment method set up - trial remains unconverted"
            }
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TrialConversion {
    pub converted: bool,
    pub reason: ConversionReason,
}

impl TrialConversion {
    pub fn skipped(reason: ConversionReason) -> Self {
        Self {
            converted: false,
            reason,
        }
    }
}

/// Dashboard banner data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrialInfo {
    pub is_in_trial: bool,
    pub trial_start_at: Option<DateTime<Utc>>,
    pub trial_end_at: Option<DateTime<Utc>>,
    pub days_remaining: i64,
    pub show_reminder: bool,
    pub plan_name: String,
    pub plan_price: i32,
    pub status: String,
}

impl TrialInfo {
    pub fn build(subscription: &SubscriptionEntity, plan: &PlanEntity, now: DateTime<Utc>) -> Self {
        let is_in_trial = is_trial_active(
            subscription.trial_start_at,
            subscription.trial_end_at,
            subscription.trial_active,
            now,
        );
        let days_remaining = get_days_remaining(subscription.trial_end_at, now);

        Self {
            is_in_trial,
            trial_start_at: subscription.trial_start_at,
            trial_end_at: subscription.trial_end_at,
            days_remaining,
            show_reminder: is_in_trial && days_remaining <= TRIAL_REMINDER_DAYS,
            plan_name: plan.name.to_string(),
            plan_price: plan.price_eur,
            status: subscription.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanChange {
    pub business_id: Uuid,
    pub direction: ChangeDirection,
    pub from: PlanTier,
    pub to: PlanTier,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RolloverSkipReason {
    NoSubscription,
    NotActive,
    AutoRenewDisabled,
    PeriodNotEnded,
    AlreadyAdvanced,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RolloverOutcome {
    Advanced {
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    },
    Skipped {
        reason: RolloverSkipReason,
    },
}

impl RolloverOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, RolloverOutcome::Advanced { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub tier: PlanTier,
    pub name: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
    pub price_eur: i32,
    pub formatted_price: String,
    pub auto_renew: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanLimitsSummary {
    pub max_products: PlanLimit,
    pub max_orders_per_month: PlanLimit,
    pub max_active_tours: PlanLimit,
    pub has_analytics: bool,
    pub has_promotions: bool,
    pub support_level: SupportLevel,
    pub support_response_time_hours: i32,
}

impl From<&PlanEntity> for PlanLimitsSummary {
    fn from(value: &PlanEntity) -> Self {
        Self {
            max_products: value.max_products,
            max_orders_per_month: value.max_orders_per_month,
            max_active_tours: value.max_active_tours,
            has_analytics: value.has_analytics,
            has_promotions: value.has_promotions,
            support_level: value.support_level,
            support_response_time_hours: value.support_response_time_hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanOverview {
    pub subscription: SubscriptionSummary,
    pub limits: PlanLimitsSummary,
    pub usage: UsageSummary,
}
