use chrono::{DateTime, Duration, TimeZone, Utc};
use crates::domain::{
    entities::{subscriptions::SubscriptionEntity, usages::UsageEntity},
    value_objects::enums::plan_tiers::PlanTier,
};
use uuid::Uuid;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
}

pub fn trial_subscription(
    business_id: Uuid,
    plan_tier: PlanTier,
    start: DateTime<Utc>,
) -> SubscriptionEntity {
    let end = start + Duration::days(30);
    SubscriptionEntity {
        id: Uuid::new_v4(),
        business_id,
        plan_tier: plan_tier.to_string(),
        status: "TRIAL".to_string(),
        trial_start_at: Some(start),
        trial_end_at: Some(end),
        trial_active: true,
        current_period_start: start,
        current_period_end: end,
        next_billing_date: end,
        auto_renew: true,
        external_payment_ref: None,
        created_at: start,
        updated_at: start,
    }
}

pub fn active_subscription(
    business_id: Uuid,
    plan_tier: PlanTier,
    period_start: DateTime<Utc>,
) -> SubscriptionEntity {
    let period_end = period_start + Duration::days(30);
    SubscriptionEntity {
        status: "ACTIVE".to_string(),
        trial_active: false,
        trial_start_at: Some(period_start - Duration::days(30)),
        trial_end_at: Some(period_start),
        current_period_start: period_start,
        current_period_end: period_end,
        next_billing_date: period_end,
        external_payment_ref: Some("pm_card_visa".to_string()),
        ..trial_subscription(business_id, plan_tier, period_start)
    }
}

pub fn usage(subscription_id: Uuid, products: i32, tours: i32) -> UsageEntity {
    UsageEntity {
        products_count: products,
        active_tours_count: tours,
        ..UsageEntity::zeroed(subscription_id, t0())
    }
}
