use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::usage_counters::UsageCounter,
    infra::db::postgres::schema::subscription_usages,
};

#[derive(Debug, Clone, PartialEq, Eq, Selectable, Queryable)]
#[diesel(table_name = subscription_usages)]
pub struct UsageEntity {
    pub subscription_id: Uuid,
    pub products_count: i32,
    pub orders_this_period: i32,
    pub active_tours_count: i32,
    pub promotions_used: i32,
    pub promotions_ever_used: bool,
    pub last_reset_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UsageEntity {
    pub fn zeroed(subscription_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            subscription_id,
            products_count: 0,
            orders_this_period: 0,
            active_tours_count: 0,
            promotions_used: 0,
            promotions_ever_used: false,
            last_reset_at: None,
            updated_at: now,
        }
    }

    pub fn value_of(&self, counter: UsageCounter) -> i32 {
        match counter {
            UsageCounter::ProductsCount => self.products_count,
            UsageCounter::OrdersThisPeriod => self.orders_this_period,
            UsageCounter::ActiveToursCount => self.active_tours_count,
            UsageCounter::PromotionsUsed => self.promotions_used,
        }
    }

    /// Zeroes the period-scoped counters. Live resources and the lifetime promotions
    /// marker survive.
    pub fn reset_period(&mut self, now: DateTime<Utc>) {
        self.orders_this_period = 0;
        self.promotions_used = 0;
        self.last_reset_at = Some(now);
        self.updated_at = now;
    }

    pub fn value_mut(&mut self, counter: UsageCounter) -> &mut i32 {
        match counter {
            UsageCounter::ProductsCount => &mut self.products_count,
            UsageCounter::OrdersThisPeriod => &mut self.orders_this_period,
            UsageCounter::ActiveToursCount => &mut self.active_tours_count,
            UsageCounter::PromotionsUsed => &mut self.promotions_used,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_usages)]
pub struct InsertUsageEntity {
    pub subscription_id: Uuid,
    pub products_count: i32,
    pub orders_this_period: i32,
    pub active_tours_count: i32,
    pub promotions_used: i32,
    pub promotions_ever_used: bool,
}

impl InsertUsageEntity {
    pub fn zeroed(subscription_id: Uuid) -> Self {
        Self {
            subscription_id,
            products_count: 0,
            orders_this_period: 0,
            active_tours_count: 0,
            promotions_used: 0,
            promotions_ever_used: false,
        }
    }
}
