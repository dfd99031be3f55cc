use crate::domain::{
    entities::plans::PlanEntity,
    value_objects::{
        enums::{
            plan_tiers::{PlanTier, UnknownTierError},
            support_levels::SupportLevel,
        },
        plans::{PlanLimit, VisitorPlan},
    },
};

pub static PRICING_PLANS: [PlanEntity; 3] = [
    PlanEntity {
        tier: PlanTier::Essential,
        name: "Essential",
        description: "Perfect for starting your cheese business",
        price_eur: 25,
        billing_period_days: 30,
        max_products: PlanLimit::Limited(10),
        max_orders_per_month: PlanLimit::Limited(30),
        max_active_tours: PlanLimit::Limited(0),
        has_analytics: false,
        has_promotions: false,
        support_level: SupportLevel::Standard,
        support_response_time_hours: 72,
    },
    PlanEntity {
        tier: PlanTier::Growth,
        name: "Growth",
        description: "For growing cheese businesses",
        price_eur: 55,
        billing_period_days: 30,
        max_products: PlanLimit::Limited(50),
        max_orders_per_month: PlanLimit::Unlimited,
        max_active_tours: PlanLimit::Limited(5),
        has_analytics: true,
        has_promotions: false,
        support_level: SupportLevel::Priority,
        support_response_time_hours: 24,
    },
    PlanEntity {
        tier: PlanTier::Professional,
        name: "Professional",
        description: "For established cheese businesses",
        price_eur: 95,
        billing_period_days: 30,
        max_products: PlanLimit::Unlimited,
        max_orders_per_month: PlanLimit::Unlimited,
        max_active_tours: PlanLimit::Unlimited,
        has_analytics: true,
        has_promotions: true,
        support_level: SupportLevel::Dedicated,
        support_response_time_hours: 1,
    },
];

pub fn get_plan_by_tier(tier: PlanTier) -> &'static PlanEntity {
    match tier {
        PlanTier::Essential => &PRICING_PLANS[0],
        PlanTier::Growth => &PRICING_PLANS[1],
        PlanTier::Professional => &PRICING_PLANS[2],
    }
}

/// Resolves a tier name received from a caller or read back from storage.
pub fn find_plan_by_tier(tier: &str) -> Result<&'static PlanEntity, UnknownTierError> {
    let tier = tier.parse::<PlanTier>()?;
    Ok(get_plan_by_tier(tier))
}

pub fn get_default_plan() -> &'static PlanEntity {
    get_plan_by_tier(PlanTier::Essential)
}

pub fn get_all_plans() -> Vec<&'static PlanEntity> {
    let mut plans: Vec<&'static PlanEntity> = PRICING_PLANS.iter().collect();
    plans.sort_by_key(|plan| plan.price_eur);
    plans
}

pub fn get_visitor_plan() -> VisitorPlan {
    VisitorPlan {
        tier: "VISITOR",
        name: "Visitor",
        description: "Explore cheese businesses and experiences",
        price_eur: 0,
        billing_period_days: None,
        features: vec![
            "Browse all cheese businesses",
            "View tours and tastings",
            "Make bookings",
            "Join the cheese passport program",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::resource_kinds::ResourceKind;

    fn rank(limit: PlanLimit) -> i64 {
        match limit {
            PlanLimit::Limited(value) => i64::from(value),
            PlanLimit::Unlimited => i64::MAX,
        }
    }

    #[test]
    fn lookup_returns_matching_tier() {
        for tier in PlanTier::ALL {
            assert_eq!(get_plan_by_tier(tier).tier, tier);
        }
    }

    #[test]
    fn all_plans_are_sorted_by_strictly_increasing_price() {
        let plans = get_all_plans();
        assert_eq!(plans.len(), 3);
        for pair in plans.windows(2) {
            assert!(pair[0].price_eur < pair[1].price_eur);
            assert!(pair[0].tier < pair[1].tier);
        }
    }

    #[test]
    fn limits_never_decrease_with_tier() {
        let plans = get_all_plans();
        for pair in plans.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            for kind in [
                ResourceKind::Product,
                ResourceKind::Order,
                ResourceKind::Tour,
                ResourceKind::Promotion,
            ] {
                assert!(rank(lower.limit_for(kind)) <= rank(higher.limit_for(kind)));
            }
            assert!(!lower.has_analytics || higher.has_analytics);
            assert!(!lower.has_promotions || higher.has_promotions);
        }
    }

    #[test]
    fn promotions_follow_feature_flag() {
        assert_eq!(
            get_plan_by_tier(PlanTier::Growth).limit_for(ResourceKind::Promotion),
            PlanLimit::Limited(0)
        );
        assert!(
            get_plan_by_tier(PlanTier::Professional)
                .limit_for(ResourceKind::Promotion)
                .is_unlimited()
        );
    }

    #[test]
    fn unknown_tier_is_rejected() {
        let err = find_plan_by_tier("PLATINUM").unwrap_err();
        assert_eq!(err.to_string(), "unknown pricing tier: PLATINUM");
    }

    #[test]
    fn visitor_plan_is_free_and_unbilled() {
        let visitor = get_visitor_plan();
        assert_eq!(visitor.price_eur, 0);
        assert_eq!(visitor.billing_period_days, None);
        assert!(find_plan_by_tier(visitor.tier).is_err());
    }

    #[test]
    fn default_plan_is_essential() {
        assert_eq!(get_default_plan().tier, PlanTier::Essential);
        assert_eq!(get_default_plan().formatted_price(), "€25.00/month");
    }
}
