use serde::Serialize;

use crate::domain::{
    entities::plans::PlanEntity,
    value_objects::{
        enums::{plan_features::PlanFeature, resource_kinds::ResourceKind},
        plans::PlanLimit,
        usages::UsageSnapshot,
    },
};

/// Reason a downgrade cannot proceed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockingIssue {
    ResourceOverLimit {
        resource: ResourceKind,
        current: i32,
        limit: i32,
        plan: String,
    },
    FeatureLoss {
        feature: PlanFeature,
        plan: String,
    },
}

impl BlockingIssue {
    pub fn message(&self) -> String {
        match self {
            BlockingIssue::ResourceOverLimit {
                resource,
                current,
                limit,
                plan,
            } => format!(
                "You have {current} {} but {plan} only allows {limit}",
                resource.label()
            ),
            BlockingIssue::FeatureLoss { feature, plan } => format!(
                "Your plan currently uses {feature} which is not available in {plan}"
            ),
        }
    }
}

/// Products and active tours are live resources and block a downgrade when they no
/// longer fit. Orders and promotions are period counters and reset at rollover.
pub fn blocking_issues_for(target: &PlanEntity, usage: &UsageSnapshot) -> Vec<BlockingIssue> {
    let mut issues = Vec::new();

    for (resource, current) in [
        (ResourceKind::Product, usage.products_count),
        (ResourceKind::Tour, usage.active_tours_count),
    ] {
        let limit = target.limit_for(resource);
        if let PlanLimit::Limited(max) = limit
            && limit.is_exceeded_by(current)
        {
            issues.push(BlockingIssue::ResourceOverLimit {
                resource,
                current,
                limit: max,
                plan: target.name.to_string(),
            });
        }
    }

    for (feature, used) in [
        (PlanFeature::Analytics, usage.has_analytics_usage),
        (PlanFeature::Promotions, usage.has_promotions_usage),
    ] {
        if used && !target.has_feature(feature) {
            issues.push(BlockingIssue::FeatureLoss {
                feature,
                plan: target.name.to_string(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{
        enums::plan_tiers::PlanTier, plan_catalog::get_plan_by_tier,
    };

    #[test]
    fn usage_at_the_limit_does_not_block() {
        let target = get_plan_by_tier(PlanTier::Essential);
        let usage = UsageSnapshot {
            products_count: 10,
            orders_this_period: 500,
            ..Default::default()
        };

        assert!(blocking_issues_for(target, &usage).is_empty());
    }

    #[test]
    fn products_and_tours_over_limit_block() {
        let target = get_plan_by_tier(PlanTier::Essential);
        let usage = UsageSnapshot {
            products_count: 11,
            active_tours_count: 2,
            ..Default::default()
        };

        let issues = blocking_issues_for(target, &usage);
        assert_eq!(
            issues,
            vec![
                BlockingIssue::ResourceOverLimit {
                    resource: ResourceKind::Product,
                    current: 11,
                    limit: 10,
                    plan: "Essential".to_string(),
                },
                BlockingIssue::ResourceOverLimit {
                    resource: ResourceKind::Tour,
                    current: 2,
                    limit: 0,
                    plan: "Essential".to_string(),
                },
            ]
        );
        assert_eq!(
            issues[0].message(),
            "You have 11 products but Essential only allows 10"
        );
    }

    #[test]
    fn feature_loss_blocks_only_when_used() {
        let target = get_plan_by_tier(PlanTier::Growth);
        let usage = UsageSnapshot {
            has_analytics_usage: true,
            has_promotions_usage: true,
            ..Default::default()
        };

        let issues = blocking_issues_for(target, &usage);
        assert_eq!(
            issues,
            vec![BlockingIssue::FeatureLoss {
                feature: PlanFeature::Promotions,
                plan: "Growth".to_string(),
            }]
        );
    }

    #[test]
    fn blocking_issue_serializes_with_kind_tag() {
        let issue = BlockingIssue::ResourceOverLimit {
            resource: ResourceKind::Product,
            current: 11,
            limit: 10,
            plan: "Essential".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            serde_json::json!({
                "kind": "resource_over_limit",
                "resource": "PRODUCT",
                "current": 11,
                "limit": 10,
                "plan": "Essential",
            })
        );
    }
}
