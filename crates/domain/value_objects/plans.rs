use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A per-plan ceiling on one resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanLimit {
    Limited(i32),
    Unlimited,
}

impl PlanLimit {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, PlanLimit::Unlimited)
    }

    /// Whether one more unit may be added on top of `current`.
    pub fn allows(&self, current: i32) -> bool {
        match self {
            PlanLimit::Unlimited => true,
            PlanLimit::Limited(limit) => current < *limit,
        }
    }

    /// Whether an existing `count` no longer fits under this limit.
    pub fn is_exceeded_by(&self, count: i32) -> bool {
        match self {
            PlanLimit::Unlimited => false,
            PlanLimit::Limited(limit) => count > *limit,
        }
    }

    pub fn format_limit(&self) -> String {
        match self {
            PlanLimit::Unlimited => "Unlimited".to_string(),
            PlanLimit::Limited(limit) => limit.to_string(),
        }
    }
}

impl Display for PlanLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_limit())
    }
}

/// Free informational pseudo-plan shown to visitors. Never persisted or enforced.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VisitorPlan {
    pub tier: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price_eur: i32,
    pub billing_period_days: Option<i32>,
    pub features: Vec<&'static str>,
}

pub fn format_plan_price(price_eur: i32) -> String {
    format!("€{}.00/month", price_eur)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_allows_strictly_below() {
        let limit = PlanLimit::Limited(10);
        assert!(limit.allows(9));
        assert!(!limit.allows(10));
        assert!(!limit.allows(11));
    }

    #[test]
    fn zero_limit_never_allows() {
        assert!(!PlanLimit::Limited(0).allows(0));
    }

    #[test]
    fn exceeded_only_when_strictly_over() {
        let limit = PlanLimit::Limited(5);
        assert!(!limit.is_exceeded_by(5));
        assert!(limit.is_exceeded_by(6));
        assert!(!PlanLimit::Unlimited.is_exceeded_by(i32::MAX));
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(PlanLimit::Unlimited.to_string(), "Unlimited");
        assert_eq!(PlanLimit::Limited(30).to_string(), "30");
        assert_eq!(format_plan_price(55), "€55.00/month");
    }
}
