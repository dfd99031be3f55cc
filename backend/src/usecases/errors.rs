use axum::http::StatusCode;
use crates::domain::value_objects::{
    enums::{
        change_directions::ChangeDirection, plan_features::PlanFeature, plan_tiers::PlanTier,
        plan_tiers::UnknownTierError, resource_kinds::ResourceKind,
    },
    plan_changes::BlockingIssue,
    plans::PlanLimit,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("business {business_id} already has a subscription; only one trial per business")]
    TrialAlreadyExists { business_id: Uuid },
    #[error("no subscription found for business {business_id}")]
    NoSubscription { business_id: Uuid },
    #[error("subscription is not in trial (status {status})")]
    NotInTrial { status: String },
    #[error("{message}")]
    SubscriptionRequired { message: String },
    #[error(
        "You've reached your {} limit of {limit} on the {plan} plan ({current} used). Upgrade to continue.",
        .resource.label()
    )]
    PlanLimitReached {
        plan: String,
        resource: ResourceKind,
        limit: PlanLimit,
        current: i32,
    },
    #[error("cannot {direction} from {from} to {to}")]
    InvalidDirection {
        direction: ChangeDirection,
        from: PlanTier,
        to: PlanTier,
    },
    #[error("downgrade blocked by {} issue(s)", .blocking_issues.len())]
    DowngradeBlocked { blocking_issues: Vec<BlockingIssue> },
    #[error(transparent)]
    UnknownTier(#[from] UnknownTierError),
    #[error("payment reference must not be blank")]
    InvalidPaymentReference,
    #[error("{feature} is not available on the {plan} plan. Upgrade to continue.")]
    UpgradeRequired { feature: PlanFeature, plan: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::TrialAlreadyExists { .. } => "TRIAL_ALREADY_EXISTS",
            BillingError::NoSubscription { .. } => "NO_SUBSCRIPTION",
            BillingError::NotInTrial { .. } => "NOT_IN_TRIAL",
            BillingError::SubscriptionRequired { .. } => "SUBSCRIPTION_REQUIRED",
            BillingError::PlanLimitReached { .. } => "PLAN_LIMIT_REACHED",
            BillingError::InvalidDirection { .. } => "INVALID_DIRECTION",
            BillingError::DowngradeBlocked { .. } => "DOWNGRADE_BLOCKED",
            BillingError::UnknownTier(_) => "UNKNOWN_TIER",
            BillingError::InvalidPaymentReference => "INVALID_PAYMENT_REFERENCE",
            BillingError::UpgradeRequired { .. } => "UPGRADE_REQUIRED",
            BillingError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::NoSubscription { .. } | BillingError::UnknownTier(_) => {
                StatusCode::NOT_FOUND
            }
            BillingError::TrialAlreadyExists { .. } => StatusCode::CONFLICT,
            BillingError::NotInTrial { .. }
            | BillingError::PlanLimitReached { .. }
            | BillingError::InvalidDirection { .. }
            | BillingError::DowngradeBlocked { .. }
            | BillingError::InvalidPaymentReference => StatusCode::BAD_REQUEST,
            BillingError::SubscriptionRequired { .. } => StatusCode::PAYMENT_REQUIRED,
            BillingError::UpgradeRequired { .. } => StatusCode::FORBIDDEN,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type BillingResult<T> = std::result::Result<T, BillingError>;
