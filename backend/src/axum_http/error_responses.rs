use axum::{
    Json,
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::{plan_changes::BlockingIssue, plans::PlanLimit};
use serde::Serialize;
use tracing::error;

use crate::usecases::errors::BillingError;

#[derive(Debug, Serialize)]
pub struct BlockingIssueBody {
    #[serde(flatten)]
    pub issue: BlockingIssue,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_issues: Option<Vec<BlockingIssueBody>>,
}

impl From<&BillingError> for ErrorResponse {
    fn from(value: &BillingError) -> Self {
        let message = match value {
            // Don't leak internal error detail to client
            BillingError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let blocking_issues = match value {
            BillingError::DowngradeBlocked { blocking_issues } => Some(
                blocking_issues
                    .iter()
                    .map(|issue| BlockingIssueBody {
                        issue: issue.clone(),
                        message: issue.message(),
                    })
                    .collect(),
            ),
            _ => None,
        };

        let (limit, current) = match value {
            BillingError::PlanLimitReached {
                limit: PlanLimit::Limited(max),
                current,
                ..
            } => (Some(*max), Some(*current)),
            BillingError::PlanLimitReached { current, .. } => (None, Some(*current)),
            _ => (None, None),
        };

        Self {
            status: value.status_code().as_u16(),
            code: value.code(),
            message,
            limit,
            current,
            blocking_issues,
        }
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        if let BillingError::Internal(err) = &self {
            error!(error = ?err, "billing: internal error returned to client");
        }

        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crates::domain::value_objects::enums::{
        plan_features::PlanFeature, resource_kinds::ResourceKind,
    };
    use serde_json::json;

    #[test]
    fn downgrade_blocked_lists_issues() {
        let err = BillingError::DowngradeBlocked {
            blocking_issues: vec![
                BlockingIssue::ResourceOverLimit {
                    resource: ResourceKind::Product,
                    current: 12,
                    limit: 10,
                    plan: "Essential".to_string(),
                },
                BlockingIssue::FeatureLoss {
                    feature: PlanFeature::Analytics,
                    plan: "Essential".to_string(),
                },
            ],
        };

        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();

        assert_eq!(body["status"], json!(400));
        assert_eq!(body["code"], json!("DOWNGRADE_BLOCKED"));
        assert_eq!(body["blocking_issues"][0]["kind"], json!("resource_over_limit"));
        assert_eq!(body["blocking_issues"][0]["resource"], json!("PRODUCT"));
        assert_eq!(
            body["blocking_issues"][1]["message"],
            json!("Your plan currently uses analytics which is not available in Essential")
        );
    }

    #[test]
    fn plan_limit_body_carries_limit_and_current() {
        let err = BillingError::PlanLimitReached {
            plan: "Growth".to_string(),
            resource: ResourceKind::Product,
            limit: PlanLimit::Limited(50),
            current: 50,
        };

        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();

        assert_eq!(body["code"], json!("PLAN_LIMIT_REACHED"));
        assert_eq!(body["limit"], json!(50));
        assert_eq!(body["current"], json!(50));
        assert!(body["message"].as_str().unwrap().contains("(50 used)"));
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = BillingError::Internal(anyhow::anyhow!("password=hunter2"));
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();

        assert_eq!(body["message"], json!("Internal server error"));
        assert!(body.get("blocking_issues").is_none());
        assert!(body.get("limit").is_none());
    }

    #[test]
    fn response_carries_status_code() {
        let err = BillingError::SubscriptionRequired {
            message: "Your trial period has ended.".to_string(),
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }
}
