//! Subscription relation and toggle DTOs.
//!
//! A subscription has no flag: a row for `(user_id, course_id)` existing *is*
//! the subscribed state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{CourseId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subscription {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ToggleSubscriptionDto {
    pub course: CourseId,
}

/// Result of a toggle, relative to the state before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SubscriptionOutcome {
    Added,
    Removed,
}

impl SubscriptionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionOutcome::Added => "Added",
            SubscriptionOutcome::Removed => "Removed",
        }
    }

    /// Whether the caller is subscribed after the toggle.
    pub fn is_subscribed(&self) -> bool {
        matches!(self, SubscriptionOutcome::Added)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToggleSubscriptionResponse {
    pub message: SubscriptionOutcome,
    pub subscribed: bool,
}

impl From<SubscriptionOutcome> for ToggleSubscriptionResponse {
    fn from(outcome: SubscriptionOutcome) -> Self {
        Self {
            message: outcome,
            subscribed: outcome.is_subscribed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let body = serde_json::to_value(ToggleSubscriptionResponse::from(
            SubscriptionOutcome::Added,
        ))
        .unwrap();
        assert_eq!(body["message"], "Added");
        assert_eq!(body["subscribed"], true);

        let body = serde_json::to_value(ToggleSubscriptionResponse::from(
            SubscriptionOutcome::Removed,
        ))
        .unwrap();
        assert_eq!(body["message"], "Removed");
        assert_eq!(body["subscribed"], false);
    }
}
