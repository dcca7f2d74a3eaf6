//! Course models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{CourseId, UserId};
use crate::lessons::Lesson;

/// A course. `owner_id` is set once, at creation, to the creating user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub preview: Option<String>,
    /// Price in minor currency units
    pub price: i64,
    pub owner_id: UserId,
    /// Last time the course content was updated through the API
    pub last_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 400))]
    pub preview: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 400))]
    pub preview: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
}

/// Course as returned by the API, with its lessons and the caller's
/// subscription state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    #[serde(flatten)]
    pub course: Course,
    pub lessons_count: i64,
    pub lessons: Vec<Lesson>,
    pub is_subscribed: bool,
}
