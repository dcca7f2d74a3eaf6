//! Lesson models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, LessonId, UserId};

const ALLOWED_VIDEO_HOSTS: &[&str] = &["youtube.com", "m.youtube.com", "youtu.be"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub video_url: Option<String>,
    pub course_id: CourseId,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLessonDto {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 400))]
    pub preview: Option<String>,
    #[validate(custom(function = "validate_video_url"))]
    pub video_url: Option<String>,
    pub course_id: CourseId,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLessonDto {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 400))]
    pub preview: Option<String>,
    #[validate(custom(function = "validate_video_url"))]
    pub video_url: Option<String>,
    pub course_id: Option<CourseId>,
}

/// Only YouTube links are accepted as lesson videos.
pub fn validate_video_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(invalid_video_url)?;

    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if ALLOWED_VIDEO_HOSTS.contains(&host) {
        Ok(())
    } else {
        Err(invalid_video_url())
    }
}

fn invalid_video_url() -> ValidationError {
    let mut error = ValidationError::new("video_url");
    error.message = Some("Only youtube.com video links are allowed".into());
    error
}
