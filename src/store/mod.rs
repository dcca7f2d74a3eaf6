//! Persistence interfaces.
//!
//! Services talk to storage only through the traits in this module. Two
//! implementations exist:
//!
//! - [`PgStore`]: SQLx queries against PostgreSQL
//! - [`MemoryStore`]: process-local maps, used by tests and `--in-memory` mode
//!
//! Both implement every trait, so either can back an [`AppState`](crate::state::AppState).
//!
//! Lookups that take a [`Scope`] only return rows the scope permits. A row
//! outside the scope is indistinguishable from a missing one.

pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;

use lectern_access::Scope;
use lectern_core::{AppError, PaginationParams};
use lectern_models::{
    Course, CourseId, CreateCourseDto, CreateLessonDto, CreatePaymentDto, Lesson, LessonId,
    Payment, PaymentFilterParams, UpdateCourseDto, UpdateLessonDto, UpdateUserDto, User,
    UserCredentials, UserId,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Registration input after the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub city: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns `None` when the email is already taken.
    async fn insert_user(&self, user: NewUser) -> Result<Option<User>, AppError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, AppError>;

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, AppError>;

    /// Applies the present fields. Fails with 400 when the new email belongs
    /// to another user.
    async fn update_user(&self, id: UserId, dto: &UpdateUserDto) -> Result<Option<User>, AppError>;

    /// Removes the user together with everything they own, their
    /// subscriptions and their payments.
    async fn delete_user(&self, id: UserId) -> Result<bool, AppError>;
}

/// Role-membership lookup.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn is_moderator(&self, user_id: UserId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// One page of courses within `scope`, plus the scoped total.
    async fn list_courses(
        &self,
        scope: Scope,
        page: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError>;

    async fn find_course(&self, id: CourseId, scope: Scope) -> Result<Option<Course>, AppError>;

    async fn course_exists(&self, id: CourseId) -> Result<bool, AppError>;

    async fn insert_course(&self, owner: UserId, dto: &CreateCourseDto) -> Result<Course, AppError>;

    /// Applies the present fields and stamps `last_update`.
    async fn update_course(
        &self,
        id: CourseId,
        dto: &UpdateCourseDto,
    ) -> Result<Option<Course>, AppError>;

    async fn delete_course(&self, id: CourseId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn list_lessons(
        &self,
        scope: Scope,
        page: &PaginationParams,
    ) -> Result<(Vec<Lesson>, i64), AppError>;

    /// Every lesson of the given courses in one round trip, oldest first.
    async fn lessons_for_courses(&self, course_ids: &[CourseId]) -> Result<Vec<Lesson>, AppError>;

    async fn find_lesson(&self, id: LessonId, scope: Scope) -> Result<Option<Lesson>, AppError>;

    async fn insert_lesson(&self, owner: UserId, dto: &CreateLessonDto) -> Result<Lesson, AppError>;

    async fn update_lesson(
        &self,
        id: LessonId,
        dto: &UpdateLessonDto,
    ) -> Result<Option<Lesson>, AppError>;

    async fn delete_lesson(&self, id: LessonId) -> Result<bool, AppError>;
}

/// Storage for the `(user, course)` subscription relation.
///
/// Implementations guarantee at most one row per pair. The insert and delete
/// primitives report whether they changed anything so a caller can detect a
/// lost race without reading first.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts the row unless it already exists. Returns `true` when a row was
    /// written. Fails with 404 if the course no longer exists.
    async fn insert_subscription(&self, user: UserId, course: CourseId) -> Result<bool, AppError>;

    /// Returns `true` when a row was removed.
    async fn delete_subscription(&self, user: UserId, course: CourseId) -> Result<bool, AppError>;

    /// The subset of `courses` the user is subscribed to.
    async fn subscribed_courses(
        &self,
        user: UserId,
        courses: &[CourseId],
    ) -> Result<HashSet<CourseId>, AppError>;

    async fn subscriber_emails(&self, course: CourseId) -> Result<Vec<String>, AppError>;
}

/// Payment history. Every read is confined to one payer.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Records a payment for `user`. Fails with 404 if the referenced course
    /// or lesson no longer exists.
    async fn insert_payment(&self, user: UserId, dto: &CreatePaymentDto) -> Result<Payment, AppError>;

    /// One page of the user's payments matching `filter`, plus the filtered total.
    async fn list_payments(
        &self,
        user: UserId,
        filter: &PaymentFilterParams,
        page: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError>;
}
