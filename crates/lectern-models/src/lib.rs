//! # Lectern Models
//!
//! Domain models and DTOs for the Lectern API.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed entity identifiers
//! - [`courses`]: Course entity and request/response DTOs
//! - [`lessons`]: Lesson entity and request/response DTOs
//! - [`payments`]: Payment records, method and list filter
//! - [`subscriptions`]: Subscription relation and toggle DTOs
//! - [`users`]: User entity, registration, login and self-update DTOs
//!
//! Owner fields never appear in create DTOs: the server assigns the owner from
//! the authenticated actor, and unknown body fields are ignored.

pub mod courses;
pub mod ids;
pub mod lessons;
pub mod payments;
pub mod subscriptions;
pub mod users;

pub use courses::{Course, CourseResponse, CreateCourseDto, UpdateCourseDto};
pub use ids::{CourseId, LessonId, PaymentId, UserId};
pub use lessons::{CreateLessonDto, Lesson, UpdateLessonDto};
pub use payments::{
    CreatePaymentDto, Payment, PaymentFilterParams, PaymentMethod, PaymentOrdering,
    UnknownPaymentMethod,
};
pub use subscriptions::{
    Subscription, SubscriptionOutcome, ToggleSubscriptionDto, ToggleSubscriptionResponse,
};
pub use users::{
    LoginRequest, LoginResponse, MODERATOR_GROUP, ProfileResponse, RefreshTokenRequest,
    RegisterUserDto, TokenResponse, UpdateUserDto, User, UserCredentials,
};
