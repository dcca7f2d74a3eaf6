use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use lectern_core::{PaginationMeta, PaginationParams};
use lectern_models::{
    Course, CourseResponse, CreateCourseDto, CreateLessonDto, CreatePaymentDto, Lesson,
    LoginRequest, LoginResponse, Payment, PaymentMethod, PaymentOrdering, ProfileResponse,
    RefreshTokenRequest, RegisterUserDto, SubscriptionOutcome, ToggleSubscriptionDto,
    ToggleSubscriptionResponse, TokenResponse, UpdateCourseDto, UpdateLessonDto, UpdateUserDto,
    User,
};

use crate::modules::users::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::users::controller::register_user,
        crate::modules::users::controller::login_user,
        crate::modules::users::controller::refresh_token,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::payments::controller::list_payments,
        crate::modules::payments::controller::create_payment,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::lessons::controller::list_lessons,
        crate::modules::lessons::controller::get_lesson,
        crate::modules::lessons::controller::create_lesson,
        crate::modules::lessons::controller::update_lesson,
        crate::modules::lessons::controller::delete_lesson,
        crate::modules::subscriptions::controller::toggle_subscription,
    ),
    components(
        schemas(
            User,
            RegisterUserDto,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            TokenResponse,
            ProfileResponse,
            UpdateUserDto,
            Payment,
            PaymentMethod,
            PaymentOrdering,
            CreatePaymentDto,
            Course,
            CourseResponse,
            CreateCourseDto,
            UpdateCourseDto,
            Lesson,
            CreateLessonDto,
            UpdateLessonDto,
            ToggleSubscriptionDto,
            ToggleSubscriptionResponse,
            SubscriptionOutcome,
            PaginationMeta,
            PaginationParams,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Registration, login, profile and own account"),
        (name = "Payments", description = "Payment history of the caller"),
        (name = "Courses", description = "Courses and their lessons"),
        (name = "Lessons", description = "Lesson management"),
        (name = "Subscriptions", description = "Course update subscriptions")
    ),
    info(
        title = "Lectern API",
        version = "0.1.0",
        description = "Courses, lessons, subscriptions and payments with owner/moderator access control.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/users/login/",
            "/course/",
            "/course/{id}/",
            "/lessons/",
            "/lessons/create/",
            "/lessons/{id}/update/",
            "/subscription/create/",
            "/users/user/",
            "/users/user/{id}/",
            "/users/payments/",
            "/users/payment/create/",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
