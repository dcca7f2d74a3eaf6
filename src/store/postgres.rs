use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use lectern_access::Scope;
use lectern_core::{AppError, PaginationParams};
use lectern_models::{
    Course, CourseId, CreateCourseDto, CreateLessonDto, CreatePaymentDto, Lesson, LessonId,
    MODERATOR_GROUP, Payment, PaymentFilterParams, PaymentOrdering, UpdateCourseDto,
    UpdateLessonDto, UpdateUserDto, User, UserCredentials, UserId,
};

use super::{
    CourseRepository, LessonRepository, NewUser, PaymentRepository, RoleDirectory,
    SubscriptionRepository, UserRepository,
};

const USER_COLUMNS: &str = "id, email, phone, city, created_at, updated_at";
const COURSE_COLUMNS: &str =
    "id, title, description, preview, price, owner_id, last_update, created_at, updated_at";
const LESSON_COLUMNS: &str =
    "id, title, description, preview, video_url, course_id, owner_id, created_at, updated_at";
const PAYMENT_COLUMNS: &str =
    "id, user_id, paid_course, paid_lesson, payment_amount, payment_method, date_of_payment";

/// PostgreSQL-backed store.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self, user), fields(db.operation = "INSERT", db.table = "users"))]
    async fn insert_user(&self, user: NewUser) -> Result<Option<User>, AppError> {
        let query = format!(
            "INSERT INTO users (email, password, phone, city)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO NOTHING
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone)
            .bind(&user.city)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, AppError> {
        let query = format!("SELECT {USER_COLUMNS}, password FROM users WHERE email = $1");
        let credentials = sqlx::query_as::<_, UserCredentials>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(credentials)
    }

    #[instrument(skip(self, dto), fields(db.operation = "UPDATE", db.table = "users"))]
    async fn update_user(&self, id: UserId, dto: &UpdateUserDto) -> Result<Option<User>, AppError> {
        let query = format!(
            "UPDATE users SET
                 email = COALESCE($2, email),
                 phone = COALESCE($3, phone),
                 city = COALESCE($4, city),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&dto.email)
            .bind(&dto.phone)
            .bind(&dto.city)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::bad_request(anyhow::anyhow!("Email already exists"));
                }
                AppError::from(e)
            })
    }

    #[instrument(skip(self), fields(db.operation = "DELETE", db.table = "users"))]
    async fn delete_user(&self, id: UserId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleDirectory for PgStore {
    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "user_groups"))]
    async fn is_moderator(&self, user_id: UserId) -> Result<bool, AppError> {
        let is_moderator = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM user_groups ug
                 JOIN groups g ON g.id = ug.group_id
                 WHERE ug.user_id = $1 AND g.name = $2
             )",
        )
        .bind(user_id)
        .bind(MODERATOR_GROUP)
        .fetch_one(&self.pool)
        .await?;

        Ok(is_moderator)
    }
}

#[async_trait]
impl CourseRepository for PgStore {
    #[instrument(skip(self, page), fields(db.operation = "SELECT", db.table = "courses"))]
    async fn list_courses(
        &self,
        scope: Scope,
        page: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError> {
        let owner = scope.owner_filter();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses WHERE ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE ($1::uuid IS NULL OR owner_id = $1)
             ORDER BY created_at, id
             LIMIT $2 OFFSET $3"
        );
        let courses = sqlx::query_as::<_, Course>(&query)
            .bind(owner)
            .bind(page.page_size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((courses, total))
    }

    async fn find_course(&self, id: CourseId, scope: Scope) -> Result<Option<Course>, AppError> {
        let query = format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2)"
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(scope.owner_filter())
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn course_exists(&self, id: CourseId) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM courses WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[instrument(skip(self, dto), fields(db.operation = "INSERT", db.table = "courses"))]
    async fn insert_course(&self, owner: UserId, dto: &CreateCourseDto) -> Result<Course, AppError> {
        let query = format!(
            "INSERT INTO courses (title, description, preview, price, owner_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COURSE_COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.preview)
            .bind(dto.price.unwrap_or(0))
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(course)
    }

    #[instrument(skip(self, dto), fields(db.operation = "UPDATE", db.table = "courses"))]
    async fn update_course(
        &self,
        id: CourseId,
        dto: &UpdateCourseDto,
    ) -> Result<Option<Course>, AppError> {
        let query = format!(
            "UPDATE courses SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 preview = COALESCE($4, preview),
                 price = COALESCE($5, price),
                 last_update = NOW(),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.preview)
            .bind(dto.price)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    #[instrument(skip(self), fields(db.operation = "DELETE", db.table = "courses"))]
    async fn delete_course(&self, id: CourseId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LessonRepository for PgStore {
    #[instrument(skip(self, page), fields(db.operation = "SELECT", db.table = "lessons"))]
    async fn list_lessons(
        &self,
        scope: Scope,
        page: &PaginationParams,
    ) -> Result<(Vec<Lesson>, i64), AppError> {
        let owner = scope.owner_filter();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lessons WHERE ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons
             WHERE ($1::uuid IS NULL OR owner_id = $1)
             ORDER BY created_at, id
             LIMIT $2 OFFSET $3"
        );
        let lessons = sqlx::query_as::<_, Lesson>(&query)
            .bind(owner)
            .bind(page.page_size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((lessons, total))
    }

    #[instrument(skip(self, course_ids), fields(db.operation = "SELECT", db.table = "lessons", courses = course_ids.len()))]
    async fn lessons_for_courses(&self, course_ids: &[CourseId]) -> Result<Vec<Lesson>, AppError> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = course_ids.iter().map(|id| id.into_inner()).collect();
        let query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons
             WHERE course_id = ANY($1)
             ORDER BY created_at, id"
        );
        let lessons = sqlx::query_as::<_, Lesson>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(lessons)
    }

    async fn find_lesson(&self, id: LessonId, scope: Scope) -> Result<Option<Lesson>, AppError> {
        let query = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons
             WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2)"
        );
        let lesson = sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .bind(scope.owner_filter())
            .fetch_optional(&self.pool)
            .await?;
        Ok(lesson)
    }

    #[instrument(skip(self, dto), fields(db.operation = "INSERT", db.table = "lessons"))]
    async fn insert_lesson(&self, owner: UserId, dto: &CreateLessonDto) -> Result<Lesson, AppError> {
        let query = format!(
            "INSERT INTO lessons (title, description, preview, video_url, course_id, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LESSON_COLUMNS}"
        );
        sqlx::query_as::<_, Lesson>(&query)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.preview)
            .bind(&dto.video_url)
            .bind(dto.course_id)
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::not_found(anyhow::anyhow!("Course not found"));
                }
                AppError::from(e)
            })
    }

    #[instrument(skip(self, dto), fields(db.operation = "UPDATE", db.table = "lessons"))]
    async fn update_lesson(
        &self,
        id: LessonId,
        dto: &UpdateLessonDto,
    ) -> Result<Option<Lesson>, AppError> {
        let query = format!(
            "UPDATE lessons SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 preview = COALESCE($4, preview),
                 video_url = COALESCE($5, video_url),
                 course_id = COALESCE($6, course_id),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {LESSON_COLUMNS}"
        );
        sqlx::query_as::<_, Lesson>(&query)
            .bind(id)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.preview)
            .bind(&dto.video_url)
            .bind(dto.course_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::not_found(anyhow::anyhow!("Course not found"));
                }
                AppError::from(e)
            })
    }

    #[instrument(skip(self), fields(db.operation = "DELETE", db.table = "lessons"))]
    async fn delete_lesson(&self, id: LessonId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SubscriptionRepository for PgStore {
    #[instrument(skip(self), fields(db.operation = "INSERT", db.table = "subscriptions"))]
    async fn insert_subscription(&self, user: UserId, course: CourseId) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (user_id, course_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(user)
        .bind(course)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                warn!(course.id = %course, "Course removed while subscribing");
                return AppError::not_found(anyhow::anyhow!("Course not found"));
            }
            AppError::from(e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(db.operation = "DELETE", db.table = "subscriptions"))]
    async fn delete_subscription(&self, user: UserId, course: CourseId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND course_id = $2")
            .bind(user)
            .bind(course)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, courses), fields(db.operation = "SELECT", db.table = "subscriptions"))]
    async fn subscribed_courses(
        &self,
        user: UserId,
        courses: &[CourseId],
    ) -> Result<HashSet<CourseId>, AppError> {
        if courses.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = courses.iter().map(|id| id.into_inner()).collect();
        let subscribed = sqlx::query_scalar::<_, CourseId>(
            "SELECT course_id FROM subscriptions WHERE user_id = $1 AND course_id = ANY($2)",
        )
        .bind(user)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscribed.into_iter().collect())
    }

    async fn subscriber_emails(&self, course: CourseId) -> Result<Vec<String>, AppError> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT u.email FROM subscriptions s
             JOIN users u ON u.id = s.user_id
             WHERE s.course_id = $1
             ORDER BY s.created_at",
        )
        .bind(course)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    #[instrument(skip(self, dto), fields(db.operation = "INSERT", db.table = "payments"))]
    async fn insert_payment(&self, user: UserId, dto: &CreatePaymentDto) -> Result<Payment, AppError> {
        let query = format!(
            "INSERT INTO payments (user_id, paid_course, paid_lesson, payment_amount, payment_method)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(user)
            .bind(dto.paid_course)
            .bind(dto.paid_lesson)
            .bind(dto.payment_amount)
            .bind(dto.payment_method)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    if violated_constraint(&e) == Some("payments_paid_lesson_fkey") {
                        return AppError::not_found(anyhow::anyhow!("Lesson not found"));
                    }
                    return AppError::not_found(anyhow::anyhow!("Course not found"));
                }
                AppError::from(e)
            })
    }

    #[instrument(skip(self, filter, page), fields(db.operation = "SELECT", db.table = "payments"))]
    async fn list_payments(
        &self,
        user: UserId,
        filter: &PaymentFilterParams,
        page: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        const FILTER: &str = "user_id = $1
             AND ($2::uuid IS NULL OR paid_course = $2)
             AND ($3::uuid IS NULL OR paid_lesson = $3)
             AND ($4::text IS NULL OR payment_method = $4)";

        let count_query = format!("SELECT COUNT(*) FROM payments WHERE {FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(user)
            .bind(filter.paid_course)
            .bind(filter.paid_lesson)
            .bind(filter.payment_method)
            .fetch_one(&self.pool)
            .await?;

        let direction = match filter.ordering() {
            PaymentOrdering::DateAsc => "ASC",
            PaymentOrdering::DateDesc => "DESC",
        };
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE {FILTER}
             ORDER BY date_of_payment {direction}, id {direction}
             LIMIT $5 OFFSET $6"
        );
        let payments = sqlx::query_as::<_, Payment>(&query)
            .bind(user)
            .bind(filter.paid_course)
            .bind(filter.paid_lesson)
            .bind(filter.payment_method)
            .bind(page.page_size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((payments, total))
    }
}
