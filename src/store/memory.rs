use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use lectern_access::Scope;
use lectern_core::{AppError, PaginationParams};
use lectern_models::{
    Course, CourseId, CreateCourseDto, CreateLessonDto, CreatePaymentDto, Lesson, LessonId,
    Payment, PaymentFilterParams, PaymentId, PaymentOrdering, Subscription, UpdateCourseDto,
    UpdateLessonDto, UpdateUserDto, User, UserCredentials, UserId,
};

use super::{
    CourseRepository, LessonRepository, NewUser, PaymentRepository, RoleDirectory,
    SubscriptionRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    moderators: HashSet<UserId>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    subscriptions: Vec<Subscription>,
    payments: Vec<Payment>,
}

impl Tables {
    /// Removes the lessons matching `doomed` and the payments made for them.
    fn remove_lessons(&mut self, doomed: impl Fn(&Lesson) -> bool) {
        let removed: HashSet<LessonId> = self
            .lessons
            .iter()
            .filter(|l| doomed(*l))
            .map(|l| l.id)
            .collect();
        self.lessons.retain(|l| !removed.contains(&l.id));
        self.payments
            .retain(|p| p.paid_lesson.is_none_or(|lesson| !removed.contains(&lesson)));
    }

    /// Removes the courses matching `doomed` with their lessons, subscriptions
    /// and payments.
    fn remove_courses(&mut self, doomed: impl Fn(&Course) -> bool) -> usize {
        let removed: HashSet<CourseId> = self
            .courses
            .iter()
            .filter(|c| doomed(*c))
            .map(|c| c.id)
            .collect();
        self.courses.retain(|c| !removed.contains(&c.id));
        self.remove_lessons(|l| removed.contains(&l.course_id));
        self.subscriptions.retain(|s| !removed.contains(&s.course_id));
        self.payments
            .retain(|p| p.paid_course.is_none_or(|course| !removed.contains(&course)));
        removed.len()
    }
}

/// In-process store with the same uniqueness and cascade rules as the
/// Postgres schema.
///
/// Each trait call takes the lock once and releases it before returning, so
/// concurrent callers interleave between calls exactly as they would between
/// SQL statements.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn page_of<T: Clone>(rows: impl Iterator<Item = T>, page: &PaginationParams) -> (Vec<T>, i64) {
    let rows: Vec<T> = rows.collect();
    let total = rows.len() as i64;
    let data = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.page_size() as usize)
        .collect();
    (data, total)
}

fn course_not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Course not found"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or removes the user from the moderator group.
    pub async fn set_moderator(&self, user_id: UserId, moderator: bool) {
        let mut tables = self.tables.write().await;
        if moderator {
            tables.moderators.insert(user_id);
        } else {
            tables.moderators.remove(&user_id);
        }
    }

    /// Number of stored rows for the pair. Never more than one.
    pub async fn subscription_rows(&self, user: UserId, course: CourseId) -> usize {
        self.tables
            .read()
            .await
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user && s.course_id == course)
            .count()
    }

    pub async fn subscription_count(&self) -> usize {
        self.tables.read().await.subscriptions.len()
    }

    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|c| c.user.email == new_user.email) {
            return Ok(None);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: new_user.email,
            phone: new_user.phone,
            city: new_user.city,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            password: new_user.password_hash,
        });

        Ok(Some(user))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|c| c.user.email == email).cloned())
    }

    async fn update_user(&self, id: UserId, dto: &UpdateUserDto) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &dto.email
            && tables
                .users
                .iter()
                .any(|c| c.user.email == *email && c.user.id != id)
        {
            return Err(AppError::bad_request(anyhow::anyhow!("Email already exists")));
        }

        let Some(credentials) = tables.users.iter_mut().find(|c| c.user.id == id) else {
            return Ok(None);
        };
        let user = &mut credentials.user;

        if let Some(email) = &dto.email {
            user.email = email.clone();
        }
        if let Some(phone) = &dto.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(city) = &dto.city {
            user.city = Some(city.clone());
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|c| c.user.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        tables.moderators.remove(&id);
        tables.remove_courses(|c| c.owner_id == id);
        tables.remove_lessons(|l| l.owner_id == id);
        tables.subscriptions.retain(|s| s.user_id != id);
        tables.payments.retain(|p| p.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl RoleDirectory for MemoryStore {
    async fn is_moderator(&self, user_id: UserId) -> Result<bool, AppError> {
        Ok(self.tables.read().await.moderators.contains(&user_id))
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn list_courses(
        &self,
        scope: Scope,
        page: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError> {
        let tables = self.tables.read().await;
        Ok(page_of(
            tables.courses.iter().filter(|c| scope.permits(*c)).cloned(),
            page,
        ))
    }

    async fn find_course(&self, id: CourseId, scope: Scope) -> Result<Option<Course>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .find(|c| c.id == id && scope.permits(*c))
            .cloned())
    }

    async fn course_exists(&self, id: CourseId) -> Result<bool, AppError> {
        Ok(self.tables.read().await.courses.iter().any(|c| c.id == id))
    }

    async fn insert_course(&self, owner: UserId, dto: &CreateCourseDto) -> Result<Course, AppError> {
        let now = Utc::now();
        let course = Course {
            id: CourseId::new(),
            title: dto.title.clone(),
            description: dto.description.clone(),
            preview: dto.preview.clone(),
            price: dto.price.unwrap_or(0),
            owner_id: owner,
            last_update: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        id: CourseId,
        dto: &UpdateCourseDto,
    ) -> Result<Option<Course>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(title) = &dto.title {
            course.title = title.clone();
        }
        if let Some(description) = &dto.description {
            course.description = Some(description.clone());
        }
        if let Some(preview) = &dto.preview {
            course.preview = Some(preview.clone());
        }
        if let Some(price) = dto.price {
            course.price = price;
        }
        let now = Utc::now();
        course.last_update = Some(now);
        course.updated_at = now;

        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: CourseId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.remove_courses(|c| c.id == id) > 0)
    }
}

#[async_trait]
impl LessonRepository for MemoryStore {
    async fn list_lessons(
        &self,
        scope: Scope,
        page: &PaginationParams,
    ) -> Result<(Vec<Lesson>, i64), AppError> {
        let tables = self.tables.read().await;
        Ok(page_of(
            tables.lessons.iter().filter(|l| scope.permits(*l)).cloned(),
            page,
        ))
    }

    async fn lessons_for_courses(&self, course_ids: &[CourseId]) -> Result<Vec<Lesson>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .lessons
            .iter()
            .filter(|l| course_ids.contains(&l.course_id))
            .cloned()
            .collect())
    }

    async fn find_lesson(&self, id: LessonId, scope: Scope) -> Result<Option<Lesson>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .lessons
            .iter()
            .find(|l| l.id == id && scope.permits(*l))
            .cloned())
    }

    async fn insert_lesson(&self, owner: UserId, dto: &CreateLessonDto) -> Result<Lesson, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.iter().any(|c| c.id == dto.course_id) {
            return Err(course_not_found());
        }

        let now = Utc::now();
        let lesson = Lesson {
            id: LessonId::new(),
            title: dto.title.clone(),
            description: dto.description.clone(),
            preview: dto.preview.clone(),
            video_url: dto.video_url.clone(),
            course_id: dto.course_id,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        };
        tables.lessons.push(lesson.clone());
        Ok(lesson)
    }

    async fn update_lesson(
        &self,
        id: LessonId,
        dto: &UpdateLessonDto,
    ) -> Result<Option<Lesson>, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(course_id) = dto.course_id
            && !tables.courses.iter().any(|c| c.id == course_id)
        {
            return Err(course_not_found());
        }

        let Some(lesson) = tables.lessons.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };

        if let Some(title) = &dto.title {
            lesson.title = title.clone();
        }
        if let Some(description) = &dto.description {
            lesson.description = Some(description.clone());
        }
        if let Some(preview) = &dto.preview {
            lesson.preview = Some(preview.clone());
        }
        if let Some(video_url) = &dto.video_url {
            lesson.video_url = Some(video_url.clone());
        }
        if let Some(course_id) = dto.course_id {
            lesson.course_id = course_id;
        }
        lesson.updated_at = Utc::now();

        Ok(Some(lesson.clone()))
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.lessons.len();
        tables.remove_lessons(|l| l.id == id);
        Ok(tables.lessons.len() < before)
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn insert_subscription(&self, user: UserId, course: CourseId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.iter().any(|c| c.id == course) {
            return Err(course_not_found());
        }
        if tables
            .subscriptions
            .iter()
            .any(|s| s.user_id == user && s.course_id == course)
        {
            return Ok(false);
        }

        tables.subscriptions.push(Subscription {
            user_id: user,
            course_id: course,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_subscription(&self, user: UserId, course: CourseId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.subscriptions.len();
        tables
            .subscriptions
            .retain(|s| !(s.user_id == user && s.course_id == course));
        Ok(tables.subscriptions.len() < before)
    }

    async fn subscribed_courses(
        &self,
        user: UserId,
        courses: &[CourseId],
    ) -> Result<HashSet<CourseId>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user && courses.contains(&s.course_id))
            .map(|s| s.course_id)
            .collect())
    }

    async fn subscriber_emails(&self, course: CourseId) -> Result<Vec<String>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.course_id == course)
            .filter_map(|s| {
                tables
                    .users
                    .iter()
                    .find(|c| c.user.id == s.user_id)
                    .map(|c| c.user.email.clone())
            })
            .collect())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert_payment(&self, user: UserId, dto: &CreatePaymentDto) -> Result<Payment, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(course) = dto.paid_course
            && !tables.courses.iter().any(|c| c.id == course)
        {
            return Err(course_not_found());
        }
        if let Some(lesson) = dto.paid_lesson
            && !tables.lessons.iter().any(|l| l.id == lesson)
        {
            return Err(AppError::not_found(anyhow::anyhow!("Lesson not found")));
        }

        let payment = Payment {
            id: PaymentId::new(),
            user_id: user,
            paid_course: dto.paid_course,
            paid_lesson: dto.paid_lesson,
            payment_amount: dto.payment_amount,
            payment_method: dto.payment_method,
            date_of_payment: Utc::now(),
        };
        tables.payments.push(payment.clone());
        Ok(payment)
    }

    async fn list_payments(
        &self,
        user: UserId,
        filter: &PaymentFilterParams,
        page: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Payment> = tables
            .payments
            .iter()
            .filter(|p| p.user_id == user && filter.matches(p))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps.
        rows.sort_by_key(|p| p.date_of_payment);
        if filter.ordering() == PaymentOrdering::DateDesc {
            rows.reverse();
        }

        Ok(page_of(rows.into_iter(), page))
    }
}
