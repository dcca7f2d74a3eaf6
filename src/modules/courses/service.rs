use std::collections::HashMap;

use anyhow::anyhow;
use tracing::{debug, info, instrument};

use lectern_access::{Action, Actor, ResourceKind, Scope};
use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{Course, CourseId, CourseResponse, CreateCourseDto, Lesson, UpdateCourseDto};

use crate::metrics::{track_course_notification_dispatched, track_resource_created};
use crate::middleware::access::authorize;
use crate::notifications::dispatch_course_updated;
use crate::state::AppState;

pub struct CourseService;

impl CourseService {
    /// Looks a course up within the actor's scope. Courses outside it are
    /// reported as missing.
    async fn find_visible(state: &AppState, actor: &Actor, id: CourseId) -> Result<Course, AppError> {
        let scope = Scope::for_actor(actor, ResourceKind::Course);
        state
            .courses
            .find_course(id, scope)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    /// Builds responses for a batch of courses with one lesson query and one
    /// subscription query, whatever the batch size.
    async fn to_responses(
        state: &AppState,
        actor: &Actor,
        courses: Vec<Course>,
    ) -> Result<Vec<CourseResponse>, AppError> {
        let ids: Vec<CourseId> = courses.iter().map(|c| c.id).collect();
        let subscribed = state.subscriptions.subscribed_courses(actor.id, &ids).await?;

        let mut lessons_by_course: HashMap<CourseId, Vec<Lesson>> = HashMap::new();
        for lesson in state.lessons.lessons_for_courses(&ids).await? {
            lessons_by_course.entry(lesson.course_id).or_default().push(lesson);
        }

        Ok(courses
            .into_iter()
            .map(|course| {
                let lessons = lessons_by_course.remove(&course.id).unwrap_or_default();
                CourseResponse {
                    lessons_count: lessons.len() as i64,
                    lessons,
                    is_subscribed: subscribed.contains(&course.id),
                    course,
                }
            })
            .collect())
    }

    async fn to_response(
        state: &AppState,
        actor: &Actor,
        course: Course,
    ) -> Result<CourseResponse, AppError> {
        Self::to_responses(state, actor, vec![course])
            .await?
            .pop()
            .ok_or_else(|| AppError::internal_error("Course response missing".to_string()))
    }

    #[instrument(skip(state, params), fields(page = params.page(), page_size = params.page_size()))]
    pub async fn list_courses(
        state: &AppState,
        actor: Actor,
        params: PaginationParams,
    ) -> Result<Paginated<CourseResponse>, AppError> {
        authorize(&actor, Action::List, ResourceKind::Course, None)?;

        let scope = Scope::for_actor(&actor, ResourceKind::Course);
        let (courses, total) = state.courses.list_courses(scope, &params).await?;
        debug!(total, returned = courses.len(), "Listed courses");

        let data = Self::to_responses(state, &actor, courses).await?;

        Ok(Paginated::new(data, &params, total))
    }

    #[instrument(skip(state))]
    pub async fn get_course(
        state: &AppState,
        actor: Actor,
        id: CourseId,
    ) -> Result<CourseResponse, AppError> {
        let course = Self::find_visible(state, &actor, id).await?;
        authorize(&actor, Action::Retrieve, ResourceKind::Course, Some(&course))?;

        Self::to_response(state, &actor, course).await
    }

    #[instrument(skip(state, dto), fields(course.title = %dto.title))]
    pub async fn create_course(
        state: &AppState,
        actor: Actor,
        dto: CreateCourseDto,
    ) -> Result<CourseResponse, AppError> {
        authorize(&actor, Action::Create, ResourceKind::Course, None)?;

        let course = state.courses.insert_course(actor.id, &dto).await?;
        track_resource_created(ResourceKind::Course);
        info!(course.id = %course.id, owner.id = %actor.id, "Course created");

        Ok(CourseResponse {
            course,
            lessons_count: 0,
            lessons: Vec::new(),
            is_subscribed: false,
        })
    }

    /// Applies a partial update and notifies subscribers in the background.
    #[instrument(skip(state, dto))]
    pub async fn update_course(
        state: &AppState,
        actor: Actor,
        id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<CourseResponse, AppError> {
        let course = Self::find_visible(state, &actor, id).await?;
        authorize(&actor, Action::Update, ResourceKind::Course, Some(&course))?;

        let updated = state
            .courses
            .update_course(id, &dto)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))?;

        dispatch_course_updated(state.notifier.clone(), updated.clone());
        track_course_notification_dispatched();
        info!(course.id = %updated.id, "Course updated");

        Self::to_response(state, &actor, updated).await
    }

    #[instrument(skip(state))]
    pub async fn delete_course(state: &AppState, actor: Actor, id: CourseId) -> Result<(), AppError> {
        let course = Self::find_visible(state, &actor, id).await?;
        authorize(&actor, Action::Delete, ResourceKind::Course, Some(&course))?;

        if !state.courses.delete_course(id).await? {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }
        info!(course.id = %id, "Course deleted");

        Ok(())
    }
}
