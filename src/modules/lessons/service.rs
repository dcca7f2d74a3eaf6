use anyhow::anyhow;
use tracing::{debug, info, instrument};

use lectern_access::{Action, Actor, ResourceKind, Scope};
use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{CreateLessonDto, Lesson, LessonId, UpdateLessonDto};

use crate::metrics::track_resource_created;
use crate::middleware::access::authorize;
use crate::state::AppState;

fn lesson_not_found() -> AppError {
    AppError::not_found(anyhow!("Lesson not found"))
}

pub struct LessonService;

impl LessonService {
    async fn find_visible(state: &AppState, actor: &Actor, id: LessonId) -> Result<Lesson, AppError> {
        let scope = Scope::for_actor(actor, ResourceKind::Lesson);
        state
            .lessons
            .find_lesson(id, scope)
            .await?
            .ok_or_else(lesson_not_found)
    }

    #[instrument(skip(state, params), fields(page = params.page(), page_size = params.page_size()))]
    pub async fn list_lessons(
        state: &AppState,
        actor: Actor,
        params: PaginationParams,
    ) -> Result<Paginated<Lesson>, AppError> {
        authorize(&actor, Action::List, ResourceKind::Lesson, None)?;

        let scope = Scope::for_actor(&actor, ResourceKind::Lesson);
        let (lessons, total) = state.lessons.list_lessons(scope, &params).await?;
        debug!(total, returned = lessons.len(), "Listed lessons");

        Ok(Paginated::new(lessons, &params, total))
    }

    #[instrument(skip(state))]
    pub async fn get_lesson(state: &AppState, actor: Actor, id: LessonId) -> Result<Lesson, AppError> {
        let lesson = Self::find_visible(state, &actor, id).await?;
        authorize(&actor, Action::Retrieve, ResourceKind::Lesson, Some(&lesson))?;
        Ok(lesson)
    }

    /// Creates a lesson owned by the actor in an existing course.
    #[instrument(skip(state, dto), fields(course.id = %dto.course_id))]
    pub async fn create_lesson(
        state: &AppState,
        actor: Actor,
        dto: CreateLessonDto,
    ) -> Result<Lesson, AppError> {
        authorize(&actor, Action::Create, ResourceKind::Lesson, None)?;

        if !state.courses.course_exists(dto.course_id).await? {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }

        let lesson = state.lessons.insert_lesson(actor.id, &dto).await?;
        track_resource_created(ResourceKind::Lesson);
        info!(lesson.id = %lesson.id, owner.id = %actor.id, "Lesson created");

        Ok(lesson)
    }

    /// Partial update. Moving the lesson requires the target course to be
    /// visible to the actor.
    #[instrument(skip(state, dto))]
    pub async fn update_lesson(
        state: &AppState,
        actor: Actor,
        id: LessonId,
        dto: UpdateLessonDto,
    ) -> Result<Lesson, AppError> {
        let lesson = Self::find_visible(state, &actor, id).await?;
        authorize(&actor, Action::Update, ResourceKind::Lesson, Some(&lesson))?;

        if let Some(target) = dto.course_id
            && target != lesson.course_id
        {
            let course_scope = Scope::for_actor(&actor, ResourceKind::Course);
            if state.courses.find_course(target, course_scope).await?.is_none() {
                return Err(AppError::not_found(anyhow!("Course not found")));
            }
        }

        let updated = state
            .lessons
            .update_lesson(id, &dto)
            .await?
            .ok_or_else(lesson_not_found)?;
        info!(lesson.id = %updated.id, "Lesson updated");

        Ok(updated)
    }

    #[instrument(skip(state))]
    pub async fn delete_lesson(state: &AppState, actor: Actor, id: LessonId) -> Result<(), AppError> {
        let lesson = Self::find_visible(state, &actor, id).await?;
        authorize(&actor, Action::Delete, ResourceKind::Lesson, Some(&lesson))?;

        if !state.lessons.delete_lesson(id).await? {
            return Err(lesson_not_found());
        }
        info!(lesson.id = %id, "Lesson deleted");

        Ok(())
    }
}
