use anyhow::anyhow;
use tracing::{debug, info, instrument};

use lectern_core::AppError;
use lectern_models::{CourseId, SubscriptionOutcome, UserId};

use crate::metrics::{track_subscription_retry, track_subscription_toggle};
use crate::store::{CourseRepository, SubscriptionRepository};

pub struct SubscriptionService;

impl SubscriptionService {
    /// Flips the `(user, course)` subscription and reports the new state.
    ///
    /// Tries to delete the row, then to insert it. An insert that loses to a
    /// concurrent insert (unique `(user_id, course_id)`) goes back to the
    /// delete. Each call ends after exactly one successful mutation, so N
    /// calls from no row leave a row iff N is odd.
    #[instrument(skip(courses, subscriptions))]
    pub async fn toggle(
        courses: &dyn CourseRepository,
        subscriptions: &dyn SubscriptionRepository,
        user: UserId,
        course: CourseId,
    ) -> Result<SubscriptionOutcome, AppError> {
        if !courses.course_exists(course).await? {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }

        let outcome = loop {
            if subscriptions.delete_subscription(user, course).await? {
                break SubscriptionOutcome::Removed;
            }
            if subscriptions.insert_subscription(user, course).await? {
                break SubscriptionOutcome::Added;
            }
            debug!("Subscription inserted concurrently, retrying as removal");
            track_subscription_retry();
        };

        track_subscription_toggle(outcome);
        info!(outcome = outcome.as_str(), "Subscription toggled");

        Ok(outcome)
    }
}
