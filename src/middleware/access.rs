use tracing::debug;

use lectern_access::{Action, Actor, Owned, ResourceKind, evaluate};
use lectern_core::AppError;

use crate::metrics::track_access_decision;

/// Runs the policy for an authenticated actor and turns a deny into a 403.
pub fn authorize(
    actor: &Actor,
    action: Action,
    kind: ResourceKind,
    resource: Option<&dyn Owned>,
) -> Result<(), AppError> {
    let decision = evaluate(Some(actor), action, kind, resource);

    debug!(
        actor.id = %actor.id,
        actor.moderator = actor.is_moderator,
        action = action.as_str(),
        kind = kind.as_str(),
        decision = decision.as_str(),
        "Access decision"
    );
    track_access_decision(kind, action, decision);

    decision.ensure_allowed(action, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_models::UserId;

    struct Resource(UserId);

    impl Owned for Resource {
        fn owner_id(&self) -> UserId {
            self.0
        }
    }

    #[test]
    fn test_deny_maps_to_forbidden() {
        let moderator = Actor::new(UserId::new(), true);
        let err = authorize(&moderator, Action::Create, ResourceKind::Course, None).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
    }

    #[test]
    fn test_owner_passes() {
        let actor = Actor::new(UserId::new(), false);
        let resource = Resource(actor.id);
        assert!(authorize(&actor, Action::Update, ResourceKind::Lesson, Some(&resource)).is_ok());
    }
}
