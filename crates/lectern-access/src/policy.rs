//! Access policy for courses and lessons.
//!
//! The policy is an explicit table from `(action, kind)` to a [`Rule`]:
//!
//! | action          | Course                | Lesson                  |
//! |-----------------|-----------------------|-------------------------|
//! | list, retrieve  | moderator or owner    | moderator or owner      |
//! | create          | not moderator         | not moderator, or owner |
//! | update          | moderator or owner    | moderator or owner      |
//! | delete          | not moderator, or owner | not moderator, or owner |
//!
//! Every rule additionally requires an authenticated actor. "Owner" only holds
//! when a concrete resource is supplied; on create there is none, so the
//! owner clause is false and only the role clause decides.
//!
//! Moderators supervise content (read and update anything) but cannot author
//! new courses or lessons, and cannot delete what they do not own.

use serde::Serialize;

use lectern_core::AppError;
use lectern_models::{Course, Lesson, UserId};

/// The authenticated caller for one request.
///
/// `is_moderator` is resolved from group membership when the request arrives
/// and must not outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub is_moderator: bool,
}

impl Actor {
    pub fn new(id: UserId, is_moderator: bool) -> Self {
        Self { id, is_moderator }
    }

    pub fn owns(&self, resource: &dyn Owned) -> bool {
        resource.owner_id() == self.id
    }
}

/// A resource with exactly one owner, fixed at creation.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for Course {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Owned for Lesson {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Course,
    Lesson,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Course, ResourceKind::Lesson];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Course => "course",
            ResourceKind::Lesson => "lesson",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }

    /// Converts a deny into a 403 naming what was refused.
    pub fn ensure_allowed(self, action: Action, kind: ResourceKind) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AppError::forbidden(format!(
                "You do not have permission to {} this {}",
                action.as_str(),
                kind.as_str()
            ))),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Role/ownership clause applied after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `is_moderator || owns`
    ModeratorOrOwner,
    /// `!is_moderator`
    NotModerator,
    /// `!is_moderator || owns`
    NotModeratorOrOwner,
}

impl Rule {
    fn holds(&self, actor: &Actor, resource: Option<&dyn Owned>) -> bool {
        let owns = resource.is_some_and(|r| actor.owns(r));
        match self {
            Rule::ModeratorOrOwner => actor.is_moderator || owns,
            Rule::NotModerator => !actor.is_moderator,
            Rule::NotModeratorOrOwner => !actor.is_moderator || owns,
        }
    }
}

/// The decision table.
pub fn rule_for(action: Action, kind: ResourceKind) -> Rule {
    match (action, kind) {
        (Action::List | Action::Retrieve, _) => Rule::ModeratorOrOwner,
        (Action::Create, ResourceKind::Course) => Rule::NotModerator,
        (Action::Create, ResourceKind::Lesson) => Rule::NotModeratorOrOwner,
        (Action::Update, _) => Rule::ModeratorOrOwner,
        (Action::Delete, _) => Rule::NotModeratorOrOwner,
    }
}

/// Visibility predicate shared by [`evaluate`] and [`crate::Scope`].
pub fn can_view(actor: &Actor, resource: &dyn Owned) -> bool {
    Rule::ModeratorOrOwner.holds(actor, Some(resource))
}

/// Decides whether `actor` may perform `action` on a resource of `kind`.
///
/// `actor` is `None` for unauthenticated callers, which are always denied.
///
/// A `List` without a resource is the collection-level check and passes for
/// any authenticated actor; the rows themselves are narrowed by
/// [`crate::Scope`], which applies the list rule to each one. With a resource
/// it is the per-row check and agrees with [`can_view`].
pub fn evaluate(
    actor: Option<&Actor>,
    action: Action,
    kind: ResourceKind,
    resource: Option<&dyn Owned>,
) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };

    if action == Action::List && resource.is_none() {
        return Decision::Allow;
    }

    rule_for(action, kind).holds(actor, resource).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lectern_models::{CourseId, LessonId};

    struct Resource(UserId);

    impl Owned for Resource {
        fn owner_id(&self) -> UserId {
            self.0
        }
    }

    fn course_owned_by(owner: UserId) -> Course {
        Course {
            id: CourseId::new(),
            title: "Course".to_string(),
            description: None,
            preview: None,
            price: 0,
            owner_id: owner,
            last_update: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lesson_owned_by(owner: UserId) -> Lesson {
        Lesson {
            id: LessonId::new(),
            title: "Lesson".to_string(),
            description: None,
            preview: None,
            video_url: None,
            course_id: CourseId::new(),
            owner_id: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn allowed(actor: &Actor, action: Action, kind: ResourceKind, owner: Option<UserId>) -> bool {
        let resource = owner.map(Resource);
        evaluate(
            Some(actor),
            action,
            kind,
            resource.as_ref().map(|r| r as &dyn Owned),
        )
        .is_allowed()
    }

    #[test]
    fn test_unauthenticated_always_denied() {
        let owner = UserId::new();
        let resource = Resource(owner);
        for kind in ResourceKind::ALL {
            for action in Action::ALL {
                assert_eq!(evaluate(None, action, kind, None), Decision::Deny);
                assert_eq!(evaluate(None, action, kind, Some(&resource)), Decision::Deny);
            }
        }
    }

    /// Full table: (action, moderator?, owns?) -> expected, identical for both kinds
    /// except lesson create.
    #[test]
    fn test_decision_table_with_resource() {
        let cases = [
            (Action::List, false, false, false),
            (Action::List, false, true, true),
            (Action::List, true, false, true),
            (Action::List, true, true, true),
            (Action::Retrieve, false, false, false),
            (Action::Retrieve, false, true, true),
            (Action::Retrieve, true, false, true),
            (Action::Retrieve, true, true, true),
            (Action::Update, false, false, false),
            (Action::Update, false, true, true),
            (Action::Update, true, false, true),
            (Action::Update, true, true, true),
            (Action::Delete, false, false, true),
            (Action::Delete, false, true, true),
            (Action::Delete, true, false, false),
            (Action::Delete, true, true, true),
        ];

        for kind in ResourceKind::ALL {
            for (action, moderator, owns, expected) in cases {
                let actor = Actor::new(UserId::new(), moderator);
                let owner = if owns { actor.id } else { UserId::new() };
                assert_eq!(
                    allowed(&actor, action, kind, Some(owner)),
                    expected,
                    "{:?} {:?} moderator={} owns={}",
                    kind,
                    action,
                    moderator,
                    owns
                );
            }
        }
    }

    #[test]
    fn test_create_without_resource() {
        let member = Actor::new(UserId::new(), false);
        let moderator = Actor::new(UserId::new(), true);

        for kind in ResourceKind::ALL {
            assert!(allowed(&member, Action::Create, kind, None));
            assert!(!allowed(&moderator, Action::Create, kind, None));
        }
    }

    #[test]
    fn test_lesson_create_owner_clause() {
        let moderator = Actor::new(UserId::new(), true);
        assert!(allowed(&moderator, Action::Create, ResourceKind::Lesson, Some(moderator.id)));
        assert!(!allowed(&moderator, Action::Create, ResourceKind::Course, Some(moderator.id)));
    }

    #[test]
    fn test_collection_list_allows_any_authenticated_actor() {
        for moderator in [false, true] {
            let actor = Actor::new(UserId::new(), moderator);
            for kind in ResourceKind::ALL {
                assert!(allowed(&actor, Action::List, kind, None));
            }
        }
    }

    #[test]
    fn test_moderator_cannot_delete_or_create_foreign_resources() {
        let moderator = Actor::new(UserId::new(), true);
        let course = course_owned_by(UserId::new());
        let lesson = lesson_owned_by(UserId::new());

        assert_eq!(
            evaluate(Some(&moderator), Action::Delete, ResourceKind::Course, Some(&course)),
            Decision::Deny
        );
        assert_eq!(
            evaluate(Some(&moderator), Action::Delete, ResourceKind::Lesson, Some(&lesson)),
            Decision::Deny
        );
        assert_eq!(
            evaluate(Some(&moderator), Action::Update, ResourceKind::Course, Some(&course)),
            Decision::Allow
        );
        assert_eq!(
            evaluate(Some(&moderator), Action::Retrieve, ResourceKind::Lesson, Some(&lesson)),
            Decision::Allow
        );
    }

    #[test]
    fn test_member_cannot_touch_foreign_resources() {
        let member = Actor::new(UserId::new(), false);
        let course = course_owned_by(UserId::new());

        for action in [Action::Retrieve, Action::Update] {
            assert_eq!(
                evaluate(Some(&member), action, ResourceKind::Course, Some(&course)),
                Decision::Deny
            );
        }
    }

    #[test]
    fn test_can_view_matches_retrieve() {
        let owner = UserId::new();
        let course = course_owned_by(owner);
        for actor in [
            Actor::new(owner, false),
            Actor::new(owner, true),
            Actor::new(UserId::new(), false),
            Actor::new(UserId::new(), true),
        ] {
            assert_eq!(
                can_view(&actor, &course),
                evaluate(Some(&actor), Action::Retrieve, ResourceKind::Course, Some(&course))
                    .is_allowed()
            );
        }
    }

    #[test]
    fn test_ensure_allowed() {
        assert!(
            Decision::Allow
                .ensure_allowed(Action::Delete, ResourceKind::Course)
                .is_ok()
        );

        let err = Decision::Deny
            .ensure_allowed(Action::Delete, ResourceKind::Lesson)
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(
            err.error.to_string(),
            "You do not have permission to delete this lesson"
        );
    }
}
