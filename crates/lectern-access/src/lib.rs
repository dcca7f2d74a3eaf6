//! # Lectern Access
//!
//! Authorization decisions for courses and lessons.
//!
//! - [`policy`]: The decision table mapping (actor, action, kind, resource) to
//!   [`Decision::Allow`] or [`Decision::Deny`]
//! - [`scope`]: Row-level narrowing for list and lookup queries
//!
//! Both modules are built on the same visibility predicate ([`policy::can_view`]):
//! moderators see everything, everyone else sees what they own. A resource that
//! direct retrieval would allow is exactly one that a scoped list returns.
//!
//! Nothing here performs I/O. The caller resolves moderator status for the
//! current request and passes it in through [`Actor`].
//!
//! # Example
//!
//! ```ignore
//! use lectern_access::{Action, Actor, ResourceKind, Scope, evaluate};
//!
//! let actor = Actor::new(user_id, is_moderator);
//! let scope = Scope::for_actor(&actor, ResourceKind::Course);
//! // ... load the course through `scope` ...
//! evaluate(Some(&actor), Action::Update, ResourceKind::Course, Some(&course))
//!     .ensure_allowed(Action::Update, ResourceKind::Course)?;
//! ```

pub mod policy;
pub mod scope;

pub use policy::{Action, Actor, Decision, Owned, ResourceKind, Rule, can_view, evaluate, rule_for};
pub use scope::Scope;
