//! Row-level query narrowing.
//!
//! A [`Scope`] is the predicate a list or lookup query runs under. Stores turn
//! it into SQL through [`Scope::owner_filter`] (`owner_id = $n` or nothing) or
//! apply it in memory through [`Scope::permits`].

use lectern_models::UserId;

use crate::policy::{Actor, Owned, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every row matches.
    All,
    /// Only rows owned by this user match.
    OwnedBy(UserId),
}

impl Scope {
    /// Moderators see every row of every kind, everyone else their own.
    pub fn for_actor(actor: &Actor, _kind: ResourceKind) -> Self {
        if actor.is_moderator {
            Scope::All
        } else {
            Scope::OwnedBy(actor.id)
        }
    }

    pub fn permits(&self, resource: &dyn Owned) -> bool {
        self.permits_owner(resource.owner_id())
    }

    pub fn permits_owner(&self, owner_id: UserId) -> bool {
        match self {
            Scope::All => true,
            Scope::OwnedBy(id) => *id == owner_id,
        }
    }

    /// Owner id to bind in SQL; `None` means no owner condition.
    pub fn owner_filter(&self) -> Option<UserId> {
        match self {
            Scope::All => None,
            Scope::OwnedBy(id) => Some(*id),
        }
    }
}
