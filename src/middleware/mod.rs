//! Request extractors and access checks.
//!
//! - [`auth`]: `AuthUser` (verified JWT claims) and `CurrentActor` (claims plus
//!   a fresh moderator lookup)
//! - [`access`]: `authorize`, the single entry point handlers use to consult
//!   the access policy
//!
//! # Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `CurrentActor` verifies the token (401 on failure) and resolves the
//!    actor's moderator status from group membership
//! 3. The service looks the object up within the actor's scope (404 when
//!    outside it) and calls `authorize` (403 on deny)

pub mod access;
pub mod auth;
