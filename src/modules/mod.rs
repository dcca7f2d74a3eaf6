//! Feature modules. Each has a `controller` (HTTP handlers), a `service`
//! (business logic) and a `router`.

pub mod courses;
pub mod lessons;
pub mod payments;
pub mod subscriptions;
pub mod users;
