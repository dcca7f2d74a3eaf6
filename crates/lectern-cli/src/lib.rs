//! # Lectern CLI
//!
//! Account administration for Lectern deployments.
//!
//! Moderators cannot sign up through the API, so this crate is how the
//! `Moderator` group gets its members.
//!
//! ## Usage
//!
//! ```ignore
//! use lectern_cli::accounts;
//!
//! let user_id = accounts::create_user(&pool, "mod@lectern.dev", "secret-pass", true).await?;
//! accounts::set_moderator(&pool, "someone@lectern.dev", false).await?;
//! ```

pub mod accounts;
