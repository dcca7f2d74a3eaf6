//! # Lectern Auth
//!
//! Authentication types and JWT utilities for the Lectern API.
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification
//!
//! Tokens identify a user and nothing else. Whether the user is a moderator is
//! looked up from group membership on every request, so a role change takes
//! effect immediately instead of when the token expires.
//!
//! # Example
//!
//! ```ignore
//! use lectern_auth::{create_access_token, verify_token};
//! use lectern_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "user@example.com", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims, TokenKind};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
