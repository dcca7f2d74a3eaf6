//! # Lectern Config
//!
//! Configuration types for the Lectern API.
//!
//! Every structure here is loaded from environment variables:
//!
//! - [`jwt`]: JWT authentication configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`email`]: SMTP configuration for course-update mail
//! - [`server`]: Listen address and database pool sizing
//!
//! # Example
//!
//! ```ignore
//! use lectern_config::{CorsConfig, EmailConfig, JwtConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let email_config = EmailConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod email;
pub mod jwt;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
