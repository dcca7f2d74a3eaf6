//! # Lectern Core
//!
//! Core types, errors, and utilities for the Lectern API.
//!
//! This crate provides foundational types used throughout the Lectern application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination utilities for list endpoints
//! - [`password`]: Password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use lectern_core::errors::AppError;
//! use lectern_core::pagination::PaginationParams;
//! use lectern_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//!
//! let hash = hash_password("secure_password")?;
//!
//! let params = PaginationParams::default();
//! let offset = params.offset();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
