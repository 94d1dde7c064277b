//! Shared types for the order service
//!
//! - **error**: unified error codes, [`error::AppError`] and the
//!   [`error::ApiResponse`] envelope used by every HTTP handler
//! - **util**: id and time helpers (snowflake ids, millisecond timestamps)

pub mod error;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
