//! Unified error handling
//!
//! Provides a single error system shared by every service component:
//!
//! - [`ErrorCode`]: stable u16 error codes, grouped by range
//!   (0xxx general, 1xxx auth, 2xxx permission, 4xxx order,
//!   5xxx payment, 6xxx catalog, 9xxx system)
//! - [`ErrorCategory`]: coarse classification derived from the code range
//! - [`AppError`]: the application error type with message and details
//! - [`ApiResponse`]: the JSON envelope every endpoint returns
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, AppResult, ErrorCode};
//!
//! fn find_order(id: i64) -> AppResult<()> {
//!     Err(AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id))
//! }
//!
//! let err = find_order(42).unwrap_err();
//! assert_eq!(err.code, ErrorCode::OrderNotFound);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
