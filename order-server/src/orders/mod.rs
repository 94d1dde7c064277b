//! Order Lifecycle
//!
//! Everything that mutates the Order aggregate lives here:
//!
//! - [`lifecycle`] - the single writer of order/payment status (checkout,
//!   transitions, deletion, delivery proof, QR verification)
//! - [`guest_code`] - one-way hashed guest order codes
//! - [`query`] - multi-predicate filter engine for the read surface

pub mod guest_code;
pub mod lifecycle;
pub mod query;

pub use query::{OrderFilter, Page};
