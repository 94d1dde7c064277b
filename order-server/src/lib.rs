//! Order Server - order and payment orchestration service
//!
//! # Architecture overview
//!
//! The service owns the Order aggregate end to end: checkout (inventory
//! reservation + discount pricing), the order status state machine,
//! payment provider adapters, guest order codes and the filtered read
//! surface.
//!
//! # Module structure
//!
//! ```text
//! order-server/src/
//! ├── core/          # Config, state, server, background tasks
//! ├── auth/          # Requester identity from gateway headers
//! ├── db/            # Pool setup, models, repositories
//! ├── orders/        # Lifecycle manager, guest codes, filter engine
//! ├── pricing/       # Discount resolution + expiry sweep
//! ├── payments/      # Gateway trait, card/momo adapters, service
//! ├── notify/        # Fire-and-forget notification collaborator
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Logger, money helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod utils;

// Re-export public types
pub use core::{Config, Server, AppState};
pub use orders::{OrderFilter, Page};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
