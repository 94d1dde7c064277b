//! Payment Orchestration
//!
//! - [`gateway`] - the uniform provider interface and error type
//! - [`card`] - synchronous card processor (terminal status on charge)
//! - [`momo`] - asynchronous mobile money (request-to-pay + status poll)
//! - [`service`] - application service tying gateway results to Payment
//!   rows, the OrderTransaction and the order's payment status

pub mod card;
pub mod gateway;
pub mod momo;
pub mod service;

pub use gateway::{ChargeOutcome, ChargeRequest, GatewayError, Gateways, PaymentGateway};
