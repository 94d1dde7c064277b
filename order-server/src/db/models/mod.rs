//! Database models
//!
//! Row types and request/response DTOs for the order core:
//!
//! - [`product`] - catalog snapshot with mutable stock counter
//! - [`discount`] - percentage discounts with validity windows
//! - [`order`] - the Order aggregate (orders, order items, status machine)
//! - [`payment`] - payment attempts and the canonical settled transaction

pub mod discount;
pub mod order;
pub mod payment;
pub mod product;

pub use discount::{Discount, DiscountCreate};
pub use order::{
    CreateGuestOrderRequest, CreateOrderRequest, Order, OrderItem, OrderLine, OrderStatus,
    OrderWithItems, PaymentStatus, UpdateStatusRequest,
};
pub use payment::{
    MethodDetails, OrderTransaction, Payment, PaymentProvider, PaymentState,
};
pub use product::{Product, ProductCreate};
