//! Domain layer for the storefront order core.
//!
//! This crate provides the pure data and invariant-holding types:
//! - Order aggregate with totals validation
//! - OrderStatus state machine with an exhaustive transition table
//! - Append-only status history records
//! - Payment attempt records with refund accounting
//! - Money, currency, address, and item snapshot value objects

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{
    Actor, Address, AttributeSnapshot, Currency, Money, NewOrder, Order, OrderItem, OrderNumber,
    OrderStatus, OrderStatusHistory, Payment, PaymentStatus, authoritative_payment,
};
