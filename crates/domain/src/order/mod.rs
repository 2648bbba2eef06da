//! Order domain: aggregate, state machine, history, and payments.

mod aggregate;
mod history;
mod payment;
mod status;
mod value_objects;

pub use aggregate::{NewOrder, Order};
pub use history::{Actor, OrderStatusHistory};
pub use payment::{Payment, authoritative_payment};
pub use status::{OrderStatus, PaymentStatus};
pub use value_objects::{Address, AttributeSnapshot, Currency, Money, OrderItem, OrderNumber};
