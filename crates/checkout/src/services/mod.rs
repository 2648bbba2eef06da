//! Collaborator traits the checkout flow depends on, with in-memory
//! implementations for tests and default wiring.

pub mod basket;
pub mod catalog;
pub mod digital;
pub mod gateway;
pub mod notification;

pub use basket::{Basket, BasketItem, BasketService, InMemoryBasketService};
pub use catalog::{CatalogListing, CatalogService, InMemoryCatalogService};
pub use digital::{DigitalDeliveryService, InMemoryDigitalDeliveryService};
pub use gateway::{InMemoryPaymentGateway, PaymentGateway, PaymentIntent};
pub use notification::{InMemoryNotificationService, NotificationService};
