// topup-order-service/src/models/mod.rs

//! Data structures exchanged with the database, the collaborator services and
//! the message bus.

pub mod envelope;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use envelope::Envelope;
pub use order::{CreateOrderRequest, NewOrder, Order, OrderMessage, OrderWithPayment};
pub use payment::{CreatePaymentRequest, CreatedPayment, PaymentAction, PaymentSnapshot};
pub use product::Product;
pub use user::User;
