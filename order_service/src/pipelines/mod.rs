// topup-order-service/src/pipelines/mod.rs

//! The `topup_flow` pipelines behind order creation and webhook reconciliation.

pub mod contexts;
pub mod create_order_pipeline;
pub mod webhook_pipeline;

pub use create_order_pipeline::build_create_order_pipeline;
pub use webhook_pipeline::build_webhook_pipeline;
