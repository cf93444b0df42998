// topup-order-service/src/lib.rs

//! Order orchestration for game top-ups: order creation against the catalog
//! and payment gateway, and reconciliation of the gateway's terminal callbacks.

pub mod config;
pub mod errors;
pub mod events;
pub mod fees;
pub mod gateway;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
