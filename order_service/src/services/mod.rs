// topup-order-service/src/services/mod.rs

//! Entry points the HTTP handlers call. Each owns its prebuilt pipeline.

pub mod order_orchestrator;
pub mod webhook_reconciler;

pub use order_orchestrator::{OrderOrchestrator, SimulationOutcome};
pub use webhook_reconciler::{ReconcileOutcome, WebhookReconciler};
