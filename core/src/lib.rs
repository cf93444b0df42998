// topup-flow/src/lib.rs

//! A small asynchronous step pipeline.
//!
//! A pipeline is an ordered list of named steps. Each step has one or more
//! `on` handlers and optional `after` handlers; every handler receives a clone
//! of the shared [`ContextData`] and answers with a [`PipelineControl`].
//!
//!  - `Continue` moves on to the next handler / step.
//!  - `Stop` halts the run gracefully; `run` then returns [`PipelineResult::Stopped`].
//!  - An `Err` aborts the run and is returned unchanged to the caller.
//!
//! Handlers must drop their lock guards before awaiting.

pub mod core;
pub mod error;
pub mod pipeline;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::StepDef;
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::definition::Pipeline;
