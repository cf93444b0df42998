// topup-flow/src/core/control.rs

//! Signals for controlling pipeline flow and the outcome of a run.

/// Returned by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Proceed with the next handler or step.
  Continue,
  /// Halt the pipeline. Remaining handlers and steps are not executed.
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step ran.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
