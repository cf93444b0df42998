// topup-flow/src/error.rs
use thiserror::Error;

/// Failures raised by the pipeline engine itself, as opposed to the
/// application errors returned by handlers.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found in pipeline '{pipeline}': {step_name}")]
  StepNotFound { pipeline: String, step_name: String },

  #[error("Handler missing for non-optional step '{step_name}' in pipeline '{pipeline}'")]
  HandlerMissing { pipeline: String, step_name: String },

  #[error("Step '{step_name}' left required context state unset: {detail}")]
  MissingState { step_name: String, detail: String },
}

impl FlowError {
  /// Shorthand used by handlers that find an earlier step's output missing.
  pub fn missing_state(step_name: &str, detail: impl Into<String>) -> Self {
    FlowError::MissingState {
      step_name: step_name.to_string(),
      detail: detail.into(),
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
