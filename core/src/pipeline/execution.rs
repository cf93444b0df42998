// topup-flow/src/pipeline/execution.rs

//! `Pipeline::run()`: executes the steps in order against one shared context.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, Instrument, Level};

enum PhaseOutcome<Err> {
  Continue,
  Stopped,
  Failed(Err),
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// Returns `Ok(Completed)` when all steps ran, `Ok(Stopped)` when a handler
  /// returned `PipelineControl::Stop`, or the first handler error. A
  /// non-optional step without handlers fails with `FlowError::HandlerMissing`.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    let pipeline_span = info_span!("pipeline_run", pipeline = %self.name, num_steps = self.steps.len());

    async {
      event!(Level::DEBUG, "Pipeline execution starting.");

      for (step_idx, step_def) in self.steps.iter().enumerate() {
        let step_name = step_def.name.as_str();
        let on_handlers = self.on.get(step_name).filter(|h| !h.is_empty());
        let after_handlers = self.after.get(step_name).filter(|h| !h.is_empty());

        if on_handlers.is_none() && after_handlers.is_none() {
          if step_def.optional {
            event!(Level::DEBUG, step_name, "Optional step has no handlers, skipping.");
            continue;
          }
          event!(Level::ERROR, step_name, "Non-optional step has no handlers.");
          return Err(Err::from(FlowError::HandlerMissing {
            pipeline: self.name.clone(),
            step_name: step_def.name.clone(),
          }));
        }

        let step_span = info_span!("pipeline_step", step_name, step_index = step_idx);
        let outcome = async {
          if let Some(handlers) = on_handlers {
            match run_phase("on", handlers, &ctx_data).await {
              PhaseOutcome::Continue => {}
              other => return other,
            }
          }
          if let Some(handlers) = after_handlers {
            return run_phase("after", handlers, &ctx_data).await;
          }
          PhaseOutcome::Continue
        }
        .instrument(step_span)
        .await;

        match outcome {
          PhaseOutcome::Continue => {}
          PhaseOutcome::Stopped => {
            event!(Level::INFO, step_name, "Pipeline stopped by handler.");
            return Ok(PipelineResult::Stopped);
          }
          PhaseOutcome::Failed(e) => {
            event!(Level::WARN, step_name, error = %e, "Step failed.");
            return Err(e);
          }
        }
      }

      event!(Level::DEBUG, "Pipeline execution completed.");
      Ok(PipelineResult::Completed)
    }
    .instrument(pipeline_span)
    .await
  }
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> PhaseOutcome<Err>
where
  TData: 'static + Send + Sync,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    event!(Level::TRACE, phase, handler_idx, "Executing handler.");
    match handler_fn(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return PhaseOutcome::Stopped,
      Err(e) => return PhaseOutcome::Failed(e),
    }
  }
  PhaseOutcome::Continue
}
