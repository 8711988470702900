//! `Pipeline::run`.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, Instrument, Level};

#[derive(Debug, Clone, Copy)]
enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step in order against `ctx_data`.
  ///
  /// A handler error aborts the run and is returned unchanged. A non-optional
  /// step without any handler fails with [`FlowError::HandlerMissing`].
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, pipeline = %self.name, steps = self.steps.len(), "Pipeline run starting.");

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(Level::DEBUG, pipeline = %self.name, step = step_name, "Step skipped by condition.");
          continue;
        }
      }

      let phases = [
        (Phase::Before, self.before_handlers.get(step_name)),
        (Phase::On, self.on_handlers.get(step_name)),
        (Phase::After, self.after_handlers.get(step_name)),
      ];

      if phases.iter().all(|(_, handlers)| handlers.map_or(true, |h| h.is_empty())) {
        if step_def.optional {
          event!(Level::DEBUG, pipeline = %self.name, step = step_name, "Optional step has no handlers.");
          continue;
        }
        event!(Level::ERROR, pipeline = %self.name, step = step_name, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          pipeline: self.name.clone(),
          step_name: step_def.name.clone(),
        }));
      }

      let span = info_span!("pipeline_step", pipeline = %self.name, step = step_name, index = step_index);
      let stopped = async {
        for (phase, handlers) in phases {
          if let Some(handlers) = handlers {
            if run_phase(phase, handlers, &ctx_data).await? == PipelineControl::Stop {
              return Ok::<bool, Err>(true);
            }
          }
        }
        Ok(false)
      }
      .instrument(span)
      .await?;

      if stopped {
        event!(Level::INFO, pipeline = %self.name, step = step_name, "Pipeline stopped by handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, pipeline = %self.name, "Pipeline run completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(
  phase: Phase,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for handler in handlers {
    match handler(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
      Err(e) => {
        event!(Level::WARN, phase = phase.as_str(), error = %e, "Step handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PipelineControl::Continue)
}
