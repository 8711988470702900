use thiserror::Error;

/// Failures raised by the engine itself rather than by a step handler.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("step '{step_name}' is not defined in pipeline '{pipeline}'")]
  StepNotFound { pipeline: String, step_name: String },

  #[error("non-optional step '{step_name}' of pipeline '{pipeline}' has no handlers")]
  HandlerMissing { pipeline: String, step_name: String },

  #[error("no pipeline registered for context type {context_type}")]
  NotRegistered { context_type: &'static str },

  #[error("context type mismatch, expected {expected_type}")]
  TypeMismatch { expected_type: &'static str },

  #[error("step handler failed: {source}")]
  Handler {
    #[source]
    source: anyhow::Error,
  },
}

impl From<anyhow::Error> for FlowError {
  fn from(source: anyhow::Error) -> Self {
    FlowError::Handler { source }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
