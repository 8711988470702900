//! Step pipelines for the storefront's multi-step workflows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step may carry
//! `before`, `on` and `after` handlers, may be optional, and may be skipped
//! by a condition evaluated against the shared context. Handlers receive a
//! [`ContextData`] handle and return a [`PipelineControl`] telling the runner
//! to continue or stop early.
//!
//! A [`Registry`] keys pipelines by the type of their context data so callers
//! only need to build a context and hand it over:
//!
//! ```ignore
//! let ctx = ContextData::new(RegisterCtxData::new(state, request));
//! registry.run(ctx.clone()).await?;
//! let user = ctx.read().created_user.clone();
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{Handler, HandlerFuture};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::definition::Pipeline;
pub use crate::registry::Registry;
