pub mod context;
pub mod context_data;
pub mod control;
pub mod step;
