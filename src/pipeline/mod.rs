//! Pipeline assembly and execution.
//!
//! A [`BuilderFactory`] hands out [`PipelineBuilder`]s. Each append resolves a
//! provider and links a new [`PipelineNode`] behind the previous one; `build`
//! wraps the terminal node in a [`Pipeline`]. Executing walks the chain oldest
//! first, folds mergeable nodes into runs and materializes each run once.

pub mod builder;
pub mod context;
mod driver;
pub mod executable;
pub mod factory;
pub mod node;

pub use builder::PipelineBuilder;
pub use context::ExecutionContext;
pub use executable::Pipeline;
pub use factory::BuilderFactory;
pub use node::{PipelineNode, RunExecutor};
