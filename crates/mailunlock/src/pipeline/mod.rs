pub mod error;
pub mod kind;
pub mod runner;

pub use error::PipelineError;
pub use kind::FileKind;
pub use runner::{Pipeline, Resolution, ResolveSummary};
