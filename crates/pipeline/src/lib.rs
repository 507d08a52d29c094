//! Query pipeline: normalization, topicality screening, retrieval, and
//! grounded answer composition over a swappable engine context.

pub mod composer;
pub mod engine;
pub mod normalizer;
pub mod orchestrator;

pub use engine::{build_index, Engine, EngineHandle};
pub use orchestrator::{PipelineError, PipelineOutcome, Stage};
