pub mod annotation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod formats;
pub mod readers;
pub mod types;
pub mod utils;

pub use annotation::{run_batch, run_batch_with};
pub use error::{AnnotationError, AnnotationResult, FormatError, JobStage};
pub use types::*;
