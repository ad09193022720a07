//! Per-sequence annotation jobs and the batch engine that runs them.

pub mod batch;
pub mod job;
pub mod predictors;
pub mod threading;
pub mod workspace;

pub use batch::{run_batch, run_batch_with};
pub use job::PredictorJobExecutor;
pub use threading::{JobExecutor, WorkerPool};
