use crate::annotation::job::PredictorJobExecutor;
use crate::annotation::predictors::{DISORDER_TOOL, STRUCTURE_TOOL};
use crate::annotation::threading::{JobExecutor, WorkerPool};
use crate::annotation::workspace::{create_batch_workspace, remove_batch_workspace};
use crate::error::{AnnotationError, AnnotationResult};
use crate::formats::structure::write_output;
use crate::readers::fasta::read_records;
use crate::types::{
    BatchRequest, BatchSummary, Job, JobResult, OutputLayout, PredictorConfig, SequenceRecord,
};
use crate::utils::cancellation::CancellationToken;
use crate::utils::external_tools::check_tool;
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

const SCRATCH_SUFFIX: &str = "scratch";

/// Output base name: the input file name without its last extension.
pub fn batch_name(input: &Path) -> AnnotationResult<String> {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            AnnotationError::Argument(format!("cannot derive a name from {}", input.display()))
        })
}

fn absolute(path: &Path) -> AnnotationResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| AnnotationError::fs(".", e))?;
    Ok(cwd.join(path))
}

fn resolve_predictors(predictors: &PredictorConfig) -> AnnotationResult<PredictorConfig> {
    let mut resolved = predictors.clone();
    resolved.structure_predictor = absolute(&predictors.structure_predictor)?;
    resolved.disorder_predictor = match &predictors.disorder_predictor {
        Some(path) => Some(absolute(path)?),
        None => None,
    };
    Ok(resolved)
}

fn validate(request: &BatchRequest) -> AnnotationResult<()> {
    if request.parallel == 0 {
        return Err(AnnotationError::Argument(
            "parallel must be at least 1".to_string(),
        ));
    }
    if request.cpus == 0 {
        return Err(AnnotationError::Argument(
            "cpus must be at least 1".to_string(),
        ));
    }
    let expected = OutputLayout::for_predictors(&request.predictors);
    if request.layout != expected {
        return Err(AnnotationError::Argument(format!(
            "{:?} output requires {} disorder predictor",
            request.layout,
            if request.layout == OutputLayout::Combined { "a" } else { "no" }
        )));
    }
    Ok(())
}

fn check_unique_ids(records: &[SequenceRecord]) -> AnnotationResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(AnnotationError::Argument(format!(
                "duplicate sequence id '{}' in input",
                record.id
            )));
        }
    }
    Ok(())
}

pub fn build_jobs(
    records: Vec<SequenceRecord>,
    batch_dir: &Path,
    predictors: Arc<PredictorConfig>,
    cpus: usize,
) -> Vec<Job> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| Job {
            index,
            id: record.id,
            sequence: record.sequence,
            batch_dir: batch_dir.to_path_buf(),
            predictors: Arc::clone(&predictors),
            cpus,
        })
        .collect()
}

fn progress_bar(total: usize, show: bool) -> ProgressBar {
    ProgressBarBuilder::new("Annotating sequences")
        .with_template("{spinner:.green} [{elapsed_precise}] {msg} [{wide_bar}] {pos}/{len} ({eta})")
        .with_length(total as u64)
        .with_tick()
        .hidden(!show)
        .build()
        .unwrap_or_else(|_| ProgressBar::hidden())
}

/// Drives the pool to completion. The first failure cancels the remaining
/// work and becomes the batch's result.
fn collect_results<E: JobExecutor>(
    jobs: Vec<Job>,
    parallel: usize,
    executor: E,
    show_progress: bool,
) -> AnnotationResult<Vec<JobResult>> {
    let total = jobs.len();
    let progress = progress_bar(total, show_progress);
    let mut pool = WorkerPool::new(jobs, parallel, executor, CancellationToken::new())?;

    let mut results = Vec::with_capacity(total);
    let mut failure = None;
    for outcome in pool.by_ref() {
        match outcome {
            Ok(result) => {
                progress.inc(1);
                results.push(result);
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    pool.shutdown();

    if let Some(e) = failure {
        progress.abandon_with_message("Annotation failed");
        return Err(e);
    }
    if results.len() != total {
        progress.abandon_with_message("Annotation interrupted");
        return Err(AnnotationError::Cancelled {
            tool: "batch".to_string(),
        });
    }

    progress.finish_with_message(format!("Annotated {} sequences", total));
    Ok(results)
}

/// Annotates every record of `request.input` and writes the output files.
pub fn run_batch(request: &BatchRequest) -> AnnotationResult<BatchSummary> {
    check_tool(STRUCTURE_TOOL, &request.predictors.structure_predictor)?;
    if let Some(disorder) = &request.predictors.disorder_predictor {
        check_tool(DISORDER_TOOL, disorder)?;
    }
    run_batch_with(request, PredictorJobExecutor)
}

/// Same as [`run_batch`] with a custom job body.
pub fn run_batch_with<E: JobExecutor>(
    request: &BatchRequest,
    executor: E,
) -> AnnotationResult<BatchSummary> {
    let started = Instant::now();
    validate(request)?;
    let name = batch_name(&request.input)?;

    let records = read_records(&request.input)?;
    if records.is_empty() {
        return Err(AnnotationError::Argument(format!(
            "no sequences found in {}",
            request.input.display()
        )));
    }
    check_unique_ids(&records)?;
    let record_count = records.len();
    info!(
        input = %request.input.display(),
        records = record_count,
        parallel = request.parallel,
        "starting batch"
    );

    fs::create_dir_all(&request.output_dir)
        .map_err(|e| AnnotationError::fs(&request.output_dir, e))?;
    let scratch_base = absolute(&request.scratch_base)?;
    let batch_dir = create_batch_workspace(&scratch_base, &format!("{}.{}", name, SCRATCH_SUFFIX))?;

    let outcome = resolve_predictors(&request.predictors).and_then(|predictors| {
        let jobs = build_jobs(records, &batch_dir, Arc::new(predictors), request.cpus);
        let results = collect_results(jobs, request.parallel, executor, request.show_progress)?;
        write_output(&request.output_dir, &name, request.layout, &results)
    });
    remove_batch_workspace(&batch_dir);
    let outputs = outcome?;

    info!(records = record_count, elapsed = ?started.elapsed(), "batch finished");
    Ok(BatchSummary {
        input: request.input.clone(),
        records: record_count,
        layout: request.layout,
        outputs,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}
