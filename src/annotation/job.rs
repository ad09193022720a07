use crate::annotation::predictors::{
    disorder_invocation, disorder_outputs, structure_invocation, structure_outputs,
};
use crate::annotation::threading::JobExecutor;
use crate::annotation::workspace::{
    create_job_workspace, remove_job_workspace, remove_scratch_files, write_scratch_input,
};
use crate::error::{AnnotationError, AnnotationResult, FormatError, JobStage};
use crate::formats::predictions::{read_disorder_file, read_structure_file};
use crate::types::{Job, JobResult};
use crate::utils::cancellation::CancellationToken;
use crate::utils::external_tools::invoke;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

/// Runs each job through Porter and, when configured, AUCpreD.
#[derive(Debug, Default, Clone, Copy)]
pub struct PredictorJobExecutor;

impl JobExecutor for PredictorJobExecutor {
    fn execute(&self, job: &Job, cancel: &CancellationToken) -> AnnotationResult<JobResult> {
        run_job(job, cancel)
    }
}

/// Executes one job inside its own scratch directory.
pub fn run_job(job: &Job, cancel: &CancellationToken) -> AnnotationResult<JobResult> {
    in_job_workspace(job, |job_dir| run_in_workspace(job, job_dir, cancel))
}

/// Creates the job directory, runs `body` in it and removes it again, also
/// when `body` fails or panics. A panic is re-raised after the cleanup.
fn in_job_workspace<F>(job: &Job, body: F) -> AnnotationResult<JobResult>
where
    F: FnOnce(&Path) -> AnnotationResult<JobResult>,
{
    let job_dir = create_job_workspace(&job.batch_dir, job.index)
        .map_err(|e| e.in_job(&job.id, JobStage::StageInput))?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&job_dir)));
    remove_job_workspace(&job_dir);
    outcome.unwrap_or_else(|payload| panic::resume_unwind(payload))
}

fn run_in_workspace(
    job: &Job,
    job_dir: &Path,
    cancel: &CancellationToken,
) -> AnnotationResult<JobResult> {
    let input = write_scratch_input(job_dir, &job.id, &job.sequence)
        .map_err(|e| e.in_job(&job.id, JobStage::StageInput))?;

    debug!(job = %job.id, residues = job.sequence.len(), "running structure predictor");
    let structure = structure_outputs(&input);
    invoke(
        &structure_invocation(&job.predictors, &input, job_dir, job.cpus),
        cancel,
    )
    .map_err(|e| e.in_job(&job.id, JobStage::StructurePrediction))?;

    let ss3 = read_structure_file(&structure.ss3)
        .map_err(|e| e.in_job(&job.id, JobStage::StructureParsing))?;
    let ss8 = read_structure_file(&structure.ss8)
        .map_err(|e| e.in_job(&job.id, JobStage::StructureParsing))?;
    remove_scratch_files(&structure.scratch);

    let disorder = match &job.predictors.disorder_predictor {
        Some(predictor) => {
            debug!(job = %job.id, "running disorder predictor");
            let outputs = disorder_outputs(&input, job_dir);
            invoke(
                &disorder_invocation(&job.predictors, predictor, &input, job_dir),
                cancel,
            )
            .map_err(|e| e.in_job(&job.id, JobStage::DisorderPrediction))?;

            let disorder = read_disorder_file(&outputs.disorder)
                .map_err(|e| e.in_job(&job.id, JobStage::DisorderParsing))?;
            remove_scratch_files(&outputs.scratch);
            Some(disorder)
        }
        None => None,
    };

    remove_scratch_files(&[&input]);

    let result = JobResult {
        id: job.id.clone(),
        ss3,
        ss8,
        disorder,
    };
    check_lengths(&result, job.sequence.chars().count())
        .map_err(|source| {
            AnnotationError::Format {
                path: input.clone(),
                source,
            }
        })
        .map_err(|e| e.in_job(&job.id, JobStage::Validation))?;

    Ok(result)
}

/// Every label string must have one symbol per residue.
pub fn check_lengths(result: &JobResult, residues: usize) -> Result<(), FormatError> {
    let mut labels = vec![("ss3", &result.ss3), ("ss8", &result.ss8)];
    if let Some(disorder) = &result.disorder {
        labels.push(("disorder", disorder));
    }

    for (label, value) in labels {
        let found = value.chars().count();
        if found != residues {
            return Err(FormatError::LengthMismatch {
                label,
                expected: residues,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PredictorConfig;
    use std::sync::Arc;

    fn result(ss3: &str, ss8: &str, disorder: Option<&str>) -> JobResult {
        JobResult {
            id: "seqA".to_string(),
            ss3: ss3.to_string(),
            ss8: ss8.to_string(),
            disorder: disorder.map(str::to_string),
        }
    }

    fn job(batch_dir: &Path) -> Job {
        Job {
            index: 3,
            id: "seqA".to_string(),
            sequence: "MKV".to_string(),
            batch_dir: batch_dir.to_path_buf(),
            predictors: Arc::new(PredictorConfig::new("porter")),
            cpus: 1,
        }
    }

    #[test]
    fn test_job_workspace_removed_after_failure() {
        let batch = tempfile::tempdir().unwrap();
        let job = job(batch.path());

        let err = in_job_workspace(&job, |dir| {
            std::fs::write(dir.join("query.fasta"), ">seqA\nMKV\n").unwrap();
            Err(AnnotationError::Argument("predictor failed".to_string()))
        })
        .unwrap_err();

        assert!(matches!(err, AnnotationError::Argument(_)));
        assert!(!batch.path().join("job-000003").exists());
    }

    #[test]
    fn test_job_workspace_removed_after_panic() {
        let batch = tempfile::tempdir().unwrap();
        let job = job(batch.path());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            in_job_workspace(&job, |dir| {
                assert!(dir.is_dir());
                panic!("predictor wrapper crashed")
            })
        }));

        assert!(outcome.is_err());
        assert!(!batch.path().join("job-000003").exists());
    }

    #[test]
    fn test_lengths_match() {
        assert!(check_lengths(&result("CHHE", "CHGE", Some("0110")), 4).is_ok());
        assert!(check_lengths(&result("CHHE", "CHGE", None), 4).is_ok());
    }

    #[test]
    fn test_length_mismatch_names_label() {
        let err = check_lengths(&result("CHHE", "CHG", None), 4).unwrap_err();
        assert_eq!(
            err,
            FormatError::LengthMismatch {
                label: "ss8",
                expected: 4,
                found: 3
            }
        );

        let err = check_lengths(&result("CHHE", "CHGE", Some("01")), 4).unwrap_err();
        assert!(matches!(err, FormatError::LengthMismatch { label: "disorder", .. }));
    }
}
