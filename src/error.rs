use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Step of a job at which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    StageInput,
    StructurePrediction,
    StructureParsing,
    DisorderPrediction,
    DisorderParsing,
    Validation,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::StageInput => "staging scratch input",
            JobStage::StructurePrediction => "structure prediction",
            JobStage::StructureParsing => "parsing structure output",
            JobStage::DisorderPrediction => "disorder prediction",
            JobStage::DisorderParsing => "parsing disorder output",
            JobStage::Validation => "validating labels",
        };
        f.write_str(name)
    }
}

/// Predictor output that does not follow the expected table layout
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("line {line}: expected at least 3 fields, found {found}")]
    MissingField { line: usize, found: usize },

    #[error("line {line}: label field '{symbol}' is not a single character")]
    InvalidSymbol { line: usize, symbol: String },

    #[error("line {line}: unexpected disorder symbol '{symbol}' (expected '*' or '.')")]
    UnexpectedSymbol { line: usize, symbol: String },

    #[error("{label} has {found} labels but the sequence has {expected} residues")]
    LengthMismatch {
        label: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("malformed structure record near line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Filesystem error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read sequences from {}: {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    #[error("{tool} exited with {status}")]
    ExternalToolFailure { tool: String, status: ExitStatus },

    #[error("Failed to run {tool}: {source}")]
    ToolIo {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {}s and was killed", timeout.as_secs())]
    ToolTimeout { tool: String, timeout: Duration },

    #[error("{tool} was cancelled")]
    Cancelled { tool: String },

    #[error("Format error in {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Job '{job_id}' failed during {stage}: {source}")]
    Job {
        job_id: String,
        stage: JobStage,
        #[source]
        source: Box<AnnotationError>,
    },

    #[error("Job '{job_id}' panicked: {message}")]
    JobPanicked { job_id: String, message: String },
}

impl AnnotationError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnnotationError::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn in_job(self, job_id: &str, stage: JobStage) -> Self {
        AnnotationError::Job {
            job_id: job_id.to_string(),
            stage,
            source: Box::new(self),
        }
    }

    /// Id of the job this error belongs to, if any
    pub fn job_id(&self) -> Option<&str> {
        match self {
            AnnotationError::Job { job_id, .. } | AnnotationError::JobPanicked { job_id, .. } => {
                Some(job_id)
            }
            _ => None,
        }
    }

    pub fn stage(&self) -> Option<JobStage> {
        match self {
            AnnotationError::Job { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, skipping the job wrapper
    pub fn root_cause(&self) -> &AnnotationError {
        match self {
            AnnotationError::Job { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_message_names_job_and_stage() {
        let inner = AnnotationError::Format {
            path: PathBuf::from("query.diso_noprof"),
            source: FormatError::UnexpectedSymbol {
                line: 4,
                symbol: "?".to_string(),
            },
        };
        let err = inner.in_job("seqB", JobStage::DisorderParsing);

        let message = err.to_string();
        assert!(message.contains("seqB"));
        assert!(message.contains("parsing disorder output"));
        assert!(message.contains("'?'"));
        assert_eq!(err.job_id(), Some("seqB"));
        assert_eq!(err.stage(), Some(JobStage::DisorderParsing));
        assert!(matches!(err.root_cause(), AnnotationError::Format { .. }));
    }

    #[test]
    fn test_non_job_errors_have_no_job_id() {
        let err = AnnotationError::Argument("parallel must be at least 1".to_string());
        assert_eq!(err.job_id(), None);
        assert_eq!(err.stage(), None);
    }
}
