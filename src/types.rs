use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One record of the input FASTA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }
}

/// How the external predictors are launched
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Secondary structure predictor (Porter)
    pub structure_predictor: PathBuf,
    /// Interpreter used to launch the structure predictor, e.g. `python`
    pub interpreter: Option<String>,
    /// Disorder predictor (AUCpreD); `None` disables the disorder step
    pub disorder_predictor: Option<PathBuf>,
    /// Pass `--fast` to the structure predictor
    pub fast: bool,
    /// Deadline for a single predictor run
    pub timeout: Option<Duration>,
}

impl PredictorConfig {
    pub fn new(structure_predictor: impl Into<PathBuf>) -> Self {
        Self {
            structure_predictor: structure_predictor.into(),
            interpreter: Some("python".to_string()),
            disorder_predictor: None,
            fast: true,
            timeout: None,
        }
    }

    pub fn with_interpreter(mut self, interpreter: Option<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_disorder_predictor(mut self, path: Option<PathBuf>) -> Self {
        self.disorder_predictor = path;
        self
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Output file arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputLayout {
    /// `<name>.structure`: header, ss3, ss8, disorder per record
    Combined,
    /// `<name>.ss3` and `<name>.ss8`: header and labels per record
    Split,
}

impl OutputLayout {
    pub fn for_predictors(predictors: &PredictorConfig) -> Self {
        if predictors.disorder_predictor.is_some() {
            OutputLayout::Combined
        } else {
            OutputLayout::Split
        }
    }
}

/// A unit of work: one record through both predictors
#[derive(Debug, Clone)]
pub struct Job {
    /// Position of the record in the input
    pub index: usize,
    pub id: String,
    pub sequence: String,
    pub batch_dir: PathBuf,
    pub predictors: Arc<PredictorConfig>,
    pub cpus: usize,
}

/// Per-residue labels of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id: String,
    pub ss3: String,
    pub ss8: String,
    pub disorder: Option<String>,
}

/// Everything `run_batch` needs
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub scratch_base: PathBuf,
    pub cpus: usize,
    pub parallel: usize,
    pub predictors: PredictorConfig,
    pub layout: OutputLayout,
    pub show_progress: bool,
}

/// What a finished batch produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub input: PathBuf,
    pub records: usize,
    pub layout: OutputLayout,
    pub outputs: Vec<PathBuf>,
    pub elapsed_secs: f64,
}
