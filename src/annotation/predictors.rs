use crate::types::PredictorConfig;
use crate::utils::external_tools::ToolInvocation;
use std::path::{Path, PathBuf};

pub const STRUCTURE_TOOL: &str = "Porter";
pub const DISORDER_TOOL: &str = "AUCpreD";

/// Files Porter writes next to its input.
pub struct StructureOutputs {
    pub ss3: PathBuf,
    pub ss8: PathBuf,
    pub scratch: Vec<PathBuf>,
}

/// Files AUCpreD writes into its output directory.
pub struct DisorderOutputs {
    pub disorder: PathBuf,
    pub scratch: Vec<PathBuf>,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn structure_invocation(
    config: &PredictorConfig,
    input: &Path,
    job_dir: &Path,
    cpus: usize,
) -> ToolInvocation {
    let invocation = match &config.interpreter {
        Some(interpreter) => ToolInvocation::new(STRUCTURE_TOOL, interpreter, job_dir)
            .arg(&config.structure_predictor),
        None => ToolInvocation::new(STRUCTURE_TOOL, &config.structure_predictor, job_dir),
    };
    let invocation = invocation
        .arg("-i")
        .arg(input)
        .arg("--cpu")
        .arg(cpus.to_string())
        .timeout(config.timeout);

    if config.fast {
        invocation.arg("--fast")
    } else {
        invocation
    }
}

pub fn structure_outputs(input: &Path) -> StructureOutputs {
    let ss3 = with_suffix(input, ".ss3");
    let ss8 = with_suffix(input, ".ss8");
    let scratch = vec![
        ss3.clone(),
        ss8.clone(),
        with_suffix(input, ".psi"),
        with_suffix(input, ".blastpgp"),
        input.with_extension("hhr"),
    ];
    StructureOutputs { ss3, ss8, scratch }
}

pub fn disorder_invocation(
    config: &PredictorConfig,
    predictor: &Path,
    input: &Path,
    job_dir: &Path,
) -> ToolInvocation {
    // AUCpreD concatenates the prefix it is handed, so keep the separator
    let out_prefix = with_suffix(job_dir, std::path::MAIN_SEPARATOR_STR);
    ToolInvocation::new(DISORDER_TOOL, predictor, job_dir)
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(out_prefix)
        .timeout(config.timeout)
}

pub fn disorder_outputs(input: &Path, job_dir: &Path) -> DisorderOutputs {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disorder = job_dir.join(format!("{}.diso_noprof", stem));
    let scratch = vec![disorder.clone(), job_dir.join(format!("{}.diso_prev", stem))];
    DisorderOutputs { disorder, scratch }
}
