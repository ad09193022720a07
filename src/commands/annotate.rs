use crate::annotation::run_batch;
use crate::config::Config;
use crate::types::{BatchRequest, OutputLayout, PredictorConfig};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Command line values for `annotate`, before config defaults are applied.
#[derive(Debug, Default, Clone)]
pub struct AnnotateOptions {
    pub input: String,
    pub out_path: String,
    pub tmp: String,
    pub cpus: Option<usize>,
    pub parallel: Option<usize>,
    pub porter: Option<String>,
    pub aucpred: Option<String>,
    pub python: Option<String>,
    pub no_interpreter: bool,
    pub timeout: Option<u64>,
    pub no_fast: bool,
    pub summary: Option<String>,
    pub quiet: bool,
}

/// One core is left for the orchestrator itself.
pub fn default_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

pub fn build_request(options: &AnnotateOptions, config: &Config) -> Result<BatchRequest> {
    let porter = options
        .porter
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| config.porter.clone())
        .context("No Porter path given. Use --porter or set 'porter' in the config file")?;
    let aucpred = options
        .aucpred
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| config.aucpred.clone());

    let interpreter = if options.no_interpreter {
        None
    } else {
        Some(options.python.clone().unwrap_or_else(|| config.python.clone()))
    };
    let timeout_secs = options.timeout.unwrap_or(config.timeout_secs);
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let predictors = PredictorConfig::new(porter)
        .with_interpreter(interpreter)
        .with_disorder_predictor(aucpred)
        .with_fast(!options.no_fast)
        .with_timeout(timeout);
    let layout = OutputLayout::for_predictors(&predictors);

    Ok(BatchRequest {
        input: PathBuf::from(&options.input),
        output_dir: PathBuf::from(&options.out_path),
        scratch_base: PathBuf::from(&options.tmp),
        cpus: options.cpus.unwrap_or_else(default_cpus),
        parallel: options.parallel.unwrap_or(config.parallel),
        predictors,
        layout,
        show_progress: !options.quiet,
    })
}

pub fn run(options: AnnotateOptions) -> Result<()> {
    let config = Config::load();
    let request = build_request(&options, &config)?;

    let summary = run_batch(&request)?;

    for output in &summary.outputs {
        println!("Wrote {}", output.display());
    }
    println!(
        "Annotated {} sequences in {:.1}s",
        summary.records, summary.elapsed_secs
    );

    if let Some(summary_path) = &options.summary {
        let mut file = File::create(summary_path)
            .with_context(|| format!("Failed to create summary file {}", summary_path))?;
        let json = serde_json::to_string_pretty(&summary)?;
        file.write_all(json.as_bytes())?;
    }

    Ok(())
}
