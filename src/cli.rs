use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate secondary structure (and optionally disorder) for every sequence in a FASTA file
    Annotate {
        /// Path to the input FASTA (plain or gzip compressed)
        #[arg(short = 'i', long = "input")]
        input: String,

        /// Output directory
        #[arg(short = 'o', long = "out-path")]
        out_path: String,

        /// Base directory for scratch files
        #[arg(short = 't', long = "tmp", default_value = ".")]
        tmp: String,

        /// CPUs handed to each Porter run (default: available cores - 1)
        #[arg(short = 'c', long = "cpus")]
        cpus: Option<usize>,

        /// Number of sequences annotated in parallel (default: 1, or the config file value)
        #[arg(long = "parallel")]
        parallel: Option<usize>,

        /// Path to the Porter script
        #[arg(short = 'p', long = "porter")]
        porter: Option<String>,

        /// Path to AUCpreD; enables disorder prediction and the combined .structure output
        #[arg(short = 'a', long = "aucpred")]
        aucpred: Option<String>,

        /// Interpreter used to start Porter
        #[arg(long = "python", conflicts_with = "no_interpreter")]
        python: Option<String>,

        /// Run Porter directly instead of through an interpreter
        #[arg(long = "no-interpreter")]
        no_interpreter: bool,

        /// Kill a predictor run after this many seconds
        #[arg(long = "timeout")]
        timeout: Option<u64>,

        /// Do not pass --fast to Porter
        #[arg(long = "no-fast")]
        no_fast: bool,

        /// Write a JSON summary of the run to this file
        #[arg(long = "summary")]
        summary: Option<String>,

        /// Hide the progress bar
        #[arg(short = 'q', long = "quiet")]
        quiet: bool,
    },

    /// Check that the configured predictors can be found
    CheckTools {
        /// Path to the Porter script
        #[arg(short = 'p', long = "porter")]
        porter: Option<String>,

        /// Path to AUCpreD
        #[arg(short = 'a', long = "aucpred")]
        aucpred: Option<String>,

        /// Store the given paths as defaults in the config file
        #[arg(long = "save")]
        save: bool,
    },
}
