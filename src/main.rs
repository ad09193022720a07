use clap::Parser;
use structure_annotator::cli::{Args, Commands};
use structure_annotator::commands;
use structure_annotator::commands::annotate::AnnotateOptions;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Annotate {
            input,
            out_path,
            tmp,
            cpus,
            parallel,
            porter,
            aucpred,
            python,
            no_interpreter,
            timeout,
            no_fast,
            summary,
            quiet,
        } => commands::annotate::run(AnnotateOptions {
            input,
            out_path,
            tmp,
            cpus,
            parallel,
            porter,
            aucpred,
            python,
            no_interpreter,
            timeout,
            no_fast,
            summary,
            quiet,
        }),
        Commands::CheckTools {
            porter,
            aucpred,
            save,
        } => commands::check_tools::run(porter, aucpred, save),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
