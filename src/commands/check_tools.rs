use crate::annotation::predictors::{DISORDER_TOOL, STRUCTURE_TOOL};
use crate::config::Config;
use crate::utils::external_tools::check_tool;
use anyhow::Result;
use std::path::PathBuf;

pub fn run(porter: Option<String>, aucpred: Option<String>, save: bool) -> Result<()> {
    let mut config = Config::load();
    let porter = porter.map(PathBuf::from).or_else(|| config.porter.clone());
    let aucpred = aucpred.map(PathBuf::from).or_else(|| config.aucpred.clone());

    let mut missing = 0;
    for (name, path) in [(STRUCTURE_TOOL, &porter), (DISORDER_TOOL, &aucpred)] {
        match path {
            Some(path) => match check_tool(name, path) {
                Ok(()) => println!("{:<8} ok       {}", name, path.display()),
                Err(e) => {
                    println!("{:<8} missing  {}", name, e);
                    missing += 1;
                }
            },
            None => println!("{:<8} not configured", name),
        }
    }

    if porter.is_none() {
        missing += 1;
    }

    if save {
        config.porter = porter;
        config.aucpred = aucpred;
        let path = config.save()?;
        println!("Saved predictor paths to {}", path.display());
    }

    if missing > 0 {
        anyhow::bail!("{} predictor(s) unavailable", missing);
    }
    Ok(())
}
