//! Scratch directories for a batch and its jobs.
//!
//! Layout: `<scratch_base>/<batch_name>/job-<index>/query.fasta`. Job
//! directories are named after the record's position, never after its
//! header, so arbitrary ids cannot escape or collide in the scratch tree.

use crate::error::{AnnotationError, AnnotationResult};
use crate::readers::fasta::write_single_record;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SCRATCH_INPUT: &str = "query.fasta";

pub fn create_batch_workspace(base: &Path, batch_name: &str) -> AnnotationResult<PathBuf> {
    let batch_dir = base.join(batch_name);
    fs::create_dir_all(&batch_dir).map_err(|e| AnnotationError::fs(&batch_dir, e))?;
    debug!(path = %batch_dir.display(), "created batch workspace");
    Ok(batch_dir)
}

pub fn job_workspace_name(index: usize) -> String {
    format!("job-{:06}", index)
}

pub fn create_job_workspace(batch_dir: &Path, index: usize) -> AnnotationResult<PathBuf> {
    let job_dir = batch_dir.join(job_workspace_name(index));
    fs::create_dir_all(&job_dir).map_err(|e| AnnotationError::fs(&job_dir, e))?;
    Ok(job_dir)
}

/// Stages the single-record FASTA the predictors read.
pub fn write_scratch_input(job_dir: &Path, id: &str, sequence: &str) -> AnnotationResult<PathBuf> {
    let path = job_dir.join(SCRATCH_INPUT);
    write_single_record(&path, id, sequence).map_err(|e| AnnotationError::fs(&path, e))?;
    Ok(path)
}

/// Removes predictor by-products. Files that were never written are skipped;
/// any other failure is logged and the remaining paths are still tried.
/// Returns whether every path is gone.
pub fn remove_scratch_files<P: AsRef<Path>>(paths: &[P]) -> bool {
    let mut all_removed = true;
    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove scratch file");
                all_removed = false;
            }
        }
    }
    all_removed
}

fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Best effort; a failure is logged and reported back but never fatal.
pub fn remove_job_workspace(job_dir: &Path) -> bool {
    match remove_tree(job_dir) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %job_dir.display(), error = %e, "failed to remove job workspace");
            false
        }
    }
}

pub fn remove_batch_workspace(batch_dir: &Path) -> bool {
    match remove_tree(batch_dir) {
        Ok(()) => {
            debug!(path = %batch_dir.display(), "removed batch workspace");
            true
        }
        Err(e) => {
            warn!(path = %batch_dir.display(), error = %e, "failed to remove batch workspace");
            false
        }
    }
}
