use crate::error::{AnnotationError, AnnotationResult, FormatError};
use crate::types::{JobResult, OutputLayout};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const STRUCTURE_EXTENSION: &str = "structure";
pub const SS3_EXTENSION: &str = "ss3";
pub const SS8_EXTENSION: &str = "ss8";

/// Layout A: header, ss3, ss8 and disorder lines per record.
pub fn write_structure_records<W: Write>(writer: &mut W, results: &[JobResult]) -> io::Result<()> {
    for result in results {
        let disorder = result.disorder.as_deref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record '{}' has no disorder labels", result.id),
            )
        })?;
        writeln!(writer, ">{}", result.id)?;
        writeln!(writer, "{}", result.ss3)?;
        writeln!(writer, "{}", result.ss8)?;
        writeln!(writer, "{}", disorder)?;
    }
    Ok(())
}

/// Layout B: header and labels per record, ss3 and ss8 in lock-step.
pub fn write_split_records<A: Write, B: Write>(
    ss3_writer: &mut A,
    ss8_writer: &mut B,
    results: &[JobResult],
) -> io::Result<()> {
    for result in results {
        writeln!(ss3_writer, ">{}", result.id)?;
        writeln!(ss3_writer, "{}", result.ss3)?;
        writeln!(ss8_writer, ">{}", result.id)?;
        writeln!(ss8_writer, "{}", result.ss8)?;
    }
    Ok(())
}

/// Reads a Layout A file back into results.
pub fn read_structure_records<R: BufRead>(reader: R) -> AnnotationResult<Vec<JobResult>> {
    let lines: Vec<String> = reader
        .lines()
        .collect::<io::Result<_>>()
        .map_err(|e| AnnotationError::fs("<structure input>", e))?;

    let malformed = |line: usize, reason: &str| AnnotationError::Format {
        path: PathBuf::from("<structure input>"),
        source: FormatError::MalformedRecord {
            line,
            reason: reason.to_string(),
        },
    };

    if lines.len() % 4 != 0 {
        return Err(malformed(
            lines.len(),
            "expected four lines per record (header, ss3, ss8, disorder)",
        ));
    }

    let mut results = Vec::with_capacity(lines.len() / 4);
    for (idx, record) in lines.chunks(4).enumerate() {
        let header_line = idx * 4 + 1;
        let id = record[0]
            .strip_prefix('>')
            .ok_or_else(|| malformed(header_line, "header must start with '>'"))?;
        results.push(JobResult {
            id: id.to_string(),
            ss3: record[1].clone(),
            ss8: record[2].clone(),
            disorder: Some(record[3].clone()),
        });
    }
    Ok(results)
}

pub fn output_paths(output_dir: &Path, name: &str, layout: OutputLayout) -> Vec<PathBuf> {
    match layout {
        OutputLayout::Combined => vec![output_dir.join(format!("{}.{}", name, STRUCTURE_EXTENSION))],
        OutputLayout::Split => vec![
            output_dir.join(format!("{}.{}", name, SS3_EXTENSION)),
            output_dir.join(format!("{}.{}", name, SS8_EXTENSION)),
        ],
    }
}

fn staged_file(output_dir: &Path) -> AnnotationResult<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(output_dir)
        .map_err(|e| AnnotationError::fs(output_dir, e))
}

fn finish(staged: NamedTempFile, target: &Path) -> AnnotationResult<()> {
    staged
        .persist(target)
        .map_err(|e| AnnotationError::fs(target, e.error))?;
    Ok(())
}

/// Writes results in the given layout. Files are staged next to their
/// targets and only moved into place once every record was written.
pub fn write_output(
    output_dir: &Path,
    name: &str,
    layout: OutputLayout,
    results: &[JobResult],
) -> AnnotationResult<Vec<PathBuf>> {
    let targets = output_paths(output_dir, name, layout);

    match layout {
        OutputLayout::Combined => {
            let staged = staged_file(output_dir)?;
            {
                let mut writer = BufWriter::new(staged.as_file());
                write_structure_records(&mut writer, results)
                    .and_then(|_| writer.flush())
                    .map_err(|e| AnnotationError::fs(&targets[0], e))?;
            }
            finish(staged, &targets[0])?;
        }
        OutputLayout::Split => {
            let ss3 = staged_file(output_dir)?;
            let ss8 = staged_file(output_dir)?;
            {
                let mut ss3_writer = BufWriter::new(ss3.as_file());
                let mut ss8_writer = BufWriter::new(ss8.as_file());
                write_split_records(&mut ss3_writer, &mut ss8_writer, results)
                    .and_then(|_| ss3_writer.flush())
                    .and_then(|_| ss8_writer.flush())
                    .map_err(|e| AnnotationError::fs(output_dir, e))?;
            }
            finish(ss3, &targets[0])?;
            finish(ss8, &targets[1])?;
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn result(id: &str, ss3: &str, ss8: &str, disorder: Option<&str>) -> JobResult {
        JobResult {
            id: id.to_string(),
            ss3: ss3.to_string(),
            ss8: ss8.to_string(),
            disorder: disorder.map(str::to_string),
        }
    }

    #[test]
    fn test_structure_layout_lines() {
        let results = vec![
            result("seqA", "CHHE", "CHGE", Some("1100")),
            result("seqB", "CC", "CS", Some("00")),
        ];
        let mut buf = Vec::new();
        write_structure_records(&mut buf, &results).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">seqA\nCHHE\nCHGE\n1100\n>seqB\nCC\nCS\n00\n"
        );
    }

    #[test]
    fn test_structure_layout_round_trip() {
        let results = vec![
            result("sp|P69905|HBA_HUMAN", "CHHHHC", "CHHGGC", Some("110001")),
            result("seqB", "EEC", "EET", Some("000")),
        ];
        let mut buf = Vec::new();
        write_structure_records(&mut buf, &results).unwrap();

        let parsed = read_structure_records(Cursor::new(buf)).unwrap();
        assert_eq!(parsed, results);
    }

    #[test]
    fn test_structure_layout_requires_disorder() {
        let mut buf = Vec::new();
        let err = write_structure_records(&mut buf, &[result("seqA", "C", "C", None)]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_split_layout_lock_step() {
        let results = vec![
            result("seqA", "CHHE", "CHGE", None),
            result("seqB", "CC", "CS", None),
        ];
        let mut ss3 = Vec::new();
        let mut ss8 = Vec::new();
        write_split_records(&mut ss3, &mut ss8, &results).unwrap();

        assert_eq!(String::from_utf8(ss3).unwrap(), ">seqA\nCHHE\n>seqB\nCC\n");
        assert_eq!(String::from_utf8(ss8).unwrap(), ">seqA\nCHGE\n>seqB\nCS\n");
    }

    #[test]
    fn test_read_rejects_truncated_record() {
        let err = read_structure_records(Cursor::new(">seqA\nCHHE\nCHGE\n")).unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::Format {
                source: FormatError::MalformedRecord { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_write_output_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![result("seqA", "CHHE", "CHGE", None)];

        let written = write_output(dir.path(), "proteins", OutputLayout::Split, &results).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("proteins.ss3"), dir.path().join("proteins.ss8")]
        );

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["proteins.ss3", "proteins.ss8"]);
    }

    #[test]
    fn test_failed_combined_write_produces_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![result("seqA", "CHHE", "CHGE", None)];

        assert!(write_output(dir.path(), "proteins", OutputLayout::Combined, &results).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
