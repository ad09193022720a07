use crate::error::{AnnotationError, AnnotationResult};
use crate::types::SequenceRecord;
use bio::io::fasta;
use niffler::get_reader;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

// niffler needs this many bytes to sniff a compression format
const MIN_SNIFF_LEN: u64 = 5;

/// Reads every record of a (optionally compressed) FASTA file.
pub fn read_records(path: &Path) -> AnnotationResult<Vec<SequenceRecord>> {
    let file = File::open(path).map_err(|e| AnnotationError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let len = file.metadata().map(|m| m.len()).unwrap_or(MIN_SNIFF_LEN);
    let inner_reader: Box<dyn Read> = if len < MIN_SNIFF_LEN {
        // too short to be compressed, read as plain text
        Box::new(file)
    } else {
        let (reader, _compression) =
            get_reader(Box::new(file)).map_err(|e| AnnotationError::Input {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        reader
    };

    parse_records(inner_reader).map_err(|reason| AnnotationError::Input {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_records(input: Box<dyn Read>) -> Result<Vec<SequenceRecord>, String> {
    let reader = fasta::Reader::new(BufReader::new(input));
    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("record {}: {}", idx + 1, e))?;
        if record.id().is_empty() {
            return Err(format!("record {} has an empty header", idx + 1));
        }
        records.push(SequenceRecord::new(
            record.id(),
            String::from_utf8_lossy(record.seq()).into_owned(),
        ));
    }

    Ok(records)
}

/// Writes a single-record FASTA file, used as predictor input.
pub fn write_single_record(path: &Path, id: &str, sequence: &str) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = fasta::Writer::new(BufWriter::new(file));
    writer.write(id, None, sequence.as_bytes())?;
    writer.flush()
}
