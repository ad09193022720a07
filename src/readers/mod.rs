pub mod fasta;

pub use fasta::{read_records, write_single_record};
