pub mod predictions;
pub mod structure;

pub use predictions::{parse_disorder_table, parse_structure_table, read_disorder_file, read_structure_file};
pub use structure::{read_structure_records, write_output};
