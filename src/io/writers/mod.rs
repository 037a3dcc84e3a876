//! Output writers: Kaldi text matrices, label files and JSON sidecars.
pub mod kaldi;
pub mod labels;
pub mod sidecar;

pub use kaldi::{open_output, parse_kaldi_text, write_kaldi_matrix, write_kaldi_rows};
pub use labels::LabelWriter;
pub use sidecar::write_json_sidecar;
