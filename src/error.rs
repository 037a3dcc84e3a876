//! Crate-level error type and `Result` alias for structured error handling.
//! Converts underlying I/O, image decoding, resizing and XML errors, and
//! provides semantic variants for malformed inputs and matrix shapes.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image buffer error: {0}")]
    ImageBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("Resize error: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Matrix is empty")]
    EmptyMatrix,

    #[error("All the rows of a matrix are expected to have the same length: row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Missing field `{field}` in annotation {path:?}")]
    MissingField { field: &'static str, path: PathBuf },

    #[error("Parse error in {path:?} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("MAT-file error in {path:?}: {message}")]
    Mat { path: PathBuf, message: String },

    #[error("Unknown synset: {0}")]
    UnknownSynset(String),

    #[error("PDF id {pdf} out of range for {total} columns")]
    PdfOutOfRange { pdf: usize, total: usize },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Empty image: {0:?}")]
    EmptyImage(PathBuf),
}

impl Error {
    pub fn parse<P: Into<PathBuf>, M: std::fmt::Display>(path: P, line: usize, message: M) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            message: message.to_string(),
        }
    }
}
