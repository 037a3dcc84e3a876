use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Size must be greater than 0, got: {arg}={size}")]
    ZeroSize { arg: &'static str, size: usize },

    #[error("Crop size {crop} is larger than scale size {scale}")]
    CropLargerThanScale { crop: usize, scale: usize },

    #[error("Noise scale must be finite and non-negative, got: {0}")]
    InvalidNoise(f64),

    #[error("featprep error: {0}")]
    Lib(#[from] featprep::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
