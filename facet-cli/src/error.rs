//! Error types for the command line

use std::path::PathBuf;

use error_stack::Report;
use facet::FacetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Not a Facet Data file, header was {0:?}")]
    MissingHeader(String),

    #[error("Missing tilt line after the header")]
    MissingTilt,

    #[error("Invalid tilt {0:?}")]
    InvalidTilt(String),

    #[error("Line {line}: invalid number {value:?}")]
    InvalidNumber { line: usize, value: String },

    #[error("Facet data is not terminated by END")]
    MissingEnd,

    #[error("Cannot derive a save path from {0}")]
    NoSavePath(PathBuf),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<Report<FacetError>> for CliError {
    fn from(report: Report<FacetError>) -> Self {
        CliError::Engine(format!("{report:?}"))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
