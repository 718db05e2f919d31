//! Error types for the chat report pipeline

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unrecognized timestamp in column {column} at line {line}: {value:?}")]
    InvalidTimestamp {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("CSV error: {0}")]
    CsvError(String),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No file uploaded!")]
    NoUpload,

    #[error("No report file found.")]
    ReportNotFound,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors caused by the content of the input table rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::MissingColumn(_) | Error::InvalidTimestamp { .. } | Error::CsvError(_)
        )
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::CsvError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::SpreadsheetError(err.to_string())
    }
}
