use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Unsupported data file: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("No options configured")]
    NoOptions,

    #[error("Duplicate option key: {0}")]
    DuplicateKey(String),

    #[error("Default option '{0}' is not a registered option")]
    UnknownDefault(String),

    #[error("Column '{0}' not found")]
    MissingColumn(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io(_)
            | Error::Csv(_)
            | Error::Excel(_)
            | Error::SheetNotFound { .. }
            | Error::UnsupportedFormat(_) => 2,
            Error::Toml(_)
            | Error::Json(_)
            | Error::NoOptions
            | Error::DuplicateKey(_)
            | Error::UnknownDefault(_)
            | Error::MissingColumn(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
