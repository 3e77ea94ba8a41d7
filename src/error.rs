use std::path::PathBuf;
use thiserror::Error;

use crate::backend::SendSummary;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("'{0}' is not an Excel file. Select a .xlsx or .xls file.")]
    InvalidFileType(String),

    #[error("Both spreadsheets must be loaded before analysis (clients and portfolio)")]
    FilesNotReady,

    #[error("Request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Server rejected the request: {0}")]
    Rejected(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("No clients selected")]
    NothingSelected,

    #[error("Invalid client '{0}'. Expected 'Name|email' (e.g., 'Acme S.A.S|pagos@acme.co')")]
    InvalidClientKey(String),

    /// A later batch failed after earlier ones were already emailed
    #[error("Batch {batch} of {of} failed, {} emails from earlier batches were already sent: {source}", .delivered.succeeded)]
    PartialSend {
        batch: usize,
        of: usize,
        delivered: Box<SendSummary>,
        #[source]
        source: Box<ReminderError>,
    },

    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReminderError>;
