//! Spreadsheet sink: the destination every record is appended to.

use async_trait::async_trait;

pub mod client;
pub mod credentials;
pub mod token;

pub use client::{GoogleEndpoints, Worksheet};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Token exchange failed: {0}")]
    Token(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("Spreadsheet {0} has no worksheets")]
    NoWorksheets(String),

    #[error("Invalid API URL: {0}")]
    Url(String),
}

/// Destination that accepts one ordered row per call.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append `row` after the last row of the destination.
    async fn append_row(&self, row: Vec<String>) -> Result<(), SinkError>;

    /// Verify the destination is currently reachable with valid authorization.
    async fn check(&self) -> Result<(), SinkError>;
}
