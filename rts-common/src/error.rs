//! Common error types for RTS Board
//!
//! Two families live here:
//! - [`Error`]: configuration and I/O failures outside the ingestion path
//! - [`IngestError`]: everything that can go wrong while producing a dataset

use thiserror::Error;

/// Common result type for RTS Board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across RTS Board crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Ingestion failure taxonomy
///
/// Every variant is caught at the scheduler boundary and turned into the
/// dashboard's error string; none of them terminate the process.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Upstream answered with a non-success HTTP status
    #[error("Failed to fetch sheet: HTTP {status}")]
    Fetch { status: u16 },

    /// Upstream answered 2xx with an HTML page instead of CSV
    #[error("Sheet returned an HTML page instead of CSV data")]
    PrivateSheet,

    /// Transport failure without any HTTP status
    #[error("Sheet could not be reached: {0}")]
    AccessRestricted(String),

    /// Other network failure (timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed delimited content
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unexpected failure while building records
    #[error("Record coercion error: {0}")]
    Coercion(String),

    /// Local file could not be read
    #[error("File read error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Stable machine-readable discriminator for API consumers
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Fetch { .. } => "fetch",
            IngestError::PrivateSheet => "private_sheet",
            IngestError::AccessRestricted(_) => "access_restricted",
            IngestError::Network(_) => "network",
            IngestError::Parse(_) => "parse",
            IngestError::Coercion(_) => "coercion",
            IngestError::Io(_) => "io",
        }
    }

    /// Whether the consumer should steer the user to the file-upload fallback
    pub fn suggests_upload(&self) -> bool {
        matches!(
            self,
            IngestError::AccessRestricted(_) | IngestError::PrivateSheet
        )
    }

    /// Message shown to the user in place of the dataset
    pub fn user_message(&self) -> String {
        match self {
            IngestError::Fetch { status } => {
                format!("Error fetching data: HTTP {}. Check the sheet id and tab name.", status)
            }
            IngestError::PrivateSheet => {
                "The sheet is not public. Publish it to the web (File > Share > Publish to web) \
                 or upload the CSV file manually."
                    .to_string()
            }
            IngestError::AccessRestricted(_) => {
                "Access to the sheet was blocked or the network is unavailable. \
                 Upload the CSV file manually."
                    .to_string()
            }
            IngestError::Network(detail) => format!("Network error while loading data: {}", detail),
            IngestError::Parse(detail) => format!("Could not read the CSV data: {}", detail),
            IngestError::Coercion(detail) => format!("Could not build records: {}", detail),
            IngestError::Io(e) => format!("Could not read the file: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(IngestError::Fetch { status: 404 }.kind(), "fetch");
        assert_eq!(IngestError::PrivateSheet.kind(), "private_sheet");
        assert_eq!(IngestError::AccessRestricted("x".into()).kind(), "access_restricted");
        assert_eq!(IngestError::Network("x".into()).kind(), "network");
        assert_eq!(IngestError::Parse("x".into()).kind(), "parse");
        assert_eq!(IngestError::Coercion("x".into()).kind(), "coercion");
    }

    #[test]
    fn test_upload_suggested_only_for_access_problems() {
        assert!(IngestError::AccessRestricted("refused".into()).suggests_upload());
        assert!(IngestError::PrivateSheet.suggests_upload());
        assert!(!IngestError::Fetch { status: 500 }.suggests_upload());
        assert!(!IngestError::Network("timeout".into()).suggests_upload());
        assert!(!IngestError::Parse("bad".into()).suggests_upload());
    }

    #[test]
    fn test_fetch_message_carries_status() {
        let err = IngestError::Fetch { status: 403 };
        assert!(err.to_string().contains("403"));
        assert!(err.user_message().contains("403"));
    }
}
