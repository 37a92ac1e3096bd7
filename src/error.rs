use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("API request failed: {0}")]
    Transport(String),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API response was not valid JSON: {0}")]
    Decode(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{kind} not found for observation {observation_id}")]
    LookupNotFound {
        kind: LookupKind,
        observation_id: u64,
    },

    #[error("inserting record {id} failed: {message}")]
    Persistence { id: u64, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("missing config file inat-import.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing credential in config: {0}")]
    MissingCredential(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Location,
    Taxonomy,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::Location => write!(f, "location"),
            LookupKind::Taxonomy => write!(f, "taxonomy"),
        }
    }
}

/// Coarse classification behind exit codes and lookup failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TransportFailure,
    AuthFailure,
    LookupNotFound,
    PersistenceFailure,
    Setup,
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::Transport(_) | ImportError::Status { .. } | ImportError::Decode(_) => {
                ErrorKind::TransportFailure
            }
            ImportError::Auth(_) => ErrorKind::AuthFailure,
            ImportError::LookupNotFound { .. } => ErrorKind::LookupNotFound,
            ImportError::Persistence { .. } => ErrorKind::PersistenceFailure,
            ImportError::Database(_)
            | ImportError::MissingConfig
            | ImportError::ConfigRead(_)
            | ImportError::ConfigParse(_)
            | ImportError::MissingCredential(_) => ErrorKind::Setup,
        }
    }
}

/// Messages collected during a run and printed once it finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ErrorLog(Vec<String>);

impl ErrorLog {
    pub fn push(&mut self, message: impl std::fmt::Display) {
        let message = message.to_string();
        tracing::warn!("{message}");
        self.0.push(message);
    }

    pub fn record(&mut self, error: &ImportError) {
        self.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|message| message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_message_names_observation() {
        let err = ImportError::LookupNotFound {
            kind: LookupKind::Taxonomy,
            observation_id: 42,
        };
        assert_eq!(err.to_string(), "taxonomy not found for observation 42");
        assert_eq!(err.kind(), ErrorKind::LookupNotFound);
    }

    #[test]
    fn status_errors_are_transport_failures() {
        let err = ImportError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }
}
