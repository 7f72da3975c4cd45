use shared::domain::EntityKind;
use thiserror::Error;

use crate::forms::FormErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {path} failed with HTTP {status}: {message}")]
    Http {
        path: String,
        status: u16,
        message: String,
    },
    #[error("transport failure calling {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("form has {} invalid field(s)", .0.len())]
    Validation(FormErrors),
    #[error("{operation} is not available for {kind}")]
    Unsupported {
        kind: EntityKind,
        operation: &'static str,
    },
    #[error("no delete is awaiting confirmation")]
    NoPendingDelete,
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ClientError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
