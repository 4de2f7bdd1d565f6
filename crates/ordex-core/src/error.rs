use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Login form not found")]
    FormNotFound,

    #[error("Credentials rejected by portal (marker: {0})")]
    CredentialRejected(String),

    #[error("Login result is ambiguous: {0}")]
    AmbiguousResult(String),

    #[error("Orders table not found")]
    TableNotFound,

    #[error("Row {row} skipped: {reason}")]
    RowParse { row: usize, reason: String },

    #[error("Invalid relay payload: {0}")]
    Codec(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a failed authentication attempt.
///
/// `AmbiguousResult` is distinct from `CredentialRejected`: the portal gave
/// neither a positive nor a negative signal and the caller must pick a policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Login form not found")]
    FormNotFound,

    #[error("Credentials rejected by portal (marker: {0})")]
    CredentialRejected(String),

    #[error("Login result is ambiguous: {0}")]
    AmbiguousResult(String),
}

impl From<Error> for AuthFailure {
    fn from(err: Error) -> Self {
        match err {
            Error::FormNotFound => AuthFailure::FormNotFound,
            Error::CredentialRejected(marker) => AuthFailure::CredentialRejected(marker),
            Error::AmbiguousResult(reason) => AuthFailure::AmbiguousResult(reason),
            Error::Transport(reason) => AuthFailure::Transport(reason),
            other => AuthFailure::Transport(other.to_string()),
        }
    }
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::Transport(reason) => Error::Transport(reason),
            AuthFailure::FormNotFound => Error::FormNotFound,
            AuthFailure::CredentialRejected(marker) => Error::CredentialRejected(marker),
            AuthFailure::AmbiguousResult(reason) => Error::AmbiguousResult(reason),
        }
    }
}
