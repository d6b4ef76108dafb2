use shared::{error::ApiError, validation::ValidationError};
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered 401; the caller is expected to send the user to the
    /// login entry point instead of showing an error.
    #[error("not authenticated")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request failed with status {}: {}", .0.status, .0.message)]
    Api(#[from] ApiError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("invalid session token: {0}")]
    InvalidSessionToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("a save is already in progress")]
    SaveInProgress,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Text suitable for a notice: the raw server message when the server
    /// sent one, otherwise the error description.
    pub fn server_message(&self) -> String {
        match self {
            ClientError::Api(api) if !api.message.is_empty() => api.message.clone(),
            ClientError::Api(api) => format!("status {}", api.status),
            other => other.to_string(),
        }
    }
}
