use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single Beatport lookup or of the authentication step.
/// None of them is fatal to the host; callers log and move on.
#[derive(Debug, Error)]
pub enum BeatportError {
    /// The token was rejected by the API and could not be renewed.
    #[error("beatport token expired or rejected")]
    AuthenticationExpired,

    /// Operator-supplied token was rejected, or no token was supplied.
    #[error("beatport token invalid: {0}")]
    AuthenticationInvalid(String),

    #[error("error connecting to Beatport API: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("error {status} for '{path}'")]
    HttpStatus { status: u16, path: String },

    #[error("invalid JSON in Beatport API response for '{path}': {reason}")]
    MalformedResponse { path: String, reason: String },

    #[error("token file {}: {source}", .path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}

impl BeatportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BeatportError::HttpStatus { status: 404, .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            BeatportError::AuthenticationExpired | BeatportError::AuthenticationInvalid(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BeatportError>;
