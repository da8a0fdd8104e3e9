use thiserror::Error;

#[derive(Error, Debug)]
pub enum CentralError {
    #[error("Client ID / Client Secret not set")]
    MissingCredentials,

    #[error("Token request failed: {status} {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Whoami: could not determine tenant, data region and API base")]
    IdentityResolutionFailed,

    #[error("Data region / API base not set - log in first")]
    MissingSession,

    #[error("{operation} failed: {status} {body}")]
    UpstreamRequestFailed {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid local site: {0}")]
    InvalidSite(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CentralError>;
