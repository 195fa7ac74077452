// src/error.rs
use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The kubeconfig document could not be parsed. Fatal at startup.
    #[error("failed to parse kubeconfig: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("invalid base64 in {field}: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("client certificate and key do not form a valid pair: {0}")]
    InvalidKeyPair(String),

    #[error("invalid certificate authority data: {0}")]
    InvalidCaCert(String),

    #[error("invalid server url {url}: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("failed to query role bindings: {0}")]
    AuthorizationQuery(String),

    #[error("access denied for {0}")]
    Forbidden(String),

    /// No kubeconfig was loaded, or it holds no contexts.
    #[error("no kubeconfig or contexts available")]
    Unavailable,
}

impl Error {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// HTTP status class for per-request failures.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::Unavailable => StatusCode::BAD_REQUEST,
            Self::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Parse(_)
            | Self::Decode { .. }
            | Self::InvalidKeyPair(_)
            | Self::InvalidCaCert(_)
            | Self::InvalidServerUrl { .. }
            | Self::AuthorizationQuery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
