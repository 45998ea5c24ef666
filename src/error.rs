//! Error types for every layer of the playlist pipeline.
//!
//! Each collaborator has its own error enum; [`PipelineError`] is the single
//! structured failure a run returns. None of these carry access or refresh
//! tokens in their messages.

use thiserror::Error;

/// Failures reported by a [`crate::catalog::MusicCatalog`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// 401/403 from the music service
    #[error("Authorization rejected ({0})")]
    Unauthorized(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CatalogError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else if err.is_decode() {
            CatalogError::Parse(err.to_string())
        } else {
            CatalogError::Network(err.without_url().to_string())
        }
    }
}

/// Failures reported by a [`crate::llm::LanguageModel`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Empty or unreadable completion: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::Malformed(err.to_string())
        } else {
            LlmError::Network(err.without_url().to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Language model unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Language model returned a malformed playlist: {0}")]
    MalformedResponse(String),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Malformed(msg) => GenerationError::MalformedResponse(msg),
            other => GenerationError::UpstreamUnavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Credential expired and could not be refreshed: {0}")]
    AuthenticationExpired(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A search was rejected for authorization; the batch must be restarted
    /// with a refreshed credential.
    #[error("Catalog search rejected the credential")]
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Cannot load environment file: {0}")]
    Env(String),
}

/// Classification of a run's outcome, used in logs and HTTP replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidPrompt,
    QuotaExceeded,
    AccountNotFound,
    GenerationError,
    AuthenticationExpired,
    AssemblyError,
    Cancelled,
    Store,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidPrompt => "invalid_prompt",
            FailureKind::QuotaExceeded => "quota_exceeded",
            FailureKind::AccountNotFound => "account_not_found",
            FailureKind::GenerationError => "generation_error",
            FailureKind::AuthenticationExpired => "authentication_expired",
            FailureKind::AssemblyError => "assembly_error",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Store => "store_error",
        }
    }
}

/// Fatal failure of one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Prompt must not be empty")]
    InvalidPrompt,

    #[error("{reason}")]
    QuotaExceeded { reason: String },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Authentication expired: {0}")]
    AuthenticationExpired(String),

    #[error("Playlist creation failed: {0}")]
    Assembly(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Usage store error: {0}")]
    Store(String),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::InvalidPrompt => FailureKind::InvalidPrompt,
            PipelineError::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            PipelineError::AccountNotFound(_) => FailureKind::AccountNotFound,
            PipelineError::Generation(_) => FailureKind::GenerationError,
            PipelineError::AuthenticationExpired(_) => FailureKind::AuthenticationExpired,
            PipelineError::Assembly(_) => FailureKind::AssemblyError,
            PipelineError::Cancelled => FailureKind::Cancelled,
            PipelineError::Store(_) => FailureKind::Store,
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => PipelineError::AccountNotFound(id),
            other => PipelineError::Store(other.to_string()),
        }
    }
}
