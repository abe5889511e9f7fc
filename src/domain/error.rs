use thiserror::Error;

/// Core domain errors
///
/// Errors are `Clone` so the outcome of a single in-flight generation can be
/// delivered unchanged to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Generation error ({kind}): {message}")]
    Generation { kind: String, message: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn generation(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the cache backing storage could not be reached
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Stable snake_case name of the error, recorded as `error_kind` in telemetry
    pub fn kind(&self) -> &str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::Embedding { .. } => "embedding",
            Self::Generation { kind, .. } => kind,
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Configuration { .. } => "configuration",
            Self::Internal { .. } => "internal",
        }
    }
}
