//! Error types for omgraph operations.
//!
//! Every fallible operation in the crate returns [`GraphResult`]. Errors carry a
//! structured [`ErrorCode`] so callers can branch on the failure class without
//! matching on message text.

use thiserror::Error;

/// Result type alias for omgraph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Main error type for all omgraph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A query builder or store request failed validation.
    #[error("Validation error: {message}")]
    Validation { message: String, code: ErrorCode },

    /// The value handed to the mapper is not a struct.
    #[error("Mapping error: {type_name} is not a struct")]
    NotAStruct { type_name: String },

    /// A property key has no counterpart in the destination struct.
    #[error("Mapping error: unknown field {key}")]
    UnknownProperty { key: String },

    /// A field tag references a field the struct does not declare.
    #[error("Mapping error: tag {tag} refers to unknown field {field} on {type_name}")]
    UnknownField {
        type_name: String,
        field: String,
        tag: String,
    },

    /// Two fields of a struct resolve to the same property key.
    #[error("Mapping error: fields {first} and {second} of {type_name} both map to property {key}")]
    DuplicateProperty {
        type_name: String,
        key: String,
        first: String,
        second: String,
    },

    /// Converting property values into struct fields failed.
    #[error("Mapping error: failed to decode {type_name}: {source}")]
    Decode {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backing graph database reported a failure.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No connector is registered for the requested graph type.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValMissingLabel,
    ValMultipleEdgeLabels,
    ValMissingEndpoint,
    ValInvalidRelation,
    ValKindMismatch,

    // Mapping (MAP_xxx)
    MapNotAStruct,
    MapUnknownProperty,
    MapUnknownField,
    MapDecodeFailed,
    MapDuplicateProperty,

    // Connection (CONN_xxx)
    ConnFailed,
    ConnOperationFailed,
    ConnUnexpectedResult,
    ConnTimeout,
    ConnUnsupported,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValMissingLabel => "VAL_001",
            ErrorCode::ValMultipleEdgeLabels => "VAL_002",
            ErrorCode::ValMissingEndpoint => "VAL_003",
            ErrorCode::ValInvalidRelation => "VAL_004",
            ErrorCode::ValKindMismatch => "VAL_005",
            ErrorCode::MapNotAStruct => "MAP_001",
            ErrorCode::MapUnknownProperty => "MAP_002",
            ErrorCode::MapUnknownField => "MAP_003",
            ErrorCode::MapDecodeFailed => "MAP_004",
            ErrorCode::MapDuplicateProperty => "MAP_005",
            ErrorCode::ConnFailed => "CONN_001",
            ErrorCode::ConnOperationFailed => "CONN_002",
            ErrorCode::ConnUnexpectedResult => "CONN_003",
            ErrorCode::ConnTimeout => "CONN_004",
            ErrorCode::ConnUnsupported => "CONN_005",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl GraphError {
    /// Create a validation error with the given code.
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code,
        }
    }

    /// Create a connection error that keeps the underlying driver error.
    pub fn connection_with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            code,
            source: Some(Box::new(source)),
        }
    }

    /// Create an error for a backend response that does not have the expected shape.
    pub fn unexpected_result(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnUnexpectedResult,
            source: None,
        }
    }

    /// Create an error for an operation the backend does not support.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnUnsupported,
            source: None,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnTimeout,
            source: None,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotAStruct { .. } => ErrorCode::MapNotAStruct,
            Self::UnknownProperty { .. } => ErrorCode::MapUnknownProperty,
            Self::UnknownField { .. } => ErrorCode::MapUnknownField,
            Self::Decode { .. } => ErrorCode::MapDecodeFailed,
            Self::DuplicateProperty { .. } => ErrorCode::MapDuplicateProperty,
            Self::Connection { code, .. } => *code,
            Self::Configuration(_) | Self::UnsupportedProvider { .. } => ErrorCode::CfgInvalid,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether the error was raised before any backend call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether the error came from the struct mapper.
    pub fn is_mapping(&self) -> bool {
        matches!(
            self,
            Self::NotAStruct { .. }
                | Self::UnknownProperty { .. }
                | Self::UnknownField { .. }
                | Self::Decode { .. }
                | Self::DuplicateProperty { .. }
        )
    }
}
