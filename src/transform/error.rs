//! Failure taxonomy for message processing.

use std::fmt;

use thiserror::Error;

/// Stable classification of a per-message failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MalformedPayload,
    MissingField,
    InvalidVersion,
    InvalidDate,
    SinkWriteFailure,
    UnknownTransformError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedPayload => "malformed_payload",
            FailureKind::MissingField => "missing_field",
            FailureKind::InvalidVersion => "invalid_version",
            FailureKind::InvalidDate => "invalid_date",
            FailureKind::SinkWriteFailure => "sink_write_failure",
            FailureKind::UnknownTransformError => "unknown_transform_error",
        }
    }

    /// Whether a later cycle can succeed on the same message.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::SinkWriteFailure)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a message body could not become a record.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("payload is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("invalid app_version {value:?}")]
    InvalidVersion { value: String },

    #[error("invalid create_date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("unexpected error on field `{field}`: {source}")]
    Unknown {
        field: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TransformError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransformError::MalformedPayload(_) | TransformError::NotAnObject(_) => {
                FailureKind::MalformedPayload
            }
            TransformError::MissingField(_) => FailureKind::MissingField,
            TransformError::InvalidVersion { .. } => FailureKind::InvalidVersion,
            TransformError::InvalidDate { .. } => FailureKind::InvalidDate,
            TransformError::Unknown { .. } => FailureKind::UnknownTransformError,
        }
    }

    /// The offending key, when the failure is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            TransformError::MissingField(field) | TransformError::Unknown { field, .. } => {
                Some(field.as_str())
            }
            TransformError::InvalidVersion { .. } => Some("app_version"),
            TransformError::InvalidDate { .. } => Some("create_date"),
            TransformError::MalformedPayload(_) | TransformError::NotAnObject(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
