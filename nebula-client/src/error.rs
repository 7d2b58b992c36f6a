//! Error types for the control plane client.

use thiserror::Error;

/// Errors that can occur while talking to the control plane.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network, HTTP or serialization failure below the call envelope.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The XML-RPC server answered with a `<fault>` instead of a result.
    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// The remote procedure ran and reported a failure.
    #[error("{0}")]
    Remote(RemoteError),

    /// A local check failed before any remote call was attempted.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A response payload was not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// The result array did not follow the `(success, payload, code[, id])` convention.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A blueprint could not be rendered into a template.
    #[error("Failed to render template: {0}")]
    Render(String),

    /// A wire value is outside the lookup table of a closed enumeration.
    #[error("Unknown {kind} value: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// Endpoint or credentials could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// The remote error, if this is a remote-reported failure.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ClientError::Remote(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn unknown(kind: &'static str, value: impl ToString) -> Self {
        ClientError::UnknownValue { kind, value: value.to_string() }
    }
}

impl From<RemoteError> for ClientError {
    fn from(err: RemoteError) -> Self {
        ClientError::Remote(err)
    }
}

/// Failure reported by the control plane in a result array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code:#06x})")]
pub struct RemoteError {
    /// Human readable message (second element of the result array).
    pub message: String,
    /// Numeric error code (third element).
    pub code: i32,
    /// ID of the object that caused the failure, when the server sent a fourth element.
    pub object_id: Option<i32>,
}

impl RemoteError {
    /// Classify the numeric code, `None` for codes outside the known set.
    pub fn kind(&self) -> Option<RemoteErrorKind> {
        RemoteErrorKind::from_code(self.code)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(RemoteErrorKind::NoExists)
    }
}

/// Error classes of the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    Authentication,
    Authorization,
    NoExists,
    Action,
    XmlRpcApi,
    Internal,
    Allocate,
    Locked,
}

impl RemoteErrorKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0x0100 => Some(Self::Authentication),
            0x0200 => Some(Self::Authorization),
            0x0400 => Some(Self::NoExists),
            0x0800 => Some(Self::Action),
            0x1000 => Some(Self::XmlRpcApi),
            0x2000 => Some(Self::Internal),
            0x4000 => Some(Self::Allocate),
            0x8000 => Some(Self::Locked),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Authentication => 0x0100,
            Self::Authorization => 0x0200,
            Self::NoExists => 0x0400,
            Self::Action => 0x0800,
            Self::XmlRpcApi => 0x1000,
            Self::Internal => 0x2000,
            Self::Allocate => 0x4000,
            Self::Locked => 0x8000,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
