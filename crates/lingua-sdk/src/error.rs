//! Error types for the lingua bridge

use std::fmt;

use crate::status::{StatusCategory, StatusCode};

/// Result type for bridge calls
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Structured parse-error record reported by the native library.
///
/// `line` is `None` when the native side reports offsets into a single
/// string rather than line/column positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseError {
    /// Offset of the offending token (within `line` when present)
    pub offset: usize,
    /// Line number, if the input is line-oriented
    pub line: Option<usize>,
    /// Text preceding the offending token
    pub pre_context: String,
    /// Offending token and the text following it
    pub post_context: String,
}

impl ParseError {
    /// Build a record from the input text and the failing offset.
    ///
    /// Context windows are limited to 16 characters, like the native record.
    pub fn at(text: &str, offset: usize) -> Self {
        const CONTEXT_LEN: usize = 16;
        let chars: Vec<char> = text.chars().collect();
        let offset = offset.min(chars.len());
        let start = offset.saturating_sub(CONTEXT_LEN - 1);
        let end = (offset + CONTEXT_LEN - 1).min(chars.len());
        ParseError {
            offset,
            line: None,
            pre_context: chars[start..offset].iter().collect(),
            post_context: chars[offset..end].iter().collect(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}, offset {}", line, self.offset)?,
            None => write!(f, "offset {}", self.offset)?,
        }
        write!(f, " near {:?}|{:?}", self.pre_context, self.post_context)
    }
}

/// Bridge error kinds
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// No call signature accepted the supplied arguments
    #[error("{method}(): invalid arguments ({})", .args.join(", "))]
    InvalidArgument {
        /// Qualified method name (`Class.method`)
        method: String,
        /// Host type names of the supplied arguments
        args: Vec<String>,
    },

    /// A native call reported a failure status
    #[error("{code}: native {category} error")]
    Status {
        /// Native status code
        code: StatusCode,
        /// Category of the code
        category: StatusCategory,
    },

    /// A native call failed while parsing rules, patterns or text
    #[error("{code}: parse error at {error}")]
    Parse {
        /// Native status code
        code: StatusCode,
        /// Structured position of the failure
        error: ParseError,
    },

    /// Handle ownership invariant broken
    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),

    /// A host method invoked through an upcall proxy failed
    #[error("Upcall {method}() failed: {reason}")]
    UpcallFailed {
        /// Host method name
        method: String,
        /// Failure description
        reason: String,
    },

    /// Upcalls nested deeper than the configured limit
    #[error("Upcall {method}() exceeded maximum depth {limit}")]
    UpcallDepthExceeded {
        /// Host method name
        method: String,
        /// Configured depth limit
        limit: usize,
    },

    /// Host code panicked during an upcall
    #[error("Upcall panicked: {0}")]
    Panic(String),

    /// Method lookup failed
    #[error("'{class}' object has no method '{method}'")]
    NoSuchMethod {
        /// Class name
        class: String,
        /// Method name
        method: String,
    },

    /// Class lookup failed
    #[error("Unknown class '{0}'")]
    NoSuchClass(String),

    /// Attempt to construct an abstract class
    #[error("Cannot instantiate abstract class '{0}'")]
    Abstract(String),

    /// Value was not of the expected type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Exception raised by host code
    #[error("{kind}: {message}")]
    Host {
        /// Host exception class name
        kind: String,
        /// Message
        message: String,
    },

    /// Module initialization failure
    #[error("Module error: {0}")]
    Module(String),
}

impl BridgeError {
    /// Exception raised by host code
    pub fn host(kind: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Host {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Failure status from a native call
    pub fn status(code: StatusCode) -> Self {
        BridgeError::Status {
            code,
            category: code.category(),
        }
    }

    /// Native status code carried by this error, if any
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            BridgeError::Status { code, .. } | BridgeError::Parse { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Structured parse record carried by this error, if any
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            BridgeError::Parse { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether this is an argument-mismatch error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BridgeError::InvalidArgument { .. })
    }
}

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::host("RuntimeError", s)
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::host("RuntimeError", s)
    }
}
