//! Error translation
//!
//! Converts the status/parse-record pair produced by a native call into
//! either a host-visible failure or a success outcome. Parse records are
//! kept as structured data on the error; they are never folded into the
//! message text.

use std::any::Any;
use std::fmt;

use lingua_sdk::{BridgeError, BridgeResult, HostObject, HostValue, ParseError, StatusCategory, StatusCode};

/// Status and optional parse record of one native call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Native status code
    pub status: StatusCode,
    /// Parse position record, when the call parsed input
    pub parse: Option<ParseError>,
}

impl ErrorEnvelope {
    /// Successful status without parse record
    pub fn ok() -> Self {
        Self::default()
    }

    /// Envelope for a bare status code
    pub fn new(status: StatusCode) -> Self {
        Self { status, parse: None }
    }

    /// Envelope carrying a parse record
    pub fn with_parse(status: StatusCode, parse: ParseError) -> Self {
        Self {
            status,
            parse: Some(parse),
        }
    }
}

impl From<StatusCode> for ErrorEnvelope {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}

/// Outcome of a call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Plain success
    Clean,
    /// Success with a warning code or a non-fatal parse record
    Warning {
        /// Native status (zero or a warning code)
        status: StatusCode,
        /// Parse record reported with the warning
        parse: Option<ParseError>,
    },
}

impl Outcome {
    /// Whether there is anything to inspect
    pub fn is_warning(&self) -> bool {
        matches!(self, Outcome::Warning { .. })
    }
}

/// Translate a native status into a result.
///
/// Failures with a parse record, or with a parse or format-pattern code, become
/// `BridgeError::Parse`; other failures keep their category in
/// `BridgeError::Status`.
pub fn translate(envelope: ErrorEnvelope) -> BridgeResult<Outcome> {
    let ErrorEnvelope { status, parse } = envelope;

    if status.is_failure() {
        return Err(match (parse, status.category()) {
            (Some(error), _) => BridgeError::Parse { code: status, error },
            (None, StatusCategory::Parse | StatusCategory::Format) => BridgeError::Parse {
                code: status,
                error: ParseError::default(),
            },
            (None, _) => BridgeError::status(status),
        });
    }

    if status.is_warning() || parse.is_some() {
        Ok(Outcome::Warning { status, parse })
    } else {
        Ok(Outcome::Clean)
    }
}

/// Fail on a failure status, ignore warnings
pub fn check(status: StatusCode) -> BridgeResult<()> {
    translate(ErrorEnvelope::new(status)).map(|_| ())
}

/// Host value returned by calls that succeeded with a warning.
///
/// Callers inspect `status()` and `parse_error()` explicitly; nothing is
/// raised.
#[derive(Debug, Clone)]
pub struct WarningResult {
    value: HostValue,
    status: StatusCode,
    parse: Option<ParseError>,
}

impl WarningResult {
    /// Attach a warning outcome to a result value.
    ///
    /// Clean outcomes return the value unchanged.
    pub fn wrap(value: HostValue, outcome: Outcome) -> HostValue {
        match outcome {
            Outcome::Clean => value,
            Outcome::Warning { status, parse } => HostValue::object(WarningResult { value, status, parse }),
        }
    }

    /// The call's result
    pub fn value(&self) -> &HostValue {
        &self.value
    }

    /// The warning status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The non-fatal parse record
    pub fn parse_error(&self) -> Option<&ParseError> {
        self.parse.as_ref()
    }
}

impl HostObject for WarningResult {
    fn type_name(&self) -> &str {
        "WarningResult"
    }

    fn call_method(&self, name: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        if !args.is_empty() {
            return Err(BridgeError::InvalidArgument {
                method: format!("WarningResult.{}", name),
                args: args.iter().map(|a| a.type_name().to_string()).collect(),
            });
        }
        match name {
            "getValue" => Ok(self.value.clone()),
            "getStatus" => Ok(HostValue::Int(self.status.code() as i64)),
            "getErrorIndex" => Ok(self
                .parse
                .as_ref()
                .map_or(HostValue::None, |p| HostValue::Int(p.offset as i64))),
            "getPostContext" => Ok(self
                .parse
                .as_ref()
                .map_or(HostValue::None, |p| HostValue::str(&p.post_context))),
            _ => Err(BridgeError::NoSuchMethod {
                class: self.type_name().to_string(),
                method: name.to_string(),
            }),
        }
    }

    fn has_method(&self, name: &str) -> bool {
        matches!(name, "getValue" | "getStatus" | "getErrorIndex" | "getPostContext")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Host exception class created by the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionClass {
    /// Class name
    pub name: String,
    /// Host base class, resolved from the host environment
    pub base: String,
}

/// Exception classes the translator raises
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionClasses {
    /// Raised for native failures (base: host `Exception`)
    pub icu_error: ExceptionClass,
    /// Raised when no call signature matched (base: host `ValueError`)
    pub invalid_args: ExceptionClass,
}

impl ExceptionClasses {
    /// Create the classes on top of the resolved host bases
    pub fn new(exception_base: String, value_error_base: String) -> Self {
        Self {
            icu_error: ExceptionClass {
                name: "ICUError".to_string(),
                base: exception_base,
            },
            invalid_args: ExceptionClass {
                name: "InvalidArgsError".to_string(),
                base: value_error_base,
            },
        }
    }

    /// Class used for `error`
    pub fn class_for(&self, error: &BridgeError) -> &ExceptionClass {
        if error.is_invalid_argument() {
            &self.invalid_args
        } else {
            &self.icu_error
        }
    }
}

/// A host-visible exception value
#[derive(Debug, Clone)]
pub struct HostException {
    /// Exception class
    pub class: ExceptionClass,
    /// The failure, with its structured data
    pub error: BridgeError,
}

impl HostException {
    /// Whether the exception is an instance of `name` (its class or base)
    pub fn is_instance(&self, name: &str) -> bool {
        self.class.name == name || self.class.base == name
    }

    /// Native status code, if any
    pub fn status(&self) -> Option<StatusCode> {
        self.error.status_code()
    }

    /// Structured parse record, if any
    pub fn parse_error(&self) -> Option<&ParseError> {
        self.error.parse_error()
    }
}

impl fmt::Display for HostException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class.name, self.error)
    }
}
