//! Native status codes
//!
//! Status codes follow the numbering of the wrapped library: zero is
//! success, negative values are warnings, positive values are failures.
//! Dedicated ranges hold parse errors (`0x10000..`) and format errors
//! (`0x10100..`).

use std::fmt;

/// A native status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StatusCode(pub i32);

/// Coarse failure category preserved on host exceptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Success or warning
    None,
    /// Allocation or buffer capacity failure
    Memory,
    /// Bad argument value
    IllegalArgument,
    /// Object not in a state that allows the call
    IllegalState,
    /// Operation not supported
    Unsupported,
    /// Locale data or resource not found
    MissingResource,
    /// Index out of bounds
    IndexOutOfBounds,
    /// Rule or text parse failure
    Parse,
    /// Format pattern failure
    Format,
    /// Internal library error
    Internal,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusCategory::None => "no",
            StatusCategory::Memory => "memory",
            StatusCategory::IllegalArgument => "illegal-argument",
            StatusCategory::IllegalState => "illegal-state",
            StatusCategory::Unsupported => "unsupported",
            StatusCategory::MissingResource => "locale-data-missing",
            StatusCategory::IndexOutOfBounds => "index-out-of-bounds",
            StatusCategory::Parse => "parse",
            StatusCategory::Format => "format",
            StatusCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

const PARSE_ERROR_START: i32 = 0x10000;
const PARSE_ERROR_LIMIT: i32 = 0x10100;
const FMT_PARSE_ERROR_START: i32 = 0x10100;
const FMT_PARSE_ERROR_LIMIT: i32 = 0x10120;

#[allow(missing_docs)]
impl StatusCode {
    // Warnings
    pub const USING_FALLBACK_WARNING: StatusCode = StatusCode(-128);
    pub const USING_DEFAULT_WARNING: StatusCode = StatusCode(-127);
    pub const SAFECLONE_ALLOCATED_WARNING: StatusCode = StatusCode(-126);
    pub const STATE_OLD_WARNING: StatusCode = StatusCode(-125);
    pub const STRING_NOT_TERMINATED_WARNING: StatusCode = StatusCode(-124);

    pub const ZERO_ERROR: StatusCode = StatusCode(0);

    // Standard errors
    pub const ILLEGAL_ARGUMENT_ERROR: StatusCode = StatusCode(1);
    pub const MISSING_RESOURCE_ERROR: StatusCode = StatusCode(2);
    pub const INVALID_FORMAT_ERROR: StatusCode = StatusCode(3);
    pub const FILE_ACCESS_ERROR: StatusCode = StatusCode(4);
    pub const INTERNAL_PROGRAM_ERROR: StatusCode = StatusCode(5);
    pub const MESSAGE_PARSE_ERROR: StatusCode = StatusCode(6);
    pub const MEMORY_ALLOCATION_ERROR: StatusCode = StatusCode(7);
    pub const INDEX_OUTOFBOUNDS_ERROR: StatusCode = StatusCode(8);
    pub const PARSE_ERROR: StatusCode = StatusCode(9);
    pub const INVALID_CHAR_FOUND: StatusCode = StatusCode(10);
    pub const TRUNCATED_CHAR_FOUND: StatusCode = StatusCode(11);
    pub const ILLEGAL_CHAR_FOUND: StatusCode = StatusCode(12);
    pub const INVALID_TABLE_FORMAT: StatusCode = StatusCode(13);
    pub const INVALID_TABLE_FILE: StatusCode = StatusCode(14);
    pub const BUFFER_OVERFLOW_ERROR: StatusCode = StatusCode(15);
    pub const UNSUPPORTED_ERROR: StatusCode = StatusCode(16);
    pub const RESOURCE_TYPE_MISMATCH: StatusCode = StatusCode(17);
    pub const ILLEGAL_ESCAPE_SEQUENCE: StatusCode = StatusCode(18);
    pub const UNSUPPORTED_ESCAPE_SEQUENCE: StatusCode = StatusCode(19);
    pub const NO_SPACE_AVAILABLE: StatusCode = StatusCode(20);
    pub const INVALID_STATE_ERROR: StatusCode = StatusCode(27);
    pub const NO_WRITE_PERMISSION: StatusCode = StatusCode(30);

    // Rule parse errors
    pub const BAD_VARIABLE_DEFINITION: StatusCode = StatusCode(0x10000);
    pub const MALFORMED_RULE: StatusCode = StatusCode(0x10001);
    pub const MALFORMED_SET: StatusCode = StatusCode(0x10002);
    pub const MALFORMED_SYMBOL_REFERENCE: StatusCode = StatusCode(0x10003);
    pub const TRAILING_BACKSLASH: StatusCode = StatusCode(0x10010);
    pub const INVALID_ID: StatusCode = StatusCode(0x10021);

    // Format pattern errors
    pub const UNEXPECTED_TOKEN: StatusCode = StatusCode(0x10100);
    pub const MULTIPLE_DECIMAL_SEPARATORS: StatusCode = StatusCode(0x10101);
    pub const MULTIPLE_EXPONENTIAL_SYMBOLS: StatusCode = StatusCode(0x10102);
    pub const MALFORMED_EXPONENTIAL_PATTERN: StatusCode = StatusCode(0x10103);
    pub const MULTIPLE_PERCENT_SYMBOLS: StatusCode = StatusCode(0x10104);
    pub const PATTERN_SYNTAX_ERROR: StatusCode = StatusCode(0x10107);

    /// Raw numeric value
    pub fn code(self) -> i32 {
        self.0
    }

    /// `U_SUCCESS`: zero or a warning
    pub fn is_success(self) -> bool {
        self.0 <= 0
    }

    /// `U_FAILURE`
    pub fn is_failure(self) -> bool {
        self.0 > 0
    }

    /// Negative codes are non-fatal warnings
    pub fn is_warning(self) -> bool {
        self.0 < 0
    }

    /// Failure category of this code
    pub fn category(self) -> StatusCategory {
        match self.0 {
            c if c <= 0 => StatusCategory::None,
            7 | 15 | 20 => StatusCategory::Memory,
            1 | 10 | 11 | 12 | 18 => StatusCategory::IllegalArgument,
            27 | 23 | 25 | 30 => StatusCategory::IllegalState,
            16 | 19 | 29 => StatusCategory::Unsupported,
            2 | 4 | 13 | 14 | 17 | 24 | 28 => StatusCategory::MissingResource,
            8 => StatusCategory::IndexOutOfBounds,
            6 | 9 => StatusCategory::Parse,
            3 => StatusCategory::Format,
            c if (PARSE_ERROR_START..PARSE_ERROR_LIMIT).contains(&c) => StatusCategory::Parse,
            c if (FMT_PARSE_ERROR_START..FMT_PARSE_ERROR_LIMIT).contains(&c) => {
                StatusCategory::Format
            }
            _ => StatusCategory::Internal,
        }
    }

    /// Symbolic name, `U_`-prefixed like the native `u_errorName`
    pub fn name(self) -> &'static str {
        match self.0 {
            -128 => "U_USING_FALLBACK_WARNING",
            -127 => "U_USING_DEFAULT_WARNING",
            -126 => "U_SAFECLONE_ALLOCATED_WARNING",
            -125 => "U_STATE_OLD_WARNING",
            -124 => "U_STRING_NOT_TERMINATED_WARNING",
            0 => "U_ZERO_ERROR",
            1 => "U_ILLEGAL_ARGUMENT_ERROR",
            2 => "U_MISSING_RESOURCE_ERROR",
            3 => "U_INVALID_FORMAT_ERROR",
            4 => "U_FILE_ACCESS_ERROR",
            5 => "U_INTERNAL_PROGRAM_ERROR",
            6 => "U_MESSAGE_PARSE_ERROR",
            7 => "U_MEMORY_ALLOCATION_ERROR",
            8 => "U_INDEX_OUTOFBOUNDS_ERROR",
            9 => "U_PARSE_ERROR",
            10 => "U_INVALID_CHAR_FOUND",
            11 => "U_TRUNCATED_CHAR_FOUND",
            12 => "U_ILLEGAL_CHAR_FOUND",
            13 => "U_INVALID_TABLE_FORMAT",
            14 => "U_INVALID_TABLE_FILE",
            15 => "U_BUFFER_OVERFLOW_ERROR",
            16 => "U_UNSUPPORTED_ERROR",
            17 => "U_RESOURCE_TYPE_MISMATCH",
            18 => "U_ILLEGAL_ESCAPE_SEQUENCE",
            19 => "U_UNSUPPORTED_ESCAPE_SEQUENCE",
            20 => "U_NO_SPACE_AVAILABLE",
            27 => "U_INVALID_STATE_ERROR",
            30 => "U_NO_WRITE_PERMISSION",
            0x10000 => "U_BAD_VARIABLE_DEFINITION",
            0x10001 => "U_MALFORMED_RULE",
            0x10002 => "U_MALFORMED_SET",
            0x10003 => "U_MALFORMED_SYMBOL_REFERENCE",
            0x10010 => "U_TRAILING_BACKSLASH",
            0x10021 => "U_INVALID_ID",
            0x10100 => "U_UNEXPECTED_TOKEN",
            0x10101 => "U_MULTIPLE_DECIMAL_SEPARATORS",
            0x10102 => "U_MULTIPLE_EXPONENTIAL_SYMBOLS",
            0x10103 => "U_MALFORMED_EXPONENTIAL_PATTERN",
            0x10104 => "U_MULTIPLE_PERCENT_SYMBOLS",
            0x10107 => "U_PATTERN_SYNTAX_ERROR",
            _ => "U_BOGUS_ERROR_CODE",
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::ZERO_ERROR
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
