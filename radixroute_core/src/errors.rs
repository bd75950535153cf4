//! Error handling and C-ABI error codes for radixroute

use std::cell::RefCell;
use std::os::raw::c_char;

/// Registration errors raised by `RadixTree::add_route`.
///
/// Every variant carries the pattern that was rejected so a route table
/// misconfiguration can be reported verbatim at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("a handle is already registered for path '{pattern}'")]
    DuplicateRoute { pattern: String },

    #[error(
        "'{segment}' in new path '{pattern}' conflicts with existing wildcard '{existing}' in existing prefix '{prefix}'"
    )]
    WildcardConflict {
        pattern: String,
        segment: String,
        existing: String,
        prefix: String,
    },

    #[error("wildcards must be named with a non-empty name in path '{pattern}'")]
    EmptyWildcardName { pattern: String },

    #[error("only one wildcard per path segment is allowed, has: '{segment}' in path '{pattern}'")]
    MultipleWildcardsInSegment { pattern: String, segment: String },

    #[error("wildcard route '{wildcard}' conflicts with existing children in path '{pattern}'")]
    WildcardBlockedByChildren { pattern: String, wildcard: String },

    #[error("catch-all routes are only allowed at the end of the path in path '{pattern}'")]
    CatchAllNotAtEnd { pattern: String },

    #[error("no / before catch-all in path '{pattern}'")]
    CatchAllMissingSlash { pattern: String },
}

impl Error {
    /// The pattern whose registration failed.
    pub fn pattern(&self) -> &str {
        match self {
            Error::DuplicateRoute { pattern }
            | Error::WildcardConflict { pattern, .. }
            | Error::EmptyWildcardName { pattern }
            | Error::MultipleWildcardsInSegment { pattern, .. }
            | Error::WildcardBlockedByChildren { pattern, .. }
            | Error::CatchAllNotAtEnd { pattern }
            | Error::CatchAllMissingSlash { pattern } => pattern,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    DuplicateRoute = 1,
    WildcardConflict = 2,
    EmptyWildcardName = 3,
    MultipleWildcardsInSegment = 4,
    WildcardBlockedByChildren = 5,
    CatchAllNotAtEnd = 6,
    CatchAllMissingSlash = 7,
    InvalidHandle = 8,
    Utf8Error = 9,
    NotFound = 10,
    BufferTooSmall = 11,
    Unknown = 255,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        self.as_cstr().to_str().unwrap_or("Unknown error")
    }

    fn as_cstr(self) -> &'static std::ffi::CStr {
        match self {
            ErrorCode::Success => c"Success",
            ErrorCode::DuplicateRoute => c"Duplicate route",
            ErrorCode::WildcardConflict => c"Wildcard conflict",
            ErrorCode::EmptyWildcardName => c"Empty wildcard name",
            ErrorCode::MultipleWildcardsInSegment => c"Multiple wildcards in segment",
            ErrorCode::WildcardBlockedByChildren => c"Wildcard blocked by existing children",
            ErrorCode::CatchAllNotAtEnd => c"Catch-all not at end of path",
            ErrorCode::CatchAllMissingSlash => c"Catch-all not preceded by '/'",
            ErrorCode::InvalidHandle => c"Invalid handle",
            ErrorCode::Utf8Error => c"UTF-8 conversion error",
            ErrorCode::NotFound => c"Not found",
            ErrorCode::BufferTooSmall => c"Buffer too small",
            ErrorCode::Unknown => c"Unknown error",
        }
    }
}

// Thread-local last error for C-ABI
thread_local! {
    static LAST_ERROR: RefCell<ErrorCode> = const { RefCell::new(ErrorCode::Success) };
}

pub fn set_last_error(code: ErrorCode) {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = code);
}

pub fn get_last_error() -> ErrorCode {
    LAST_ERROR.with(|cell| *cell.borrow())
}

#[no_mangle]
pub extern "C" fn radix_last_error() -> ErrorCode {
    get_last_error()
}

/// Static, NUL-terminated description of `code`.
#[no_mangle]
pub extern "C" fn radix_strerror(code: ErrorCode) -> *const c_char {
    code.as_cstr().as_ptr()
}

// Map internal Error to ErrorCode
pub fn map_error(e: &Error) -> ErrorCode {
    match e {
        Error::DuplicateRoute { .. } => ErrorCode::DuplicateRoute,
        Error::WildcardConflict { .. } => ErrorCode::WildcardConflict,
        Error::EmptyWildcardName { .. } => ErrorCode::EmptyWildcardName,
        Error::MultipleWildcardsInSegment { .. } => ErrorCode::MultipleWildcardsInSegment,
        Error::WildcardBlockedByChildren { .. } => ErrorCode::WildcardBlockedByChildren,
        Error::CatchAllNotAtEnd { .. } => ErrorCode::CatchAllNotAtEnd,
        Error::CatchAllMissingSlash { .. } => ErrorCode::CatchAllMissingSlash,
    }
}
