//! Error codes and completion status.
//!
//! Failed futures carry a [`Code`] from the canonical set shared by gRPC and
//! the Firestore client SDKs, plus a free-form message. The registry never
//! interprets codes, with one exception: [`Code::Ok`] on a failure path marks
//! a success that has no result value.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Error code carried by a completed future.
///
/// Discriminants match the wire numbering, so `as_i32`/`from_i32` agree with
/// any other client of the same code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum Code {
    /// Success.
    Ok = 0,
    /// Abandoned before it finished, usually at the caller's request.
    Cancelled = 1,
    /// No better code applies.
    #[default]
    Unknown = 2,
    /// The request itself was malformed.
    InvalidArgument = 3,
    /// Ran out of time.
    DeadlineExceeded = 4,
    /// The target document or resource does not exist.
    NotFound = 5,
    /// A create collided with something already present.
    AlreadyExists = 6,
    /// The caller lacks permission.
    PermissionDenied = 7,
    /// A quota or other resource ran out.
    ResourceExhausted = 8,
    /// The system was not in a state that allows the operation.
    FailedPrecondition = 9,
    /// Gave up because of a conflict, such as transaction contention.
    Aborted = 10,
    /// Past the end of a valid range.
    OutOfRange = 11,
    /// Not supported on this platform or build.
    Unimplemented = 12,
    /// An internal invariant broke.
    Internal = 13,
    /// The backend could not be reached; retrying may help.
    Unavailable = 14,
    /// Data was lost or corrupted.
    DataLoss = 15,
    /// Credentials were missing or rejected.
    Unauthenticated = 16,
}

impl Code {
    /// Every code, indexed by its numeric value.
    pub const ALL: [Self; 17] = [
        Self::Ok,
        Self::Cancelled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::DataLoss,
        Self::Unauthenticated,
    ];

    /// Maps a numeric code; values outside the known range become `Unknown`.
    #[must_use]
    pub fn from_i32(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .unwrap_or(Self::Unknown)
    }

    /// Numeric value of this code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// True only for [`Code::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Upper-snake-case name, as printed in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code and message of a completed future.
///
/// Successes report `Code::Ok` with an empty message. Messages are kept
/// byte-for-byte as the producer supplied them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    /// Builds a status from a code and message.
    #[must_use]
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The status of a successful completion.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(Code::Ok, "")
    }

    /// Shorthand for `Status::new(Code::FailedPrecondition, message)`.
    #[must_use]
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(Code::FailedPrecondition, message)
    }

    /// The code.
    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    /// The message, possibly empty.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if the code is [`Code::Ok`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            fmt::Display::fmt(&self.code, f)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Status {}
