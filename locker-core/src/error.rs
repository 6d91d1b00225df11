//! Error types for locker operations.

use thiserror::Error;

/// Result type for locker operations.
pub type Result<T> = std::result::Result<T, LockerError>;

/// Save-time validation failures.
///
/// The `Display` text of each variant is the exact message shown in the
/// setup surface's status line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Password field left empty.
    #[error("Please enter a valid password.")]
    EmptyPassword,

    /// Password and confirmation differ.
    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// PIN is empty or contains a non-digit.
    #[error("Only numbers are taken.")]
    NonNumericPin,

    /// PIN and confirmation differ.
    #[error("Incorrect PIN.")]
    PinMismatch,

    /// No pattern cell selected.
    #[error("Please draw your pattern.")]
    EmptyPattern,

    /// Fingerprint chosen before a successful registration on this device.
    #[error("Please register your fingerprint first.")]
    FingerprintNotRegistered,
}

/// Storage backend failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File backend I/O error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document is not valid JSON.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored document is valid JSON but not an object.
    #[error("storage document is not a JSON object")]
    NotAnObject,

    /// A lock guarding an in-memory store was poisoned.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Platform assertion call failures (rejection or exception).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    /// The user dismissed the prompt or the call timed out.
    #[error("assertion rejected: {0}")]
    Rejected(String),

    /// No user-verifying platform authenticator is present.
    #[error("no platform authenticator available")]
    Unavailable,
}

/// Errors that can occur across the locker surfaces.
#[derive(Error, Debug)]
pub enum LockerError {
    /// Credential input rejected at save time.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Sync or local store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Platform assertion failure.
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// Unknown unlock method name.
    #[error("unknown unlock method: {0}")]
    UnknownMethod(String),

    /// Method exists but is not offered on this device.
    #[error("unlock method not available on this device: {0}")]
    MethodUnavailable(String),

    /// Pattern cell index outside the 3x3 grid.
    #[error("pattern cell out of range: {0} (grid has 9 cells)")]
    CellOutOfRange(usize),
}
