use std::io;
use thiserror::Error;

/// Errors produced while converting, encoding, storing or fetching icons.
#[derive(Debug, Error)]
pub enum Error {
    /// The source image has an unsupported type, is unreadable, or is too
    /// large.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A container could not be laid out from the given entries.  This
    /// points at a malformed size or tag table rather than bad user input.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The artifact id is unknown, expired, or not a well-formed name.
    #[error("not found: {0}")]
    NotFound(String),

    /// A resize call failed in a way that may succeed if tried again.
    #[error("resize failed: {0}")]
    Resize(String),

    /// The conversion was aborted by its caller.
    #[error("conversion cancelled")]
    Cancelled,

    /// The configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An I/O error from the storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! encoding_error {
    ($e:expr) => {
        return Err($crate::error::Error::Encoding(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::Encoding(format!($fmt, $($arg)+)))
    };
}

macro_rules! invalid_image {
    ($e:expr) => {
        return Err($crate::error::Error::InvalidImage(($e).to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::error::Error::InvalidImage(format!($fmt, $($arg)+)))
    };
}
