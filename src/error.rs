use std::{fmt, io, str::Utf8Error};

use thiserror::Error;

/// Convenient wrapper around `std::Result`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("does not support the serde::Deserializer::deserialize_any method")]
    DeserializeAnyNotSupported,
    #[error("expected 0 or 1, found {0}")]
    InvalidBoolEncoding(u8),
    #[error("expected char of width 1, found {0}")]
    InvalidChar(char),
    #[error("char is not valid UTF-8")]
    InvalidCharEncoding,
    #[error("encapsulation is not valid")]
    InvalidEncapsulation,
    #[error(transparent)]
    InvalidUtf8Encoding(#[from] Utf8Error),
    #[error("string is not null-terminated")]
    MissingStringTerminator,
    #[error("sequence is too long")]
    NumberOutOfRange,
    #[error("sequences must have a knowable size ahead of time")]
    SequenceMustHaveLength,
    #[error("the size limit has been reached")]
    SizeLimit,
    #[error("unsupported type")]
    TypeNotSupported,
    #[error("{what} of length {len} exceeds its bound of {bound}")]
    BoundExceeded {
        what: &'static str,
        len: usize,
        bound: usize,
    },
    #[error("fixed array expects {expected} elements, found {found}")]
    ArrayLengthMismatch { expected: usize, found: usize },
    #[error("length {len} at position {pos} needs at least {needed} bytes, {remaining} remain")]
    LengthExceedsBuffer {
        len: u32,
        pos: u64,
        needed: u64,
        remaining: usize,
    },
    #[error("message `{type_name}` has {expected} members, value has {found}")]
    MemberCountMismatch {
        type_name: String,
        expected: usize,
        found: usize,
    },
    #[error("member `{member}` expects {expected}, found {found}")]
    ValueMismatch {
        member: String,
        expected: String,
        found: &'static str,
    },
    #[error("type `{0}` is already registered")]
    DuplicateTypeName(String),
    #[error("member `{member}` is a fixed array of length 0")]
    ZeroLengthArray { member: String },
    #[error("type `{type_name}` needs up to {size} bytes, more than a payload can hold")]
    TypeTooLarge { type_name: String, size: u64 },
}

impl serde::de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::Message(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::Message(msg.to_string())
    }
}

/// Errors raised while turning environment variables into transport
/// properties.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {var}: {source}")]
    EnvAccess {
        var: &'static str,
        #[source]
        source: std::env::VarError,
    },
    #[error("{var} is not valid: '{value}' is not a supported value (use {expected})")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
