//! Error types for the qsig token library

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while building a signer or generating a token.
///
/// Every variant is a caller-input failure. Nothing here is transient, so
/// retrying the same call yields the same error.
#[derive(Error, Debug)]
pub enum Error {
    /// Signer configuration is unusable (missing or empty secret key)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A time, window, count or offset parameter is non-numeric or out of range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Neither an end time nor a duration window was supplied
    #[error("You must provide an expiration time or a duration window ( > 0 )")]
    MissingExpiration,

    /// The computed end time is not after the start time
    #[error("Token will have already expired: end time {end} is not after start time {start}")]
    AlreadyExpired {
        /// Resolved start time (epoch seconds)
        start: i64,
        /// Resolved end time (epoch seconds)
        end: i64,
    },

    /// The path has fewer segments than `offset + count`
    #[error("Can't extract path, not enough segments: off={offset}, cnt={count}, path='{path}'")]
    PathFormat {
        /// Requested segment count
        count: i64,
        /// Requested segment offset
        offset: i64,
        /// Path that was being signed
        path: String,
    },

    /// The path does not match the supplied pattern
    #[error("Can't extract path, no match on regex: regex='{pattern}', path='{path}'")]
    NoRegexMatch {
        /// Pattern that failed to match
        pattern: String,
        /// Path that was being signed
        path: String,
    },

    /// The supplied pattern is not a valid regular expression
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Claim serialization or base64url encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl Error {
    pub(crate) fn invalid_parameter<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(format!("JSON: {err}"))
    }
}

impl From<ct_codecs::Error> for Error {
    fn from(err: ct_codecs::Error) -> Self {
        Error::Encoding(format!("base64url: {err:?}"))
    }
}
