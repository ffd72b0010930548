//! Placing a token into the request URL

use crate::constants::TOKEN_NAME;
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Where the token travels in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenLocation {
    /// First path element: `/qsig=<token>/original/path`
    #[default]
    PathPrefix,
    /// Query parameter: `/original/path?qsig=<token>`
    QueryParam,
    /// Cookie value `qsig=<token>`; the URL is left untouched
    Cookie,
}

impl TokenLocation {
    /// Short name used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenLocation::PathPrefix => "path",
            TokenLocation::QueryParam => "query",
            TokenLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for TokenLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(TokenLocation::PathPrefix),
            "query" => Ok(TokenLocation::QueryParam),
            "cookie" => Ok(TokenLocation::Cookie),
            other => Err(Error::invalid_parameter(
                "token_location",
                format!("expected path, query or cookie, got '{other}'"),
            )),
        }
    }
}

/// Place `token` according to `location`.
///
/// For [`TokenLocation::Cookie`] only the `qsig=<token>` pair is returned and
/// the caller sends it in a `Cookie` header.
///
/// # Example
///
/// ```
/// use qsig::{embed_token, TokenLocation};
///
/// assert_eq!(embed_token("/x", "T", TokenLocation::PathPrefix), "/qsig=T/x");
/// assert_eq!(embed_token("/x?y=1", "T", TokenLocation::QueryParam), "/x?y=1&qsig=T");
/// assert_eq!(embed_token("/x", "T", TokenLocation::QueryParam), "/x?qsig=T");
/// assert_eq!(embed_token("/x", "T", TokenLocation::Cookie), "qsig=T");
/// ```
pub fn embed_token(path: &str, token: &str, location: TokenLocation) -> String {
    match location {
        TokenLocation::PathPrefix => format!("/{TOKEN_NAME}={token}{path}"),
        TokenLocation::QueryParam => {
            let separator = if path.contains('?') { '&' } else { '?' };
            format!("{path}{separator}{TOKEN_NAME}={token}")
        }
        TokenLocation::Cookie => format!("{TOKEN_NAME}={token}"),
    }
}
