//! # Claims for qsig tokens
//!
//! The payload of a qsig token is a flat map of fixed-name claims whose values
//! are either integers or strings. The map is ordered so that serialization is
//! deterministic: the digest covers the exact bytes, and an edge server
//! rebuilding the same claims must get the same bytes.
//!
//! | Claim | Meaning                                   |
//! |-------|-------------------------------------------|
//! | `typ` | token type tag (`all`, `sgn`, ...)        |
//! | `hsh` | MD5 hex digest of the covered string      |
//! | `cnt` | segment count (`sgn`)                     |
//! | `off` | segment offset (`sgn`, omitted when zero) |
//! | `rgx` | regex match rule (`rgm`, `rgh`)           |
//! | `rgb` | regex build rule (`rgh`)                  |
//! | `cip` | client IP                                 |
//! | `kid` | key identifier                            |
//! | `exp` | expiration time (seconds since Unix epoch)|

use crate::constants::{claim_keys, token_types};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Value of a single claim.
///
/// # Example
///
/// ```
/// use qsig::ClaimValue;
///
/// assert_eq!(ClaimValue::from(42), ClaimValue::Integer(42));
/// assert_eq!(ClaimValue::from("sgn").as_str(), Some("sgn"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// Signed 64-bit integer
    Integer(i64),
    /// UTF-8 string
    Text(String),
}

impl ClaimValue {
    /// Integer content, if this is an integer claim
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Integer(i) => Some(*i),
            ClaimValue::Text(_) => None,
        }
    }

    /// String content, if this is a string claim
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::Text(s) => Some(s),
            ClaimValue::Integer(_) => None,
        }
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<i32> for ClaimValue {
    fn from(value: i32) -> Self {
        ClaimValue::Integer(value.into())
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::Text(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::Text(value)
    }
}

/// Ordered claim map used for both header and payload
pub type ClaimsMap = BTreeMap<String, ClaimValue>;

/// Payload claims of a qsig token.
///
/// Later inserts replace earlier ones, which is how derived claims override
/// the caller-supplied seed payload.
///
/// # Example
///
/// ```
/// use qsig::Claims;
///
/// let claims = Claims::new()
///     .with_text("typ", "all")
///     .with_int("exp", 100120);
///
/// assert_eq!(claims.typ(), Some("all"));
/// assert_eq!(claims.exp(), Some(100120));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    map: ClaimsMap,
}

impl Claims {
    /// Creates an empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a claim set seeded from an existing map
    pub fn from_map(map: ClaimsMap) -> Self {
        Self { map }
    }

    /// Inserts a claim, replacing any previous value under the same key
    pub fn insert<K: Into<String>, V: Into<ClaimValue>>(&mut self, key: K, value: V) {
        self.map.insert(key.into(), value.into());
    }

    /// Adds a string claim
    pub fn with_text<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, ClaimValue::Text(value.into()));
        self
    }

    /// Adds an integer claim
    pub fn with_int<K: Into<String>>(mut self, key: K, value: i64) -> Self {
        self.insert(key, ClaimValue::Integer(value));
        self
    }

    /// Merges `other` on top of these claims; keys in `other` win
    pub fn merge(&mut self, other: Claims) {
        self.map.extend(other.map);
    }

    /// Looks up a claim by name
    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.map.get(key)
    }

    /// Returns `true` if the claim is present
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Borrow the underlying ordered map
    pub fn as_map(&self) -> &ClaimsMap {
        &self.map
    }

    /// Consume into the underlying ordered map
    pub fn into_map(self) -> ClaimsMap {
        self.map
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(ClaimValue::as_str)
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.map.get(key).and_then(ClaimValue::as_i64)
    }

    /// Token type tag (`typ`)
    pub fn typ(&self) -> Option<&str> {
        self.text(claim_keys::TYP)
    }

    /// Hash of the covered string (`hsh`)
    pub fn hsh(&self) -> Option<&str> {
        self.text(claim_keys::HSH)
    }

    /// Segment count (`cnt`)
    pub fn cnt(&self) -> Option<i64> {
        self.int(claim_keys::CNT)
    }

    /// Segment offset (`off`)
    pub fn off(&self) -> Option<i64> {
        self.int(claim_keys::OFF)
    }

    /// Regex match rule (`rgx`)
    pub fn rgx(&self) -> Option<&str> {
        self.text(claim_keys::RGX)
    }

    /// Regex build rule (`rgb`)
    pub fn rgb(&self) -> Option<&str> {
        self.text(claim_keys::RGB)
    }

    /// Client IP (`cip`)
    pub fn cip(&self) -> Option<&str> {
        self.text(claim_keys::CIP)
    }

    /// Key identifier (`kid`)
    pub fn kid(&self) -> Option<i64> {
        self.int(claim_keys::KID)
    }

    /// Expiration time (`exp`)
    pub fn exp(&self) -> Option<i64> {
        self.int(claim_keys::EXP)
    }
}

impl From<ClaimsMap> for Claims {
    fn from(map: ClaimsMap) -> Self {
        Self::from_map(map)
    }
}

/// Token type, carried in the `typ` claim.
///
/// It tells the edge server which part of the request path the `hsh` claim
/// covers.
///
/// # Example
///
/// ```
/// use qsig::TokenType;
///
/// let typ: TokenType = "cfg-rgh".parse().unwrap();
/// assert_eq!(typ, TokenType::ConfigRegexHash);
/// assert_eq!(typ.as_str(), "cfg-rgh");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Whole path (`all`)
    All,
    /// `cnt` segments after `off` segments (`sgn`)
    Segments,
    /// Path must match `rgx`, nothing hashed (`rgm`)
    RegexMatch,
    /// Regex captures expanded into `rgb` and hashed; rule in token (`rgh`)
    RegexHash,
    /// Same as `rgh` but the rule is provisioned on the edge (`cfg-rgh`)
    ConfigRegexHash,
}

impl TokenType {
    /// Every token type, in legacy listing order
    pub const ALL: [TokenType; 5] = [
        TokenType::All,
        TokenType::Segments,
        TokenType::RegexMatch,
        TokenType::RegexHash,
        TokenType::ConfigRegexHash,
    ];

    /// Tag written to the `typ` claim
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::All => token_types::ALL,
            TokenType::Segments => token_types::SGN,
            TokenType::RegexMatch => token_types::RGM,
            TokenType::RegexHash => token_types::RGH,
            TokenType::ConfigRegexHash => token_types::CFG_RGH,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|typ| typ.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_parameter("typ", format!("unsupported token type '{s}'"))
            })
    }
}
