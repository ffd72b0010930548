//! # Header for qsig tokens
//!
//! The header carries the signing algorithm and any caller-supplied fields.
//! Because the key identifier travels in the payload and `alg` is fixed, an
//! edge server can rebuild the default header on its own, which is what makes
//! header trimming possible.

use crate::claims::{ClaimValue, ClaimsMap};
use crate::constants::{algorithms, header_keys};

/// Supported signing algorithms.
///
/// Only HMAC-SHA256 is produced.
///
/// # Example
///
/// ```
/// use qsig::Algorithm;
///
/// assert_eq!(Algorithm::Hs256.name(), "HS256");
/// assert_eq!(Algorithm::from_name("HS256"), Some(Algorithm::Hs256));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// HMAC with SHA-256
    Hs256,
}

impl Algorithm {
    /// Name written to the `alg` header claim
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Hs256 => algorithms::HS256,
        }
    }

    /// Parse an `alg` header value
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            algorithms::HS256 => Some(Algorithm::Hs256),
            _ => None,
        }
    }
}

/// Header of a qsig token.
///
/// # Example
///
/// ```
/// use qsig::{Algorithm, ClaimValue, Header};
/// use std::collections::BTreeMap;
///
/// let mut base = BTreeMap::new();
/// base.insert("alg".to_string(), ClaimValue::from("none"));
/// base.insert("cty".to_string(), ClaimValue::from("qsig"));
///
/// // `alg` always ends up as HS256, caller fields stay underneath it
/// let header = Header::from_base(base);
/// assert_eq!(header.algorithm(), Some(Algorithm::Hs256));
/// assert_eq!(header.as_map().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    fields: ClaimsMap,
}

impl Default for Header {
    fn default() -> Self {
        Self::from_base(ClaimsMap::new())
    }
}

impl Header {
    /// Creates the default `{"alg":"HS256"}` header
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header from caller-supplied fields, forcing `alg` on top
    pub fn from_base(mut base: ClaimsMap) -> Self {
        base.insert(
            header_keys::ALG.to_string(),
            ClaimValue::from(Algorithm::Hs256.name()),
        );
        Self { fields: base }
    }

    /// Algorithm named by the `alg` field
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.fields
            .get(header_keys::ALG)
            .and_then(ClaimValue::as_str)
            .and_then(Algorithm::from_name)
    }

    /// Borrow the header fields
    pub fn as_map(&self) -> &ClaimsMap {
        &self.fields
    }
}
