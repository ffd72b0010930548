//! Token implementation for qsig

use crate::claims::Claims;
use crate::encoding::{encode_bytes, encode_segment};
use crate::error::Result;
use crate::header::Header;
use crate::utils::compute_hmac_sha256;
use std::fmt;

/// A signed qsig token.
///
/// The token text is `header.payload.signature`, each segment base64url
/// without padding. When the header is trimmed the text starts at the payload:
/// the edge server rebuilds the default header itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token header
    pub header: Header,
    /// Token payload claims
    pub claims: Claims,
    header_segment: String,
    payload_segment: String,
    signature: String,
    trim_header: bool,
    encoded: String,
}

impl Token {
    /// Sign `claims` under `header` with HMAC-SHA256.
    ///
    /// # Example
    ///
    /// ```
    /// use qsig::{Claims, Header, Token};
    ///
    /// let claims = Claims::new().with_int("kid", 0).with_int("exp", 100120);
    /// let token = Token::sign(Header::new(), claims, b"secret0", true).unwrap();
    ///
    /// assert_eq!(token.as_str().split('.').count(), 2);
    /// assert_eq!(token.untrimmed().split('.').count(), 3);
    /// ```
    pub fn sign(header: Header, claims: Claims, key: &[u8], trim_header: bool) -> Result<Self> {
        let header_segment = encode_segment(header.as_map())?;
        let payload_segment = encode_segment(claims.as_map())?;

        let signing_input = format!("{header_segment}.{payload_segment}");
        let mac = compute_hmac_sha256(key, signing_input.as_bytes());
        let signature = encode_bytes(&mac)?;

        let encoded = if trim_header {
            format!("{payload_segment}.{signature}")
        } else {
            format!("{signing_input}.{signature}")
        };

        Ok(Self {
            header,
            claims,
            header_segment,
            payload_segment,
            signature,
            trim_header,
            encoded,
        })
    }

    /// The exact string the digest was computed over
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_segment, self.payload_segment)
    }

    /// Encoded header segment, present even when trimmed from the output
    pub fn header_segment(&self) -> &str {
        &self.header_segment
    }

    /// Encoded payload segment
    pub fn payload_segment(&self) -> &str {
        &self.payload_segment
    }

    /// Encoded HMAC-SHA256 digest
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Whether the emitted text omits the header segment
    pub fn is_header_trimmed(&self) -> bool {
        self.trim_header
    }

    /// Token text including the header segment, regardless of trimming
    pub fn untrimmed(&self) -> String {
        format!("{}.{}", self.signing_input(), self.signature)
    }

    /// Token text as it goes into the URL
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Consume the token into its text
    pub fn into_string(self) -> String {
        self.encoded
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}
