//! # qsig
//!
//! Signed, time-limited URL access tokens for CDN edge servers.
//!
//! ## Overview
//!
//! A qsig token authorizes requests for a path, or part of a path, until an
//! expiration time. The token is a JWT-like string: a JSON header and a JSON
//! payload, each base64url-encoded, followed by an HMAC-SHA256 signature. By
//! default the header segment is trimmed from the output because the edge
//! rebuilds it.
//!
//! The edge server verifies the token; this crate only produces it.
//!
//! ## Features
//!
//! - Whole-path tokens (`all`)
//! - Segment tokens covering `cnt` segments after `off` segments (`sgn`)
//! - Regex tokens: match only (`rgm`), match and hash with the rule in the
//!   token (`rgh`) or provisioned on the edge (`cfg-rgh`)
//! - Client IP binding (`cip`) and key identifiers (`kid`)
//! - Expiration from an explicit end time or a window after the start time
//! - Placing the token as a path prefix, query parameter or cookie
//!
//! ## Basic Example
//!
//! ```rust
//! use qsig::{Signer, TokenLocation};
//!
//! let signer = Signer::builder()
//!     .key("secret0")
//!     .key_id(7)
//!     .client_ip("10.0.0.1")
//!     .end_time(1_700_000_600)
//!     .token_location(TokenLocation::QueryParam)
//!     .build()
//!     .expect("Failed to build signer");
//!
//! let token = signer.sign_all("/x").expect("Failed to sign path");
//!
//! assert_eq!(token.claims.typ(), Some("all"));
//! assert_eq!(token.claims.cip(), Some("10.0.0.1"));
//! assert_eq!(token.claims.kid(), Some(7));
//! assert_eq!(token.claims.exp(), Some(1_700_000_600));
//!
//! let url = signer.embed("/x", &token);
//! assert_eq!(url, format!("/x?qsig={token}"));
//! ```
//!
//! ## Regex Example
//!
//! ```rust
//! use qsig::{md5_hex, FixedClock, Signer};
//!
//! let signer = Signer::builder()
//!     .key("abdabcabcd")
//!     .window_seconds(120)
//!     .clock(FixedClock(100_000))
//!     .build()
//!     .expect("Failed to build signer");
//!
//! let token = signer
//!     .sign_regex_hash("/videos/minus7/seg.ts", r"minus(\d+)", "$1")
//!     .expect("Failed to sign path");
//!
//! assert_eq!(token.claims.exp(), Some(100_120));
//! assert_eq!(token.claims.rgx(), Some(r"minus(\d+)"));
//! assert_eq!(token.claims.hsh(), Some(md5_hex("7").unwrap().as_str()));
//! ```

pub mod claims;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod header;
pub mod path;
pub mod signer;
pub mod token;
pub mod url;
pub mod utils;

pub use claims::{ClaimValue, Claims, ClaimsMap, TokenType};
pub use constants::{algorithms, claim_keys, header_keys, token_types, TOKEN_NAME};
pub use error::{Error, Result};
pub use header::{Algorithm, Header};
pub use path::PathRule;
pub use signer::{Expiry, Signer, SignerBuilder, StartTime};
pub use token::Token;
pub use url::{embed_token, TokenLocation};
pub use utils::{compute_hmac_sha256, current_timestamp, md5_hex, Clock, FixedClock, SystemClock};

#[cfg(test)]
mod tests;
