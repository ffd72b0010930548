//! # Constants for qsig tokens
//!
//! Claim names, token type tags and fixed names shared by the signer, the
//! path matcher and the URL embedder.

/// Name under which the token is placed in the URL or cookie
pub const TOKEN_NAME: &str = "qsig";

/// Default cosmetic token name reported in diagnostics
pub const DEFAULT_TOKEN_NAME: &str = "__token__";

/// Header claim keys
pub mod header_keys {
    /// Signing algorithm
    pub const ALG: &str = "alg";
}

/// Payload claim keys
pub mod claim_keys {
    /// Token type tag
    pub const TYP: &str = "typ";
    /// MD5 hex digest of the covered string
    pub const HSH: &str = "hsh";
    /// Segment count (sgn)
    pub const CNT: &str = "cnt";
    /// Segment offset (sgn), omitted when zero
    pub const OFF: &str = "off";
    /// Regex match rule (rgm, rgh)
    pub const RGX: &str = "rgx";
    /// Regex build rule (rgh)
    pub const RGB: &str = "rgb";
    /// Client IP
    pub const CIP: &str = "cip";
    /// Key identifier
    pub const KID: &str = "kid";
    /// Expiration time (seconds since Unix epoch)
    pub const EXP: &str = "exp";
}

/// Values of the `typ` claim
pub mod token_types {
    /// Whole path
    pub const ALL: &str = "all";
    /// Segment count after an offset
    pub const SGN: &str = "sgn";
    /// Regex match, no hash
    pub const RGM: &str = "rgm";
    /// Regex match and hash, rule travels in the token
    pub const RGH: &str = "rgh";
    /// Regex match and hash, rule provisioned on the edge
    pub const CFG_RGH: &str = "cfg-rgh";
}

/// Algorithm names for the `alg` header claim
pub mod algorithms {
    /// HMAC with SHA-256
    pub const HS256: &str = "HS256";
}
