//! Utility functions for qsig tokens

use crate::error::Result;
use ct_codecs::{Encoder, Hex};
use hmac_sha256::HMAC;
use md5::{Digest, Md5};
use std::fmt;

/// Compute HMAC-SHA256 over `data` with the raw key bytes
pub fn compute_hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    HMAC::mac(data, key).to_vec()
}

/// Lower-case hex MD5 digest of the UTF-8 bytes of `text`
pub fn md5_hex(text: &str) -> Result<String> {
    let digest = Md5::digest(text.as_bytes());
    Ok(Hex::encode_to_string(digest)?)
}

/// Get current timestamp in seconds since Unix epoch (UTC)
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as i64
}

/// Source of the current time, in seconds since Unix epoch.
///
/// The signer asks for the time on every call that needs it and never caches
/// the answer.
pub trait Clock: Send + Sync {
    /// Current time in seconds since Unix epoch
    fn now(&self) -> i64;
}

/// Wall clock backed by [`current_timestamp`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        current_timestamp()
    }
}

/// Clock frozen at a fixed instant.
///
/// # Example
///
/// ```
/// use qsig::{Clock, FixedClock};
///
/// let clock = FixedClock(1_700_000_000);
/// assert_eq!(clock.now(), 1_700_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Wrapper that prints a secret as its length only
pub(crate) struct Redacted<'a>(pub &'a [u8]);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} bytes>", self.0.len())
    }
}
