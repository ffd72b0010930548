//! # Signer
//!
//! A [`Signer`] holds the immutable signing configuration: the secret key,
//! key id, client IP, validity window and output options. Each `sign_*` call
//! resolves the expiration, builds the payload for one path and returns a
//! signed [`Token`].
//!
//! Validation happens up front, inside the call, before anything is hashed or
//! encoded: a call either returns a complete token or an [`Error`].
//!
//! ## Expiration
//!
//! - `start_time` is either [`StartTime::Now`] or an explicit epoch time.
//! - An explicit `end_time` wins. Otherwise `window_seconds` is required and
//!   the end is `start + window`, or `now + window` without a start time.
//! - With a known start time the end must be strictly after it.
//!
//! ```
//! use qsig::{FixedClock, Signer, StartTime};
//!
//! let signer = Signer::builder()
//!     .key("abdabcabcd")
//!     .start_time(StartTime::At(100_000))
//!     .window_seconds(120)
//!     .clock(FixedClock(90_000))
//!     .build()
//!     .unwrap();
//!
//! let token = signer
//!     .sign_all("/sign/base/dir/of/path/because/cnt/is/set/to/minus1")
//!     .unwrap();
//!
//! assert_eq!(token.claims.exp(), Some(100_120));
//! assert_eq!(
//!     token.as_str(),
//!     "eyJleHAiOjEwMDEyMCwiaHNoIjoiNTgyM2U0ZWZkOTg5MDVjZTJjY2UxM2YxMDljZDM4Y2IiLCJraWQiOjAsInR5cCI6ImFsbCJ9\
//!      .8HkTjFhBowhWpKAhlW2TlHiV_x9P9TsZp0_y64xtQHU"
//! );
//! ```

use crate::claims::{ClaimValue, Claims, ClaimsMap, TokenType};
use crate::constants::{claim_keys, DEFAULT_TOKEN_NAME};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::path::{escape_early, last_segment_count, PathRule};
use crate::token::Token;
use crate::url::{embed_token, TokenLocation};
use crate::utils::{Clock, Redacted, SystemClock};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Start of the validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTime {
    /// The time of the signing call
    Now,
    /// Explicit time in seconds since Unix epoch
    At(i64),
}

impl From<i64> for StartTime {
    fn from(value: i64) -> Self {
        StartTime::At(value)
    }
}

impl FromStr for StartTime {
    type Err = Error;

    /// Parses `now` (any case) or an integer epoch time.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            return Ok(StartTime::Now);
        }
        s.parse::<i64>()
            .map(StartTime::At)
            .map_err(|_| Error::invalid_parameter("start_time", "must be numeric or now"))
    }
}

/// Resolved validity window of one signing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// Start time, when one was configured
    pub start: Option<i64>,
    /// Expiration time written to `exp`
    pub end: i64,
}

fn positive(name: &'static str, value: i64) -> Result<i64> {
    if value <= 0 {
        return Err(Error::invalid_parameter(
            name,
            format!("must be ( > 0 ) and it is {value}"),
        ));
    }
    Ok(value)
}

/// Builder for [`Signer`]
#[derive(Clone)]
pub struct SignerBuilder {
    key: Option<Vec<u8>>,
    key_id: i64,
    client_ip: Option<String>,
    start_time: Option<StartTime>,
    end_time: Option<i64>,
    window_seconds: Option<i64>,
    escape_early: bool,
    verbose: bool,
    token_location: TokenLocation,
    trim_header: bool,
    token_type: Option<TokenType>,
    token_name: String,
    base_header: ClaimsMap,
    base_payload: ClaimsMap,
    clock: Arc<dyn Clock>,
}

impl Default for SignerBuilder {
    fn default() -> Self {
        Self {
            key: None,
            key_id: 0,
            client_ip: None,
            start_time: None,
            end_time: None,
            window_seconds: None,
            escape_early: false,
            verbose: false,
            token_location: TokenLocation::default(),
            trim_header: true,
            token_type: None,
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            base_header: ClaimsMap::new(),
            base_payload: ClaimsMap::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl SignerBuilder {
    /// Create a new signer builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the secret key (required, must not be empty)
    pub fn key<K: AsRef<[u8]>>(mut self, key: K) -> Self {
        self.key = Some(key.as_ref().to_vec());
        self
    }

    /// Set the key identifier written to `kid` (default 0)
    pub fn key_id(mut self, kid: i64) -> Self {
        self.key_id = kid;
        self
    }

    /// Bind tokens to a client IP (`cip`)
    pub fn client_ip<S: Into<String>>(mut self, ip: S) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    /// Set the start of the validity window
    pub fn start_time(mut self, start: StartTime) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Start the validity window at an explicit epoch time
    pub fn start_at(self, epoch_seconds: i64) -> Self {
        self.start_time(StartTime::At(epoch_seconds))
    }

    /// Set an explicit expiration time (seconds since Unix epoch)
    pub fn end_time(mut self, end: i64) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Set the validity window length in seconds
    pub fn window_seconds(mut self, window: i64) -> Self {
        self.window_seconds = Some(window);
        self
    }

    /// Form-encode covered strings and the client IP before use
    pub fn escape_early(mut self, escape: bool) -> Self {
        self.escape_early = escape;
        self
    }

    /// Report generation parameters at info level instead of debug
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Where [`Signer::embed`] places the token
    pub fn token_location(mut self, location: TokenLocation) -> Self {
        self.token_location = location;
        self
    }

    /// Omit the header segment from emitted tokens (default true)
    pub fn trim_header(mut self, trim: bool) -> Self {
        self.trim_header = trim;
        self
    }

    /// Token type reported in diagnostics
    pub fn token_type(mut self, typ: TokenType) -> Self {
        self.token_type = Some(typ);
        self
    }

    /// Token name reported in diagnostics
    pub fn token_name<S: Into<String>>(mut self, name: S) -> Self {
        self.token_name = name.into();
        self
    }

    /// Seed header fields; `alg` is always overridden
    pub fn base_header(mut self, header: ClaimsMap) -> Self {
        self.base_header = header;
        self
    }

    /// Seed payload claims; derived claims override them
    pub fn base_payload(mut self, payload: ClaimsMap) -> Self {
        self.base_payload = payload;
        self
    }

    /// Add one seed payload claim
    pub fn payload_claim<K: Into<String>, V: Into<ClaimValue>>(mut self, key: K, value: V) -> Self {
        self.base_payload.insert(key.into(), value.into());
        self
    }

    /// Replace the clock used to resolve "now"
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Validate the configuration and build the signer
    pub fn build(self) -> Result<Signer> {
        let key = match self.key {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(Error::Configuration(
                    "You must provide a secret in order to generate a new token".to_string(),
                ))
            }
        };

        Ok(Signer {
            key,
            key_id: self.key_id,
            client_ip: self.client_ip,
            start_time: self.start_time,
            end_time: self.end_time,
            window_seconds: self.window_seconds,
            escape_early: self.escape_early,
            verbose: self.verbose,
            token_location: self.token_location,
            trim_header: self.trim_header,
            token_type: self.token_type,
            token_name: self.token_name,
            header: Header::from_base(self.base_header),
            base_payload: self.base_payload,
            clock: self.clock,
        })
    }
}

/// Token signer with an immutable configuration.
///
/// A `Signer` is `Send + Sync` and can be shared between threads. Every call
/// reads the clock on its own, so concurrent calls may see different times.
#[derive(Clone)]
pub struct Signer {
    key: Vec<u8>,
    key_id: i64,
    client_ip: Option<String>,
    start_time: Option<StartTime>,
    end_time: Option<i64>,
    window_seconds: Option<i64>,
    escape_early: bool,
    verbose: bool,
    token_location: TokenLocation,
    trim_header: bool,
    token_type: Option<TokenType>,
    token_name: String,
    header: Header,
    base_payload: ClaimsMap,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("key", &Redacted(&self.key))
            .field("key_id", &self.key_id)
            .field("client_ip", &self.client_ip)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("window_seconds", &self.window_seconds)
            .field("escape_early", &self.escape_early)
            .field("token_location", &self.token_location)
            .field("trim_header", &self.trim_header)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Create a new signer builder
    pub fn builder() -> SignerBuilder {
        SignerBuilder::new()
    }

    /// Key identifier written to `kid`
    pub fn key_id(&self) -> i64 {
        self.key_id
    }

    /// Header every token is signed under
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Configured token location
    pub fn token_location(&self) -> TokenLocation {
        self.token_location
    }

    /// Whether emitted tokens omit the header segment
    pub fn trims_header(&self) -> bool {
        self.trim_header
    }

    /// Resolve the validity window for a call made now.
    ///
    /// # Example
    ///
    /// ```
    /// use qsig::{Error, Signer};
    ///
    /// let signer = Signer::builder()
    ///     .key("secret")
    ///     .start_at(500)
    ///     .end_time(500)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(matches!(
    ///     signer.resolve_expiry(),
    ///     Err(Error::AlreadyExpired { start: 500, end: 500 })
    /// ));
    /// ```
    pub fn resolve_expiry(&self) -> Result<Expiry> {
        let start = match self.start_time {
            None => None,
            Some(StartTime::Now) => Some(self.clock.now()),
            Some(StartTime::At(start)) => Some(positive("start_time", start)?),
        };
        let end_time = self
            .end_time
            .map(|end| positive("end_time", end))
            .transpose()?;
        let window = self
            .window_seconds
            .map(|window| positive("window_seconds", window))
            .transpose()?;

        let end = match (end_time, window) {
            (Some(end), _) => end,
            (None, Some(window)) => {
                let from = match start {
                    Some(start) => start,
                    None => self.clock.now(),
                };
                from.checked_add(window).ok_or_else(|| {
                    Error::invalid_parameter("window_seconds", "overflows the expiration time")
                })?
            }
            (None, None) => return Err(Error::MissingExpiration),
        };

        if let Some(start) = start {
            if end <= start {
                return Err(Error::AlreadyExpired { start, end });
            }
        }

        Ok(Expiry { start, end })
    }

    /// Payload claims for `path` under `rule`, without signing.
    ///
    /// The payload starts from the seed claims, then takes `kid`, `cip`, the
    /// rule's claims and finally `exp`; later claims win on collision.
    pub fn claims(&self, path: &str, rule: &PathRule) -> Result<Claims> {
        let expiry = self.resolve_expiry()?;

        self.log_parameters(&expiry, path, rule);

        let mut claims = Claims::from_map(self.base_payload.clone());
        claims.insert(claim_keys::KID, self.key_id);
        if let Some(ip) = &self.client_ip {
            let ip = if self.escape_early {
                escape_early(ip)
            } else {
                ip.clone()
            };
            claims.insert(claim_keys::CIP, ip);
        }
        claims.merge(rule.claims(path, self.escape_early)?);
        claims.insert(claim_keys::EXP, expiry.end);

        Ok(claims)
    }

    fn log_parameters(&self, expiry: &Expiry, path: &str, rule: &PathRule) {
        let token_type = self.token_type.unwrap_or(rule.token_type());
        let key = Redacted(&self.key);

        if self.verbose {
            info!(
                %token_type,
                token_name = %self.token_name,
                ?key,
                ip = ?self.client_ip,
                start_time = ?expiry.start,
                end_time = expiry.end,
                window_seconds = ?self.window_seconds,
                escape_early = self.escape_early,
                path,
                "generating qsig token"
            );
        } else {
            debug!(
                %token_type,
                ?key,
                ip = ?self.client_ip,
                start_time = ?expiry.start,
                end_time = expiry.end,
                path,
                "generating qsig token"
            );
        }
    }

    /// Sign `path` under `rule`
    pub fn sign(&self, path: &str, rule: &PathRule) -> Result<Token> {
        let claims = self.claims(path, rule)?;
        let token = Token::sign(self.header.clone(), claims, &self.key, self.trim_header)?;

        debug!(
            header = ?token.header.as_map(),
            payload = ?token.claims.as_map(),
            signing_input = %token.signing_input(),
            "signed qsig token"
        );

        Ok(token)
    }

    /// Sign the whole path (`all`)
    pub fn sign_all(&self, path: &str) -> Result<Token> {
        self.sign(path, &PathRule::All)
    }

    /// Sign `count` segments after `offset` segments (`sgn`).
    ///
    /// # Example
    ///
    /// ```
    /// use qsig::Signer;
    ///
    /// let signer = Signer::builder().key("secret").window_seconds(60).build().unwrap();
    /// let token = signer.sign_segments("/a/b/c/d/e", 2, 2).unwrap();
    ///
    /// assert_eq!(token.claims.cnt(), Some(2));
    /// assert_eq!(token.claims.off(), Some(2));
    /// ```
    pub fn sign_segments(&self, path: &str, count: i64, offset: i64) -> Result<Token> {
        self.sign(path, &PathRule::segments(count, offset))
    }

    /// Sign every segment but the last, after `offset` segments (`sgn`)
    pub fn sign_last_segment(&self, path: &str, offset: i64) -> Result<Token> {
        if offset < 0 {
            return Err(Error::invalid_parameter(
                "offset",
                format!("cannot be negative and it is {offset}"),
            ));
        }
        let count = last_segment_count(path, offset);
        self.sign_segments(path, count, offset)
    }

    /// Require `pattern` to match, hash nothing (`rgm`)
    pub fn sign_regex_match(&self, path: &str, pattern: &str) -> Result<Token> {
        self.sign(path, &PathRule::regex_match(pattern))
    }

    /// Hash the captures expanded into `build`; ship the rule (`rgh`)
    pub fn sign_regex_hash(&self, path: &str, pattern: &str, build: &str) -> Result<Token> {
        self.sign(path, &PathRule::regex_hash(pattern, build))
    }

    /// Hash the captures expanded into `build`; rule lives on the edge (`cfg-rgh`)
    pub fn sign_config_regex_hash(&self, path: &str, pattern: &str, build: &str) -> Result<Token> {
        self.sign(path, &PathRule::config_regex_hash(pattern, build))
    }

    /// Place `token` into `path` at the configured location
    pub fn embed(&self, path: &str, token: &Token) -> String {
        embed_token(path, token.as_str(), self.token_location)
    }
}
