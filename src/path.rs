//! # Path matching rules
//!
//! Each token type decides which part of the request path the signature
//! covers. The covered string is hashed (MD5, lower-case hex) into the `hsh`
//! claim, so the edge server can recompute it from the request it receives.
//!
//! - **all**: the whole path, query string included.
//! - **sgn**: `cnt` `/`-delimited segments after skipping `off` segments.
//! - **rgm**: the path must match `rgx`; nothing is hashed.
//! - **rgh** / **cfg-rgh**: the path must match `rgx`; the capture groups are
//!   expanded into the `rgb` build template and the result is hashed.
//!
//! ```
//! use qsig::path;
//!
//! let covered = path::covered_segments("/a/b/c/d/e", 2, 2).unwrap();
//! assert_eq!(covered, Some("/c/d"));
//! ```

use crate::claims::{Claims, TokenType};
use crate::constants::claim_keys;
use crate::error::{Error, Result};
use crate::utils::md5_hex;
use regex::{Captures, Regex};

/// Rule selecting the covered part of a path, one per token type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    /// Cover the whole path (`all`)
    All,
    /// Cover `count` segments after `offset` segments (`sgn`)
    Segments {
        /// Number of covered segments, must be positive
        count: i64,
        /// Number of skipped leading segments, must not be negative
        offset: i64,
    },
    /// Require a regex match, hash nothing (`rgm`)
    RegexMatch {
        /// Match rule
        pattern: String,
    },
    /// Hash the expanded build template and ship the rule (`rgh`)
    RegexHash {
        /// Match rule
        pattern: String,
        /// Build template with `$1`, `$2`, ... placeholders
        build: String,
    },
    /// Hash the expanded build template, rule configured on the edge (`cfg-rgh`)
    ConfigRegexHash {
        /// Match rule
        pattern: String,
        /// Build template with `$1`, `$2`, ... placeholders
        build: String,
    },
}

impl PathRule {
    /// Rule for `sgn` tokens
    pub fn segments(count: i64, offset: i64) -> Self {
        PathRule::Segments { count, offset }
    }

    /// Rule for `rgm` tokens
    pub fn regex_match<P: Into<String>>(pattern: P) -> Self {
        PathRule::RegexMatch {
            pattern: pattern.into(),
        }
    }

    /// Rule for `rgh` tokens
    pub fn regex_hash<P: Into<String>, B: Into<String>>(pattern: P, build: B) -> Self {
        PathRule::RegexHash {
            pattern: pattern.into(),
            build: build.into(),
        }
    }

    /// Rule for `cfg-rgh` tokens
    pub fn config_regex_hash<P: Into<String>, B: Into<String>>(pattern: P, build: B) -> Self {
        PathRule::ConfigRegexHash {
            pattern: pattern.into(),
            build: build.into(),
        }
    }

    /// Token type this rule produces
    pub fn token_type(&self) -> TokenType {
        match self {
            PathRule::All => TokenType::All,
            PathRule::Segments { .. } => TokenType::Segments,
            PathRule::RegexMatch { .. } => TokenType::RegexMatch,
            PathRule::RegexHash { .. } => TokenType::RegexHash,
            PathRule::ConfigRegexHash { .. } => TokenType::ConfigRegexHash,
        }
    }

    /// Type-specific claims (`typ`, `hsh`, `cnt`, `off`, `rgx`, `rgb`) for `path`.
    ///
    /// With `escape` set, the covered string is passed through [`escape_early`]
    /// before hashing.
    pub fn claims(&self, path: &str, escape: bool) -> Result<Claims> {
        let mut claims = Claims::new().with_text(claim_keys::TYP, self.token_type().as_str());
        let hash = |covered: &str| -> Result<String> {
            if escape {
                md5_hex(&escape_early(covered))
            } else {
                md5_hex(covered)
            }
        };

        match self {
            PathRule::All => {
                claims.insert(claim_keys::HSH, hash(path)?);
            }
            PathRule::Segments { count, offset } => {
                let (count, offset) = (*count, *offset);
                let (cnt, off) = validate_segments(count, offset)?;
                let covered = covered_segments(path, cnt, off)?.ok_or_else(|| Error::PathFormat {
                    count,
                    offset,
                    path: path.to_string(),
                })?;

                claims.insert(claim_keys::CNT, count);
                if offset != 0 {
                    claims.insert(claim_keys::OFF, offset);
                }
                claims.insert(claim_keys::HSH, hash(covered)?);
            }
            PathRule::RegexMatch { pattern } => {
                search(pattern, path)?;
                claims.insert(claim_keys::RGX, pattern.as_str());
            }
            PathRule::RegexHash { pattern, build } => {
                let captures = search(pattern, path)?;
                claims.insert(claim_keys::RGX, pattern.as_str());
                claims.insert(claim_keys::RGB, build.as_str());
                if !build.is_empty() {
                    claims.insert(claim_keys::HSH, hash(&expand_captures(build, &captures))?);
                }
            }
            PathRule::ConfigRegexHash { pattern, build } => {
                let captures = search(pattern, path)?;
                if !build.is_empty() {
                    claims.insert(claim_keys::HSH, hash(&expand_captures(build, &captures))?);
                }
            }
        }

        Ok(claims)
    }
}

fn validate_segments(count: i64, offset: i64) -> Result<(usize, usize)> {
    if count <= 0 {
        return Err(Error::invalid_parameter(
            "count",
            format!("must be greater than 0 and it is {count}"),
        ));
    }
    if offset < 0 {
        return Err(Error::invalid_parameter(
            "offset",
            format!("cannot be negative and it is {offset}"),
        ));
    }

    let to_usize = |name: &'static str, value: i64| {
        usize::try_from(value).map_err(|_| Error::invalid_parameter(name, "out of range"))
    };
    Ok((to_usize("count", count)?, to_usize("offset", offset)?))
}

/// Portion of `path` made of `count` segments following `offset` segments.
///
/// A segment is a `/` followed by one or more characters other than `/` and
/// `?`. The path must start with `^((/[^/?]+){offset})((/[^/?]+){count})`;
/// returns `Ok(None)` when it runs out of segments first.
pub fn covered_segments(path: &str, count: usize, offset: usize) -> Result<Option<&str>> {
    // every segment takes at least two bytes
    let needed = offset.saturating_add(count).saturating_mul(2);
    if needed > path.len() {
        return Ok(None);
    }

    let re = Regex::new(&format!(r"^((?:/[^/?]+){{{offset}}})((?:/[^/?]+){{{count}}})"))?;
    Ok(re
        .captures(path)
        .and_then(|captures| captures.get(2))
        .map(|covered| covered.as_str()))
}

/// Segment count that covers everything up to, and excluding, the last
/// segment of `path`, after skipping `offset` segments.
///
/// The directory depth is the number of `/` in the POSIX dirname of the path.
/// The result may be zero or negative; signing then rejects it as an invalid
/// count. It saturates instead of overflowing for extreme offsets.
///
/// ```
/// use qsig::path::last_segment_count;
///
/// assert_eq!(last_segment_count("/a/b/c/file.ts", 0), 3);
/// assert_eq!(last_segment_count("/a/b/c/file.ts", 1), 2);
/// assert_eq!(last_segment_count("/file.ts", 0), 1);
/// ```
pub fn last_segment_count(path: &str, offset: i64) -> i64 {
    let head = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "",
    };
    // dirname drops trailing slashes unless the head is nothing but slashes
    let head = if head.bytes().any(|b| b != b'/') {
        head.trim_end_matches('/')
    } else {
        head
    };

    (head.matches('/').count() as i64).saturating_sub(offset)
}

fn search<'p>(pattern: &str, path: &'p str) -> Result<Captures<'p>> {
    let re = Regex::new(pattern)?;
    re.captures(path).ok_or_else(|| Error::NoRegexMatch {
        pattern: pattern.to_string(),
        path: path.to_string(),
    })
}

fn expand_captures(build: &str, captures: &Captures<'_>) -> String {
    let groups: Vec<&str> = captures
        .iter()
        .skip(1)
        .map(|group| group.map_or("", |m| m.as_str()))
        .collect();
    expand_template(build, &groups)
}

/// Expand `$1`, `$2`, ... in `template` with `groups[0]`, `groups[1]`, ...
///
/// Placeholders are replaced in group order with plain string substitution,
/// so `$1` also rewrites the head of `$10`.
///
/// ```
/// use qsig::path::expand_template;
///
/// assert_eq!(expand_template("/v/$2/$1", &["a", "b"]), "/v/b/a");
/// assert_eq!(expand_template("$1$1", &["x"]), "xx");
/// ```
pub fn expand_template(template: &str, groups: &[&str]) -> String {
    groups
        .iter()
        .enumerate()
        .fold(template.to_string(), |expanded, (i, value)| {
            expanded.replace(&format!("${}", i + 1), value)
        })
}

/// Form-encode `text` and lower-case every `%XY` escape.
///
/// Letters, digits and `-_.~` pass through, a space becomes `+`, and every
/// other byte of the UTF-8 encoding becomes a `%xy` escape.
///
/// ```
/// use qsig::path::escape_early;
///
/// assert_eq!(escape_early("/a b/c"), "%2fa+b%2fc");
/// ```
pub fn escape_early(text: &str) -> String {
    // "%20" can only come from a space: a literal '%' is itself escaped
    let encoded = urlencoding::encode(text).replace("%20", "+");

    let mut escaped = String::with_capacity(encoded.len());
    let mut hex_left = 0;
    for c in encoded.chars() {
        if hex_left > 0 {
            escaped.push(c.to_ascii_lowercase());
            hex_left -= 1;
        } else {
            if c == '%' {
                hex_left = 2;
            }
            escaped.push(c);
        }
    }
    escaped
}
