//! Tests for qsig

use crate::{
    claims::{ClaimValue, ClaimsMap, TokenType},
    encoding::{decode_segment, encode_bytes},
    error::Error,
    header::Algorithm,
    path::PathRule,
    signer::{Signer, SignerBuilder, StartTime},
    url::TokenLocation,
    utils::{compute_hmac_sha256, md5_hex, FixedClock},
};
use std::sync::Arc;
use std::thread;

const LEGACY_KEY: &str = "abdabcabcd";
const LEGACY_PATH: &str = "/sign/base/dir/of/path/because/cnt/is/set/to/minus1";
const LEGACY_RGX: &str = r"/sign/base/dir/of/path/because/cnt/is/set/to/minus(\d+)";
const DEFAULT_HEADER_SEGMENT: &str = "eyJhbGciOiJIUzI1NiJ9";

/// Builder matching the tokens issued by the legacy producer: start 100000,
/// 120 second window.
fn legacy_builder() -> SignerBuilder {
    Signer::builder()
        .key(LEGACY_KEY)
        .start_time(StartTime::At(100_000))
        .window_seconds(120)
        .clock(FixedClock(99_000))
}

fn legacy_signer() -> Signer {
    legacy_builder().build().expect("Failed to build signer")
}

#[test]
fn test_all_token_known_answer() {
    let token = legacy_signer()
        .sign_all(LEGACY_PATH)
        .expect("Failed to sign token");

    assert_eq!(
        token.as_str(),
        "eyJleHAiOjEwMDEyMCwiaHNoIjoiNTgyM2U0ZWZkOTg5MDVjZTJjY2UxM2YxMDljZDM4Y2IiLCJraWQiOjAsInR5cCI6ImFsbCJ9\
         .8HkTjFhBowhWpKAhlW2TlHiV_x9P9TsZp0_y64xtQHU"
    );
    assert_eq!(token.claims.hsh(), Some("5823e4efd98905ce2cce13f109cd38cb"));
}

#[test]
fn test_untrimmed_token_known_answer() {
    let signer = legacy_builder()
        .trim_header(false)
        .build()
        .expect("Failed to build signer");
    let token = signer.sign_all(LEGACY_PATH).expect("Failed to sign token");

    assert!(!token.is_header_trimmed());
    assert_eq!(token.as_str().split('.').count(), 3);
    assert_eq!(
        token.as_str(),
        "eyJhbGciOiJIUzI1NiJ9\
         .eyJleHAiOjEwMDEyMCwiaHNoIjoiNTgyM2U0ZWZkOTg5MDVjZTJjY2UxM2YxMDljZDM4Y2IiLCJraWQiOjAsInR5cCI6ImFsbCJ9\
         .8HkTjFhBowhWpKAhlW2TlHiV_x9P9TsZp0_y64xtQHU"
    );
}

#[test]
fn test_trimmed_token_is_untrimmed_without_header() {
    let token = legacy_signer()
        .sign_segments(LEGACY_PATH, 5, 0)
        .expect("Failed to sign token");

    assert!(token.is_header_trimmed());
    assert_eq!(token.header_segment(), DEFAULT_HEADER_SEGMENT);
    assert_eq!(
        token.untrimmed(),
        format!("{DEFAULT_HEADER_SEGMENT}.{}", token.as_str())
    );
}

#[test]
fn test_segments_token_known_answer() {
    let token = legacy_signer()
        .sign_segments(LEGACY_PATH, 5, 0)
        .expect("Failed to sign token");

    assert_eq!(
        token.as_str(),
        "eyJjbnQiOjUsImV4cCI6MTAwMTIwLCJoc2giOiI4ZDk1YjhjOWE3ZGM3ZWViZjdjY2Y3M2FlYTRlNmJkYyIsImtpZCI6MCwidHlwIjoic2duIn0\
         .uAcMD8MLaHCG766N0l5bqpXb8jlOrcyTHvgv5yMthtA"
    );
    assert_eq!(token.claims.cnt(), Some(5));
    assert_eq!(token.claims.off(), None);
}

#[test]
fn test_last_segment_token_known_answer() {
    let token = legacy_signer()
        .sign_last_segment(LEGACY_PATH, 0)
        .expect("Failed to sign token");

    assert_eq!(token.claims.cnt(), Some(10));
    assert_eq!(
        token.as_str(),
        "eyJjbnQiOjEwLCJleHAiOjEwMDEyMCwiaHNoIjoiMWVjMWU4YzViNmE5NGVkZjgwM2YyMmEwYjUzOTkwMGQiLCJraWQiOjAsInR5cCI6InNnbiJ9\
         .waIPZBMfgjG6XVKQMjbvV5C9FiaLDQu0EjoEgqrmnV4"
    );
}

#[test]
fn test_regex_hash_token_known_answer() {
    let token = legacy_signer()
        .sign_regex_hash(LEGACY_PATH, LEGACY_RGX, "$1")
        .expect("Failed to sign token");

    assert_eq!(token.claims.hsh(), Some(md5_hex("1").unwrap().as_str()));
    assert_eq!(
        token.as_str(),
        "eyJleHAiOjEwMDEyMCwiaHNoIjoiYzRjYTQyMzhhMGI5MjM4MjBkY2M1MDlhNmY3NTg0OWIiLCJraWQiOjAsInJnYiI6IiQxIiwicmd4IjoiL3NpZ24vYmFzZS9kaXIvb2YvcGF0aC9iZWNhdXNlL2NudC9pcy9zZXQvdG8vbWludXMoXFxkKykiLCJ0eXAiOiJyZ2gifQ\
         .LhtWq5bXZIS0YrcDkKXZPPQf2dLIbObZyg1j0mQleUc"
    );
}

#[test]
fn test_config_regex_hash_token_known_answer() {
    let token = legacy_signer()
        .sign_config_regex_hash(LEGACY_PATH, LEGACY_RGX, "$1")
        .expect("Failed to sign token");

    assert!(!token.claims.contains("rgx"));
    assert!(!token.claims.contains("rgb"));
    assert_eq!(
        token.as_str(),
        "eyJleHAiOjEwMDEyMCwiaHNoIjoiYzRjYTQyMzhhMGI5MjM4MjBkY2M1MDlhNmY3NTg0OWIiLCJraWQiOjAsInR5cCI6ImNmZy1yZ2gifQ\
         .am_9tvA8pn4wC9xdyBg3rjNswNrZIUeRUGRRoZ63heY"
    );
}

#[test]
fn test_regex_match_token_known_answer() {
    let token = legacy_signer()
        .sign_regex_match(LEGACY_PATH, LEGACY_RGX)
        .expect("Failed to sign token");

    assert!(!token.claims.contains("hsh"));
    assert_eq!(
        token.as_str(),
        "eyJleHAiOjEwMDEyMCwia2lkIjowLCJyZ3giOiIvc2lnbi9iYXNlL2Rpci9vZi9wYXRoL2JlY2F1c2UvY250L2lzL3NldC90by9taW51cyhcXGQrKSIsInR5cCI6InJnbSJ9\
         .jKv8R4Re6FikaYogJqCW1uDWNwed50_odfm39eaEOyw"
    );
}

#[test]
fn test_client_ip_token_known_answer() {
    let signer = Signer::builder()
        .key("secret0")
        .key_id(7)
        .client_ip("10.0.0.1")
        .end_time(1_700_000_600)
        .build()
        .expect("Failed to build signer");
    let token = signer.sign_all("/x").expect("Failed to sign token");

    assert_eq!(
        token.as_str(),
        "eyJjaXAiOiIxMC4wLjAuMSIsImV4cCI6MTcwMDAwMDYwMCwiaHNoIjoiY2M4NzU1NjA5YWQ2MTg2NDkxMGYxNDUxMTk3MTNkZTkiLCJraWQiOjcsInR5cCI6ImFsbCJ9\
         .YE2OljxR4oaPUKMOkByjj0U_psbgOyT_IXucDhjvMQk"
    );
}

#[test]
fn test_signature_is_hmac_of_signing_input() {
    let token = legacy_signer()
        .sign_regex_hash(LEGACY_PATH, LEGACY_RGX, "$1")
        .expect("Failed to sign token");

    let mac = compute_hmac_sha256(LEGACY_KEY.as_bytes(), token.signing_input().as_bytes());
    assert_eq!(token.signature(), encode_bytes(&mac).unwrap());
    assert!(token
        .signing_input()
        .starts_with(&format!("{DEFAULT_HEADER_SEGMENT}.")));
}

#[test]
fn test_segments_contain_no_padding() {
    let signer = legacy_signer();
    for path in ["/a", "/ab", "/abc", "/abcd", "/a/b/c/d/e?x=1"] {
        let token = signer.sign_all(path).expect("Failed to sign token");
        for segment in token.untrimmed().split('.') {
            assert!(!segment.is_empty());
            assert!(!segment.contains('='), "padding in {segment}");
        }
    }
}

#[test]
fn test_deterministic_with_fixed_clock() {
    let signer = Signer::builder()
        .key("secret0")
        .window_seconds(300)
        .clock(FixedClock(1_700_000_000))
        .build()
        .expect("Failed to build signer");

    let first = signer.sign_segments("/a/b/c/d/e", 3, 0).unwrap();
    let second = signer.sign_segments("/a/b/c/d/e", 3, 0).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.claims.exp(), Some(1_700_000_300));
}

#[test]
fn test_payload_segment_decodes_to_claims() {
    let token = legacy_signer()
        .sign_regex_hash(LEGACY_PATH, LEGACY_RGX, "$1")
        .expect("Failed to sign token");

    let decoded = decode_segment(token.payload_segment()).expect("Failed to decode payload");
    assert_eq!(&decoded, token.claims.as_map());
    assert_eq!(decoded.get("rgx").and_then(ClaimValue::as_str), Some(LEGACY_RGX));
}

#[test]
fn test_window_from_start_time() {
    let signer = legacy_signer();
    let expiry = signer.resolve_expiry().unwrap();
    assert_eq!(expiry.start, Some(100_000));
    assert_eq!(expiry.end, 100_120);

    let signer = Signer::builder()
        .key("secret0")
        .start_at(100_000)
        .window_seconds(100)
        .build()
        .unwrap();
    assert_eq!(signer.resolve_expiry().unwrap().end, 100_100);
}

#[test]
fn test_window_from_now() {
    let signer = Signer::builder()
        .key("secret0")
        .window_seconds(60)
        .clock(FixedClock(1_000))
        .build()
        .unwrap();
    let expiry = signer.resolve_expiry().unwrap();
    assert_eq!(expiry.start, None);
    assert_eq!(expiry.end, 1_060);

    let signer = Signer::builder()
        .key("secret0")
        .start_time(StartTime::Now)
        .window_seconds(60)
        .clock(FixedClock(1_000))
        .build()
        .unwrap();
    let expiry = signer.resolve_expiry().unwrap();
    assert_eq!(expiry.start, Some(1_000));
    assert_eq!(expiry.end, 1_060);
}

#[test]
fn test_end_time_wins_over_window() {
    let signer = Signer::builder()
        .key("secret0")
        .start_at(500)
        .end_time(600)
        .window_seconds(10)
        .build()
        .unwrap();
    assert_eq!(signer.resolve_expiry().unwrap().end, 600);
}

#[test]
fn test_already_expired() {
    let signer = Signer::builder()
        .key("secret0")
        .start_at(500)
        .end_time(500)
        .build()
        .unwrap();

    assert!(matches!(
        signer.sign_all("/x"),
        Err(Error::AlreadyExpired {
            start: 500,
            end: 500
        })
    ));

    let signer = Signer::builder()
        .key("secret0")
        .start_at(500)
        .end_time(499)
        .build()
        .unwrap();
    assert!(matches!(
        signer.sign_all("/x"),
        Err(Error::AlreadyExpired { .. })
    ));
}

#[test]
fn test_missing_expiration() {
    let signer = Signer::builder().key("secret0").build().unwrap();
    assert!(matches!(signer.sign_all("/x"), Err(Error::MissingExpiration)));

    let signer = Signer::builder()
        .key("secret0")
        .start_at(500)
        .build()
        .unwrap();
    assert!(matches!(signer.sign_all("/x"), Err(Error::MissingExpiration)));
}

#[test]
fn test_time_checked_before_path() {
    let signer = Signer::builder().key("secret0").build().unwrap();
    assert!(matches!(
        signer.sign_segments("/a", 0, 0),
        Err(Error::MissingExpiration)
    ));
}

#[test]
fn test_time_parameters_must_be_positive() {
    let cases = [
        (Signer::builder().start_at(-5).window_seconds(60), "start_time"),
        (Signer::builder().start_at(0).window_seconds(60), "start_time"),
        (Signer::builder().end_time(0), "end_time"),
        (Signer::builder().end_time(-1), "end_time"),
        (Signer::builder().window_seconds(0), "window_seconds"),
        (Signer::builder().window_seconds(-60), "window_seconds"),
    ];

    for (builder, expected) in cases {
        let signer = builder.key("secret0").build().unwrap();
        match signer.sign_all("/x") {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, expected),
            other => panic!("expected invalid {expected}, got {other:?}"),
        }
    }
}

#[test]
fn test_start_time_parsing() {
    assert_eq!("now".parse::<StartTime>().unwrap(), StartTime::Now);
    assert_eq!("NOW".parse::<StartTime>().unwrap(), StartTime::Now);
    assert_eq!(
        "100000".parse::<StartTime>().unwrap(),
        StartTime::At(100_000)
    );
    assert!(matches!(
        "tomorrow".parse::<StartTime>(),
        Err(Error::InvalidParameter {
            name: "start_time",
            ..
        })
    ));
}

#[test]
fn test_key_required() {
    assert!(matches!(
        Signer::builder().window_seconds(60).build(),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        Signer::builder().key("").window_seconds(60).build(),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_segments_on_short_path() {
    let signer = legacy_signer();

    let token = signer.sign_segments("/a/b/c/d/e", 2, 2).unwrap();
    assert_eq!(token.claims.hsh(), Some(md5_hex("/c/d").unwrap().as_str()));
    assert_eq!(token.claims.off(), Some(2));

    assert!(matches!(
        signer.sign_segments("/a/b/c/d/e", 4, 2),
        Err(Error::PathFormat {
            count: 4,
            offset: 2,
            ..
        })
    ));
    assert!(matches!(
        signer.sign_last_segment("/file.ts", 1),
        Err(Error::InvalidParameter { name: "count", .. })
    ));
}

#[test]
fn test_last_segment_rejects_negative_offset() {
    let signer = legacy_signer();
    for offset in [-1, i64::MIN] {
        assert!(matches!(
            signer.sign_last_segment("/a/b/c", offset),
            Err(Error::InvalidParameter { name: "offset", .. })
        ));
    }
    assert!(matches!(
        signer.sign_last_segment("/a/b/c", i64::MAX),
        Err(Error::InvalidParameter { name: "count", .. })
    ));
}

#[test]
fn test_md5_hex_digest() {
    assert_eq!(md5_hex("7").unwrap(), "8f14e45fceea167a5a36dedd4bea2543");
    assert_eq!(md5_hex("/a/b/c").unwrap(), "77e3b8b350a61e972a8cfb7dcc886145");
    assert_eq!(md5_hex(LEGACY_PATH).unwrap(), "5823e4efd98905ce2cce13f109cd38cb");
}

#[test]
fn test_regex_capture_hashed() {
    let token = legacy_signer()
        .sign_regex_hash("/sign/base/minus7", r"/sign/base/minus(\d+)", "$1")
        .unwrap();
    assert_eq!(token.claims.hsh(), Some("8f14e45fceea167a5a36dedd4bea2543"));
    assert_eq!(token.claims.rgx(), Some(r"/sign/base/minus(\d+)"));
    assert_eq!(token.claims.rgb(), Some("$1"));
}

#[test]
fn test_regex_no_match() {
    assert!(matches!(
        legacy_signer().sign_regex_match("/other", r"^/sign/"),
        Err(Error::NoRegexMatch { .. })
    ));
}

#[test]
fn test_escape_early_on_client_ip_and_hash() {
    let signer = legacy_builder()
        .client_ip("a:b")
        .escape_early(true)
        .build()
        .unwrap();
    let token = signer.sign_all("/a b/c").unwrap();

    assert_eq!(token.claims.cip(), Some("a%3ab"));
    assert_eq!(token.claims.hsh(), Some("9a429b0fce5acbcef3ca1c03a45a0de0"));

    let signer = legacy_builder().client_ip("a:b").build().unwrap();
    let token = signer.sign_all("/a b/c").unwrap();
    assert_eq!(token.claims.cip(), Some("a:b"));
    assert_eq!(token.claims.hsh(), Some("c0dedf885318ce568e8574ec64b1de4a"));
}

#[test]
fn test_base_payload_overridden_by_derived_claims() {
    let signer = legacy_builder()
        .key_id(3)
        .payload_claim("kid", 99)
        .payload_claim("exp", 1)
        .payload_claim("typ", "bogus")
        .payload_claim("ext", "kept")
        .build()
        .unwrap();
    let token = signer.sign_all("/x").unwrap();

    assert_eq!(token.claims.kid(), Some(3));
    assert_eq!(token.claims.exp(), Some(100_120));
    assert_eq!(token.claims.typ(), Some("all"));
    assert_eq!(
        token.claims.get("ext").and_then(ClaimValue::as_str),
        Some("kept")
    );
}

#[test]
fn test_base_header_alg_forced() {
    let mut base = ClaimsMap::new();
    base.insert("alg".to_string(), ClaimValue::from("none"));
    base.insert("cty".to_string(), ClaimValue::from("qsig"));

    let signer = legacy_builder().base_header(base).build().unwrap();
    assert_eq!(signer.header().algorithm(), Some(Algorithm::Hs256));

    let token = signer.sign_all("/x").unwrap();
    let header = decode_segment(token.header_segment()).unwrap();
    assert_eq!(header.get("alg").and_then(ClaimValue::as_str), Some("HS256"));
    assert_eq!(header.get("cty").and_then(ClaimValue::as_str), Some("qsig"));
    assert_ne!(token.header_segment(), DEFAULT_HEADER_SEGMENT);
}

#[test]
fn test_embed_locations() {
    let path = "/videos/seg.ts";
    for (location, expected) in [
        (TokenLocation::PathPrefix, "/qsig={t}/videos/seg.ts"),
        (TokenLocation::QueryParam, "/videos/seg.ts?qsig={t}"),
        (TokenLocation::Cookie, "qsig={t}"),
    ] {
        let signer = legacy_builder().token_location(location).build().unwrap();
        let token = signer.sign_all(path).unwrap();
        assert_eq!(
            signer.embed(path, &token),
            expected.replace("{t}", token.as_str())
        );
    }
}

#[test]
fn test_diagnostic_token_type_does_not_change_token() {
    let plain = legacy_signer().sign_all(LEGACY_PATH).unwrap();
    let tagged = legacy_builder()
        .token_type(TokenType::RegexMatch)
        .token_name("edge_token")
        .verbose(true)
        .build()
        .unwrap()
        .sign_all(LEGACY_PATH)
        .unwrap();

    assert_eq!(plain, tagged);
}

#[test]
fn test_sign_with_rule() {
    let signer = legacy_signer();
    let direct = signer
        .sign(LEGACY_PATH, &PathRule::regex_hash(LEGACY_RGX, "$1"))
        .unwrap();
    let helper = signer.sign_regex_hash(LEGACY_PATH, LEGACY_RGX, "$1").unwrap();
    assert_eq!(direct, helper);

    let claims = signer.claims(LEGACY_PATH, &PathRule::All).unwrap();
    let token = signer.sign_all(LEGACY_PATH).unwrap();
    assert_eq!(claims, token.claims);
}

#[test]
fn test_signer_shared_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Signer>();

    let signer = Arc::new(legacy_signer());
    let expected = signer.sign_all(LEGACY_PATH).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let signer = Arc::clone(&signer);
            thread::spawn(move || signer.sign_all(LEGACY_PATH).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_signer_debug_hides_key() {
    let debug = format!("{:?}", legacy_signer());
    assert!(!debug.contains(LEGACY_KEY));
    assert!(debug.contains("<10 bytes>"));
}
