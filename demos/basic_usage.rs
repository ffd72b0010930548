use qsig::{Signer, StartTime, Token};

const PATH: &str = "/sign/base/dir/of/path/because/cnt/is/set/to/minus1";
const RGX: &str = r"/sign/base/dir/of/path/because/cnt/is/set/to/minus(\d+)";

fn main() {
    // Fixed start time so the output is reproducible across runs
    let signer = Signer::builder()
        .key("abdabcabcd")
        .start_time(StartTime::At(100_000))
        .window_seconds(120)
        .build()
        .expect("Failed to build signer");

    print_token(
        "all",
        signer.sign_all(PATH).expect("Failed to sign whole path"),
    );
    print_token(
        "sgn (all but last segment)",
        signer
            .sign_last_segment(PATH, 0)
            .expect("Failed to sign segments"),
    );
    print_token(
        "sgn (first 5 segments)",
        signer
            .sign_segments(PATH, 5, 0)
            .expect("Failed to sign segments"),
    );
    print_token(
        "cfg-rgh",
        signer
            .sign_config_regex_hash(PATH, RGX, "$1")
            .expect("Failed to sign regex hash"),
    );
    print_token(
        "rgh",
        signer
            .sign_regex_hash(PATH, RGX, "$1")
            .expect("Failed to sign regex hash"),
    );
    print_token(
        "rgm",
        signer
            .sign_regex_match(PATH, RGX)
            .expect("Failed to sign regex match"),
    );

    // The same token with its header segment kept
    let full = Signer::builder()
        .key("abdabcabcd")
        .start_time(StartTime::At(100_000))
        .window_seconds(120)
        .trim_header(false)
        .build()
        .expect("Failed to build signer");
    print_token(
        "all (header kept)",
        full.sign_all(PATH).expect("Failed to sign whole path"),
    );
}

/// Print a token with its decoded claims
fn print_token(label: &str, token: Token) {
    println!("{label}:");
    println!("  token:  {token}");
    println!("  typ:    {}", token.claims.typ().unwrap_or("-"));
    println!("  exp:    {}", token.claims.exp().unwrap_or_default());
    if let Some(hsh) = token.claims.hsh() {
        println!("  hsh:    {hsh}");
    }
    if let Some(cnt) = token.claims.cnt() {
        println!("  cnt:    {cnt}");
    }
    if let Some(rgx) = token.claims.rgx() {
        println!("  rgx:    {rgx}");
    }
    println!();
}
