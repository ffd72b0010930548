//! Command-line front-end: sign one path and print the resulting URL.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use qsig::{Signer, StartTime, Token, TokenLocation, TokenType};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "qsig", version, about = "Generate signed, time-limited qsig URLs")]
struct Cli {
    /// Path to sign, query string included
    #[arg(short, long, default_value = "/demo/path/for/signing?with=args")]
    path: String,

    /// Key identifier written to the token
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    kid: i64,

    /// Secret key
    #[arg(long, env = "QSIG_KEY", default_value = "secret0", hide_env_values = true)]
    key: String,

    /// Token type: all, sgn, rgm, rgh or cfg-rgh
    #[arg(short, long, default_value = "sgn")]
    typ: TokenType,

    /// Segments to sign (sgn); zero or less signs all but the last segment
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    cnt: i64,

    /// Leading segments to skip (sgn)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    off: i64,

    /// Match rule (rgm, rgh, cfg-rgh)
    #[arg(long, default_value = "(.*)")]
    rgx: String,

    /// Build template (rgh, cfg-rgh)
    #[arg(long, default_value = "$1")]
    rgb: String,

    /// Bind the token to this client IP
    #[arg(long)]
    cip: Option<String>,

    /// Validity window in seconds
    #[arg(long, default_value_t = 120, allow_negative_numbers = true)]
    exp: i64,

    /// Host to prefix the output with (https://<host>)
    #[arg(long)]
    host: Option<String>,

    /// Start time: `now` or seconds since Unix epoch
    #[arg(long)]
    start: Option<StartTime>,

    /// Explicit expiration time in seconds since Unix epoch
    #[arg(long, allow_negative_numbers = true)]
    end: Option<i64>,

    /// Where the token goes: path, query or cookie
    #[arg(long, default_value = "path")]
    location: TokenLocation,

    /// Form-encode the covered string and client IP before use
    #[arg(long)]
    escape_early: bool,

    /// Keep the header segment in the token
    #[arg(long)]
    keep_header: bool,

    /// Log generation parameters
    #[arg(short, long)]
    verbose: bool,

    /// Exit with status 0 even when signing fails
    #[arg(long)]
    exit_zero_on_error: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "qsig=info" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_signer(cli: &Cli) -> Result<Signer> {
    let mut builder = Signer::builder()
        .key(cli.key.as_bytes())
        .key_id(cli.kid)
        .window_seconds(cli.exp)
        .escape_early(cli.escape_early)
        .verbose(cli.verbose)
        .token_location(cli.location)
        .trim_header(!cli.keep_header)
        .token_type(cli.typ);

    if let Some(ip) = &cli.cip {
        builder = builder.client_ip(ip.as_str());
    }
    if let Some(start) = cli.start {
        builder = builder.start_time(start);
    }
    if let Some(end) = cli.end {
        builder = builder.end_time(end);
    }

    Ok(builder.build()?)
}

fn sign(cli: &Cli, signer: &Signer) -> Result<Token> {
    let path = cli.path.as_str();
    let token = match cli.typ {
        TokenType::All => signer.sign_all(path)?,
        TokenType::Segments if cli.cnt > 0 => signer.sign_segments(path, cli.cnt, cli.off)?,
        TokenType::Segments => signer.sign_last_segment(path, cli.off)?,
        TokenType::RegexMatch => signer.sign_regex_match(path, &cli.rgx)?,
        TokenType::RegexHash => signer.sign_regex_hash(path, &cli.rgx, &cli.rgb)?,
        TokenType::ConfigRegexHash => signer.sign_config_regex_hash(path, &cli.rgx, &cli.rgb)?,
    };
    Ok(token)
}

fn run(cli: &Cli) -> Result<String> {
    let signer = build_signer(cli)?;
    let token = sign(cli, &signer)?;

    let prefix = cli
        .host
        .as_deref()
        .map(|host| format!("https://{host}"))
        .unwrap_or_default();

    let output = match cli.location {
        TokenLocation::Cookie => format!(
            "{prefix}{}\nCookie: {}",
            cli.path,
            signer.embed(&cli.path, &token)
        ),
        _ => format!("{prefix}{}", signer.embed(&cli.path, &token)),
    };
    Ok(output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("Error: {err}");
            if cli.exit_zero_on_error {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
