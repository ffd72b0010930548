use qsig::{current_timestamp, Signer, StartTime, TokenLocation};

fn main() {
    let path = "/videos/2024/movie/seg-00042.ts";
    let host = "cdn.example.com";

    for location in [
        TokenLocation::PathPrefix,
        TokenLocation::QueryParam,
        TokenLocation::Cookie,
    ] {
        let signer = Signer::builder()
            .key("secret0")
            .key_id(7)
            .client_ip("203.0.113.9")
            .start_time(StartTime::Now)
            .window_seconds(300)
            .token_location(location)
            .build()
            .expect("Failed to build signer");

        // Cover the directory so one token serves every segment of the movie
        let token = signer
            .sign_last_segment(path, 0)
            .expect("Failed to sign path");

        println!("location = {location}");
        match location {
            TokenLocation::Cookie => {
                println!("  url:    https://{host}{path}");
                println!("  cookie: {}", signer.embed(path, &token));
            }
            _ => println!("  url:    https://{host}{}", signer.embed(path, &token)),
        }
        println!(
            "  valid for {} more seconds",
            token.claims.exp().unwrap_or_default() - current_timestamp()
        );
    }
}
