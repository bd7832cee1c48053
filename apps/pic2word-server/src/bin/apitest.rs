//! Gemini API key check
//!
//! Sends one small text request with the configured (or given) key and
//! reports whether the API accepted it.

use clap::Parser;

use pic2word_server::config::Config;
use pic2word_server::transcribe::{GeminiTranscriber, Transcriber};

#[derive(Debug, Parser)]
#[command(name = "apitest", version, about = "Check that a Gemini API key works")]
struct Args {
    /// API key to test, used when GOOGLE_API_KEY is not set
    api_key: Option<String>,
}

/// The configured key wins; the argument is only a fallback
fn resolve_key(configured: &str, argument: Option<String>) -> Option<String> {
    Some(configured.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(|| argument.map(|key| key.trim().to_string()).filter(|key| !key.is_empty()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        eprintln!("No .env file found, falling back to the environment and arguments");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pic2word_server=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    config.gemini.api_key = resolve_key(&config.gemini.api_key, args.api_key).ok_or_else(|| {
        anyhow::anyhow!("no API key given; set GOOGLE_API_KEY in .env or pass it as an argument\nusage: apitest [API_KEY]")
    })?;

    match config.gemini.masked_key() {
        Some(masked) => println!("Testing API key {}", masked),
        None => println!("Testing API key (shorter than expected)"),
    }

    let transcriber = GeminiTranscriber::new(&config.gemini)?;
    transcriber
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("API test failed: {}", e))?;

    println!("API test succeeded, the key is valid and usable");
    Ok(())
}
