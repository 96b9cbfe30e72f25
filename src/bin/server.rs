//! Server binary for wedcard.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to a `WedcardConfig` and serves the REST surface.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wedcard::WedcardConfig;

#[derive(Debug, Parser)]
#[command(
    name = "wedcard-server",
    version,
    about = "Wedding invitation generation service"
)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "WEDCARD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Directory generated images are written into.
    #[arg(long, env = "WEDCARD_OUTPUT_DIR", default_value = "static/generated")]
    output_dir: PathBuf,

    /// Base URL minted into returned image URLs.
    #[arg(long, env = "WEDCARD_PUBLIC_URL", default_value = "http://localhost:8000")]
    public_base_url: String,

    /// Text generation model id.
    #[arg(long, env = "WEDCARD_TEXT_MODEL", default_value = "gemini-2.0-flash-exp")]
    text_model: String,

    /// Image generation model id.
    #[arg(
        long,
        env = "WEDCARD_IMAGE_MODEL",
        default_value = "gemini-3-pro-image-preview"
    )]
    image_model: String,

    /// Per-provider-call timeout in seconds.
    #[arg(long, env = "WEDCARD_API_TIMEOUT", default_value_t = 60)]
    api_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so EnvFilter and the key lookups both see it.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let env_config = WedcardConfig::from_env();
    let mut builder = WedcardConfig::builder()
        .output_dir(args.output_dir.clone())
        .public_base_url(args.public_base_url.clone())
        .text_model(args.text_model.clone())
        .image_model(args.image_model.clone())
        .api_timeout_secs(args.api_timeout_secs);
    if let Some(key) = env_config.gemini_api_key {
        builder = builder.gemini_api_key(key);
    }
    if let Some(key) = env_config.meshy_api_key {
        builder = builder.meshy_api_key(key);
    }
    if let Some(key) = env_config.maps_api_key {
        builder = builder.maps_api_key(key);
    }
    let config = builder.build()?;

    tracing::info!(?config, "starting wedcard server");

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    wedcard::server::serve(config, addr).await?;
    Ok(())
}
