//! Analyze an image URL and print the canonical response
//!
//! Usage:
//!   cargo run --example analyze_url -- <config.yaml> <image-url> [requirements] [engine]
//!
//! `requirements` is a comma-separated list (default `caption,read,objects`),
//! `engine` is `typed` or `rest`. Set `RUST_LOG=vision_core=debug` to see
//! retry decisions. Ctrl-C cancels the request.

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use vision_core::config::load_from_yaml;
use vision_core::http::resolve_correlation_id;
use vision_core::protocol::{AnalyzeUrlRequest, CapabilitySet, Transport};
use vision_core::VisionAnalysisService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vision_core=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(url)) = (args.next(), args.next()) else {
        bail!("usage: analyze_url <config.yaml> <image-url> [requirements] [engine]");
    };
    let requirements = args.next().unwrap_or_else(|| "caption,read,objects".to_string());
    let engine = match args.next().as_deref() {
        None | Some("typed") | Some("sdk") => Transport::Typed,
        Some("rest") => Transport::RestJson,
        Some(other) => bail!("unknown engine '{}', expected typed or rest", other),
    };

    let config = load_from_yaml(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;
    let service = VisionAnalysisService::from_config(&config)?;

    let request = AnalyzeUrlRequest::new(url, CapabilitySet::from_names(requirements.split(',')))
        .with_engine(engine);
    let correlation_id = resolve_correlation_id(std::env::var("CORRELATION_ID").ok().as_deref());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let response = service
        .analyze_url(&correlation_id, &request, &cancel)
        .await
        .context("analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
