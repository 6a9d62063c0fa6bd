mod cleanup;
mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use config::{CliOverrides, ResolvedConfig};
use imgcompare::{ChromeRenderer, CompareOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("imgcompare=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = ResolvedConfig::new(CliOverrides {
        config: cli.config.clone(),
        tolerance: cli.tolerance,
        svg: cli.svg.clone(),
    })?;

    let (width, height) = config.svg.window();
    let mut renderer = ChromeRenderer::new(tokio::runtime::Handle::current())
        .with_window(width, height)
        .with_timeout(config.svg.timeout());
    if let Some(chrome) = &config.svg.chrome {
        renderer = renderer.with_chrome(chrome.clone());
    }

    let base = cli.base.clone();
    let compare = cli.compare.clone();
    let tolerance = config.tolerance;
    let outcome = tokio::task::spawn_blocking(move || {
        imgcompare::compare_images(
            &base,
            &compare,
            CompareOptions {
                tolerance,
                svg_renderer: Some(&renderer),
            },
        )
    })
    .await
    .context("Comparison task panicked")?
    .context("Error comparing images")?;

    match cli.format {
        cli::OutputFormat::Text => println!("Comparison result: {outcome}"),
        cli::OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?
        ),
    }

    if cli.clean {
        let paths = cleanup::artifacts(&cli.base, &cli.compare, &outcome);
        for (path, result) in cleanup::remove(paths) {
            match cli.format {
                cli::OutputFormat::Text => println!("{}", cleanup::report_line(&path, &result)),
                // Keep stdout a single JSON document.
                cli::OutputFormat::Json => match result {
                    Ok(()) => info!(path = %path.display(), "removed"),
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to remove"),
                },
            }
        }
    }

    if !outcome.is_match() {
        std::process::exit(1);
    }
    Ok(())
}
