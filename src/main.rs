//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `wayback_redirects` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing report chunks, or serving the JSON API
//!
//! All core functionality is implemented in the library crate.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use wayback_redirects::initialization::init_logger_with;
use wayback_redirects::{check_domain_history, server, Config, HistoryContext, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let opt = Opt::parse();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(opt).await {
        Ok(true) => Ok(()),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("wayback_redirects error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns `false` when any domain check collapsed into an error.
async fn run(opt: Opt) -> Result<bool> {
    let serve_port = opt.serve;
    let domains = opt.domains.clone();
    let ctx = HistoryContext::new(Config::from(opt)).context("Failed to build HTTP clients")?;

    if let Some(port) = serve_port {
        let shutdown = CancellationToken::new();
        let on_signal = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Received Ctrl-C, shutting down");
            }
            on_signal.cancel();
        });
        server::serve(port, ctx, shutdown).await?;
        return Ok(true);
    }

    if domains.is_empty() {
        bail!("No domains given (pass one or more domains, or --serve <PORT>)");
    }

    let mut all_ok = true;
    for domain in &domains {
        let report = check_domain_history(&ctx, domain).await;
        for chunk in &report.message_chunks {
            println!("{}", chunk);
        }
        if report.is_error() {
            all_ok = false;
        } else {
            println!(
                "Checked {} in {}s ({} message{})",
                domain,
                report.execution_time.seconds,
                report.message_chunks.len(),
                if report.message_chunks.len() == 1 { "" } else { "s" }
            );
        }
    }
    ctx.dispose();
    Ok(all_ok)
}
