#![warn(
    rust_2024_compatibility,
    clippy::all,
    clippy::future_not_send,
    clippy::mod_module_files,
    clippy::needless_pass_by_ref_mut,
    clippy::unused_async
)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rama::{
    Layer as RamaLayer,
    graceful::Shutdown,
    http::{layer::trace::TraceLayer, server::HttpServer},
    layer::ConsumeErrLayer,
    rt::Executor,
    tcp::server::TcpListener,
};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use tinydelivr::config::Config;
use tinydelivr::server::Gateway;
use tinydelivr::tarcache::{self, CacheStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "tinydelivr npm file gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the gateway server
    Serve {
        /// Path to the configuration file
        #[arg(long, default_value = "tinydelivr.toml")]
        config: PathBuf,
    },
    /// Cache maintenance operations
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
    /// Perform a health check against a running instance
    Health {
        /// URL of the home page (defaults to local gateway)
        #[arg(long, default_value = "http://127.0.0.1:2357/")]
        url: String,
        /// Timeout in seconds for the request
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommand {
    /// Display tarball cache usage
    Stats {
        /// Path to the configuration file
        #[arg(long, default_value = "tinydelivr.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { config } => run_server(config),
        Command::Cache { action } => match action {
            CacheCommand::Stats { config } => run_stats(config),
        },
        Command::Health { url, timeout } => run_health(url, timeout),
    }
}

fn run_server(config_path: PathBuf) -> Result<()> {
    let config = Arc::new(Config::load(Some(config_path)).context("loading configuration")?);
    config.validate().context("validating configuration")?;
    init_tracing(&config)?;

    let gateway = Gateway::new(config.as_ref()).context("creating gateway service")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()
        .context("constructing server runtime")?;

    rt.block_on(async move {
        gateway
            .cache()
            .prepare()
            .await
            .context("preparing cache directory")?;
        match gateway.cache().usage() {
            Ok(usage) => tracing::info!(
                entries = usage.entries.len(),
                total = %tarcache::format_bytes(usage.total_bytes),
                "tarball cache ready"
            ),
            Err(err) => tracing::warn!(error = %err, "failed to read cache usage"),
        }

        let graceful = Shutdown::default();
        let addr = format!("{}:{}", config.server.host, config.server.port);

        tracing::info!(%addr, registry = %config.registry.url, "starting gateway");

        graceful.spawn_task_fn(move |guard| {
            let gateway = gateway.clone();
            let addr = addr.clone();
            async move {
                let tcp_service = TcpListener::build()
                    .bind(addr)
                    .await
                    .expect("bind gateway listener");

                let exec = Executor::graceful(guard.clone());
                let http_service = HttpServer::auto(exec).service(
                    (TraceLayer::new_for_http(), ConsumeErrLayer::default()).into_layer(gateway),
                );

                tcp_service.serve_graceful(guard, http_service).await;
            }
        });

        // Wait for ctrl+c to initiate graceful shutdown
        tokio::signal::ctrl_c()
            .await
            .context("listening for shutdown signal")?;

        graceful
            .shutdown_with_limit(Duration::from_secs(30))
            .await?;

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn run_stats(config_path: PathBuf) -> Result<()> {
    let config = Config::load(Some(config_path)).context("loading configuration")?;
    init_tracing(&config)?;

    let cache = CacheStore::new(&config.cache);
    let usage = cache.usage().context("scanning cache directory")?;

    println!("Tarball cache: {}", cache.root().display());
    println!("  entries: {}", usage.entries.len());
    println!("  total size: {}", tarcache::format_bytes(usage.total_bytes));
    if !usage.entries.is_empty() {
        println!("\nLargest entries:");
        println!("{}", tarcache::largest_entries_report(&usage));
    }

    Ok(())
}

fn run_health(url: String, timeout: u64) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()
        .context("building health check client")?;

    let response = client
        .get(&url)
        .send()
        .context("sending health check request")?;

    if response.status().is_success() {
        println!("tinydelivr healthy: {}", response.status());
        Ok(())
    } else {
        bail!("health endpoint returned status {}", response.status());
    }
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
        .context("building log filter")?;

    let fmt_layer = if config.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
