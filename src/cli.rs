//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::adapters::alpha_vantage::AlphaVantageAdapter;
use crate::adapters::csv_export;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_credential_store::{FileCredentialStore, InMemoryCredentialStore};
use crate::domain::error::AlphaChartError;
use crate::domain::indicator::calculate_rsi;
use crate::domain::interval::Interval;
use crate::domain::query::QueryParams;
use crate::domain::settings::AppConfig;
use crate::ports::credential_port::CredentialStore;
use crate::ports::quote_port::QuotePort;

pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";
pub const LOG_ENV: &str = "ALPHACHART_LOG";

#[derive(Parser, Debug)]
#[command(name = "alphachart", about = "Intraday candlestick dashboard for Alpha Vantage")]
pub struct Cli {
    /// INI config file; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web dashboard
    Serve {
        #[arg(long)]
        listen: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<Interval>,
        #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Fetch the intraday window once and write it as CSV
    Fetch {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<Interval>,
        #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Store an API key in the credential file
    SetKey { api_key: String },
    /// Print the effective configuration
    ShowConfig,
}

/// Logs go to stderr so `fetch` output on stdout stays clean.
pub fn init_logging() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = match cli.command {
        Command::Serve {
            listen,
            symbol,
            interval,
            api_key,
        } => run_serve(config, listen, symbol, interval, api_key),
        Command::Fetch {
            symbol,
            interval,
            api_key,
            output,
        } => run_fetch(&config, symbol, interval, api_key, output),
        Command::SetKey { api_key } => run_set_key(&config, &api_key),
        Command::ShowConfig => run_show_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, ExitCode> {
    let adapter = match path {
        Some(path) => FileConfigAdapter::from_file(path).map_err(|e| {
            let err = AlphaChartError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            };
            eprintln!("error: {err}");
            ExitCode::from(&err)
        })?,
        None => FileConfigAdapter::empty(),
    };

    AppConfig::from_config(&adapter).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn credential_store(config: &AppConfig) -> Arc<dyn CredentialStore> {
    if config.persist_key {
        Arc::new(FileCredentialStore::new(config.key_file.clone()))
    } else {
        Arc::new(InMemoryCredentialStore::default())
    }
}

/// A non-empty command-line (or environment) key wins over the stored one.
pub fn resolve_api_key(
    flag: Option<String>,
    store: &dyn CredentialStore,
) -> Result<String, AlphaChartError> {
    match flag.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        Some(key) => Ok(key),
        None => Ok(store.load()?.unwrap_or_default()),
    }
}

fn query_params(
    config: &AppConfig,
    symbol: Option<String>,
    interval: Option<Interval>,
    api_key: &str,
) -> QueryParams {
    QueryParams::new(
        symbol.as_deref().unwrap_or(&config.default_symbol),
        interval.unwrap_or(config.default_interval),
        api_key,
    )
}

fn runtime() -> Result<tokio::runtime::Runtime, AlphaChartError> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn run_fetch(
    config: &AppConfig,
    symbol: Option<String>,
    interval: Option<Interval>,
    api_key: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), AlphaChartError> {
    let store = credential_store(config);
    let key = resolve_api_key(api_key, store.as_ref())?;
    let params = query_params(config, symbol, interval, &key);
    if params.api_key.is_empty() {
        return Err(AlphaChartError::ConfigMissing {
            section: "credentials".into(),
            key: "av_key".into(),
        });
    }

    let adapter = AlphaVantageAdapter::new(&config.base_url, config.timeout)?;
    let candles = runtime()?.block_on(adapter.fetch_candles(
        &params.symbol,
        &params.api_key,
        params.interval,
    ))?;
    let rsi = calculate_rsi(&candles, config.rsi_period);

    match &output {
        Some(path) => csv_export::write_candles(BufWriter::new(File::create(path)?), &candles, &rsi)?,
        None => csv_export::write_candles(io::stdout().lock(), &candles, &rsi)?,
    }

    eprintln!(
        "Fetched {} candles for {} ({})",
        candles.len(),
        params.symbol,
        params.interval
    );
    if let Some(last) = rsi.last_valid() {
        eprintln!("  {}: {:.2}", rsi.indicator_type, last);
    }
    Ok(())
}

fn run_set_key(config: &AppConfig, api_key: &str) -> Result<(), AlphaChartError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(AlphaChartError::Credential {
            reason: "API key must not be empty".into(),
        });
    }
    let store = FileCredentialStore::new(config.key_file.clone());
    store.save(key)?;
    eprintln!("Saved API key to {}", store.path().display());
    Ok(())
}

fn run_show_config(config: &AppConfig) -> Result<(), AlphaChartError> {
    let stored = FileCredentialStore::new(config.key_file.clone()).load()?;

    println!("[alphavantage]");
    println!("base_url = {}", config.base_url);
    println!("timeout_secs = {}", config.timeout.as_secs());
    println!();
    println!("[dashboard]");
    println!("symbol = {}", config.default_symbol);
    println!("interval = {}", config.default_interval);
    println!("poll_interval_secs = {}", config.poll_interval.as_secs());
    println!("rsi_period = {}", config.rsi_period);
    println!();
    println!("[web]");
    println!("listen = {}", config.listen);
    println!();
    println!("[credentials]");
    println!("key_file = {}", config.key_file.display());
    println!("persist = {}", config.persist_key);
    println!(
        "; stored key: {}",
        if stored.is_some() { "present" } else { "none" }
    );
    Ok(())
}

fn run_serve(
    config: AppConfig,
    listen: Option<String>,
    symbol: Option<String>,
    interval: Option<Interval>,
    api_key: Option<String>,
) -> Result<(), AlphaChartError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::refresh_service::RefreshService;
        use crate::adapters::web::{build_router, AppState};

        let store = credential_store(&config);
        let key = resolve_api_key(api_key, store.as_ref())?;
        let params = query_params(&config, symbol, interval, &key);
        let listen = listen.unwrap_or_else(|| config.listen.clone());

        let quotes = Arc::new(AlphaVantageAdapter::new(&config.base_url, config.timeout)?);

        runtime()?.block_on(async move {
            let refresh = RefreshService::new(quotes, store, params, config.poll_interval);
            refresh.mount();

            let router = build_router(AppState {
                refresh: refresh.clone(),
                rsi_period: config.rsi_period,
            });

            let listener = tokio::net::TcpListener::bind(listen.as_str()).await?;
            tracing::info!(addr = %listener.local_addr()?, "dashboard listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            refresh.shutdown();
            tracing::info!("dashboard stopped");
            Ok(())
        })
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config, listen, symbol, interval, api_key);
        Err(AlphaChartError::ConfigInvalid {
            section: "web".into(),
            key: "listen".into(),
            reason: "built without the web feature".into(),
        })
    }
}

#[cfg(feature = "web")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
    }
}
