//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use crate::adapters::binance_adapter::BinanceAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::order_api_adapter::{HttpOrderAdapter, PaperOrderAdapter};
use crate::adapters::telegram_adapter::{LogNotifier, TelegramNotifier};
use crate::domain::config_validation::validate_scanner_config;
use crate::domain::error::TrailguardError;
use crate::domain::exit_policy::{ExitPolicy, ExitProfile};
use crate::domain::scanner::{ScanConfig, Scanner};
use crate::domain::signal::EntryProfile;
use crate::domain::trading_hours::TradingHours;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::order_port::OrderPort;
use crate::ports::position_store_port::PositionStorePort;

#[derive(Parser, Debug)]
#[command(name = "trailguard", about = "Crypto signal scanner with trailing-stop exits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scan loop
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Run a single scan cycle and exit
    Scan {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List open positions
    Positions {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Delete every open position from the store
    ClearPositions {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, cycles } => run_scanner(&config, cycles),
        Command::Scan { config } => run_scanner(&config, Some(1)),
        Command::Positions { config } => run_positions(&config),
        Command::ClearPositions { config } => run_clear_positions(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: TrailguardError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

pub fn build_entry_profile(config: &dyn ConfigPort) -> Result<EntryProfile, TrailguardError> {
    match config.get_string("scanner", "entry_profile").as_deref() {
        None | Some("tiered") => Ok(EntryProfile::Tiered),
        Some("crossover") => Ok(EntryProfile::Crossover),
        Some("adx") => {
            let EntryProfile::AdxGated {
                min_adx,
                min_ma_gap,
                min_avg_range,
            } = EntryProfile::adx_gated_default()
            else {
                unreachable!("adx_gated_default is AdxGated");
            };
            Ok(EntryProfile::AdxGated {
                min_adx: config.get_double("adx", "min_adx", min_adx),
                min_ma_gap: config.get_double("adx", "min_ma_gap", min_ma_gap),
                min_avg_range: config.get_double("adx", "min_avg_range", min_avg_range),
            })
        }
        Some(other) => Err(TrailguardError::ConfigInvalid {
            section: "scanner".into(),
            key: "entry_profile".into(),
            reason: format!("unknown entry profile '{other}'"),
        }),
    }
}

pub fn build_exit_policy(config: &dyn ConfigPort) -> Result<ExitPolicy, TrailguardError> {
    let profile = match config.get_string("exit", "profile").as_deref() {
        None | Some("tiered") => ExitProfile::Tiered,
        Some("profit_bucketed") => ExitProfile::ProfitBucketed,
        Some(other) => {
            return Err(TrailguardError::ConfigInvalid {
                section: "exit".into(),
                key: "profile".into(),
                reason: format!("unknown exit profile '{other}'"),
            });
        }
    };

    let policy = ExitPolicy::new(profile);
    if config.get_string("exit", "trailing_activation").is_none() {
        return Ok(policy);
    }
    let activation = config.get_double("exit", "trailing_activation", 0.0);
    Ok(policy.with_trailing_activation(activation))
}

pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, TrailguardError> {
    let raw_symbols =
        config
            .get_string("scanner", "symbols")
            .ok_or_else(|| TrailguardError::ConfigMissing {
                section: "scanner".into(),
                key: "symbols".into(),
            })?;
    let symbols = parse_symbols(&raw_symbols)?;

    let trading_hours = match config
        .get_string("scanner", "trading_hours")
        .filter(|s| !s.trim().is_empty())
    {
        Some(raw) => Some(raw.parse::<TradingHours>().map_err(|reason| {
            TrailguardError::ConfigInvalid {
                section: "scanner".into(),
                key: "trading_hours".into(),
                reason,
            }
        })?),
        None => None,
    };

    let defaults = ScanConfig::default();
    Ok(ScanConfig {
        symbols,
        interval: config
            .get_string("scanner", "interval")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.interval),
        candle_limit: config.get_int("scanner", "candle_limit", 100).max(1) as usize,
        scan_interval: Duration::from_secs(
            config.get_int("scanner", "scan_interval_seconds", 60).max(0) as u64,
        ),
        error_cooldown: Duration::from_secs(
            config.get_int("scanner", "error_cooldown_seconds", 10).max(0) as u64,
        ),
        leverage: config.get_double("scanner", "leverage", defaults.leverage),
        trading_hours,
        entry_profile: build_entry_profile(config)?,
        exit_policy: build_exit_policy(config)?,
        notify_excursion: config.get_bool("scanner", "notify_excursion", false),
    })
}

pub fn build_market(config: &dyn ConfigPort) -> Result<Box<dyn MarketDataPort>, TrailguardError> {
    match config.get_string("market", "source").as_deref() {
        Some("csv") => {
            let dir = config.get_string("market", "csv_dir").ok_or_else(|| {
                TrailguardError::ConfigMissing {
                    section: "market".into(),
                    key: "csv_dir".into(),
                }
            })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        _ => Ok(Box::new(BinanceAdapter::from_config(config)?)),
    }
}

pub fn build_orders(config: &dyn ConfigPort) -> Result<Box<dyn OrderPort>, TrailguardError> {
    if config.get_bool("scanner", "test_mode", true) {
        info!("test mode: orders are logged, not sent");
        return Ok(Box::new(PaperOrderAdapter));
    }
    Ok(Box::new(HttpOrderAdapter::from_config(config)?))
}

pub fn build_notifier(config: &dyn ConfigPort) -> Result<Box<dyn NotifyPort>, TrailguardError> {
    match TelegramNotifier::from_config(config)? {
        Some(telegram) => Ok(Box::new(telegram)),
        None => {
            info!("no telegram bot configured, notifications go to the log");
            Ok(Box::new(LogNotifier))
        }
    }
}

/// PostgreSQL when `[postgres] connection_string` is set and the feature is
/// built in, SQLite otherwise.
pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn PositionStorePort>, TrailguardError> {
    #[cfg(feature = "postgres")]
    {
        use crate::adapters::postgres_adapter::PostgresAdapter;

        if config.get_string("postgres", "connection_string").is_some() {
            let store = PostgresAdapter::from_config(config)?;
            store.initialize_schema()?;
            return Ok(Box::new(store));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let store = SqliteAdapter::from_config(config)?;
        store.initialize_schema()?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        Err(TrailguardError::ConfigMissing {
            section: "postgres".into(),
            key: "connection_string".into(),
        })
    }
}

fn run_scanner(config_path: &PathBuf, cycles: Option<usize>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_scanner_config(&adapter) {
        return fail(e);
    }

    let wired = (|| {
        Ok::<_, TrailguardError>((
            build_scan_config(&adapter)?,
            build_market(&adapter)?,
            build_orders(&adapter)?,
            build_notifier(&adapter)?,
            open_store(&adapter)?,
        ))
    })();
    let (scan_config, market, orders, notifier, store) = match wired {
        Ok(parts) => parts,
        Err(e) => return fail(e),
    };

    let scanner = Scanner::new(scan_config, &*market, &*orders, &*notifier, &*store);
    match scanner.run(cycles) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn run_positions(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let positions = match open_store(&adapter).and_then(|store| store.list()) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    if positions.is_empty() {
        println!("No open positions.");
        return ExitCode::SUCCESS;
    }

    println!(
        "{:<12} {:<6} {:<9} {:>14} {:>14}  {}",
        "SYMBOL", "SIDE", "STRENGTH", "ENTRY", "BEST", "OPENED"
    );
    for p in &positions {
        println!(
            "{:<12} {:<6} {:<9} {:>14.5} {:>14.5}  {}",
            p.symbol,
            p.direction.to_string(),
            p.strength.to_string(),
            p.entry_price,
            p.max_favorable_price,
            p.opened_at.format("%Y-%m-%d %H:%M")
        );
    }
    ExitCode::SUCCESS
}

fn run_clear_positions(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match open_store(&adapter).and_then(|store| store.clear()) {
        Ok(n) => {
            println!("Removed {n} position(s).");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_scanner_config(&adapter) {
        return fail(e);
    }
    match build_scan_config(&adapter) {
        Ok(config) => {
            println!("Configuration is valid.");
            println!("  Symbols:       {}", config.symbols.join(", "));
            println!("  Interval:      {}", config.interval);
            println!("  Entry profile: {}", config.entry_profile.name());
            println!("  Exit profile:  {}", config.exit_policy.profile.name());
            if let Some(hours) = config.trading_hours {
                println!("  Trading hours: {hours} UTC");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
