//! Configuration validation.
//!
//! Validates every scanner-facing key before the loop starts, so a bad
//! config fails at startup rather than mid-cycle.

use crate::domain::error::TrailguardError;
use crate::domain::trading_hours::TradingHours;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

const INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

pub fn validate_scanner_config(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    validate_symbols(config)?;
    validate_interval(config)?;
    validate_candle_limit(config)?;
    validate_timing(config)?;
    validate_leverage(config)?;
    validate_trading_hours(config)?;
    validate_entry_profile(config)?;
    validate_adx_thresholds(config)?;
    validate_exit(config)?;
    validate_market(config)?;
    validate_orders(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TrailguardError {
    TrailguardError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    let raw = config
        .get_string("scanner", "symbols")
        .ok_or_else(|| TrailguardError::ConfigMissing {
            section: "scanner".to_string(),
            key: "symbols".to_string(),
        })?;
    parse_symbols(&raw)?;
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    match config.get_string("scanner", "interval") {
        Some(interval) if !INTERVALS.contains(&interval.trim()) => Err(invalid(
            "scanner",
            "interval",
            format!("unsupported interval '{interval}'"),
        )),
        _ => Ok(()),
    }
}

fn validate_candle_limit(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    let limit = config.get_int("scanner", "candle_limit", 100);
    if !(30..=1000).contains(&limit) {
        return Err(invalid(
            "scanner",
            "candle_limit",
            "candle_limit must be between 30 and 1000",
        ));
    }
    Ok(())
}

fn validate_timing(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    if config.get_int("scanner", "scan_interval_seconds", 60) < 1 {
        return Err(invalid(
            "scanner",
            "scan_interval_seconds",
            "scan_interval_seconds must be at least 1",
        ));
    }
    if config.get_int("scanner", "error_cooldown_seconds", 10) < 0 {
        return Err(invalid(
            "scanner",
            "error_cooldown_seconds",
            "error_cooldown_seconds must be non-negative",
        ));
    }
    Ok(())
}

fn validate_leverage(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    let value = config.get_double("scanner", "leverage", 0.1);
    if value <= 0.0 {
        return Err(invalid("scanner", "leverage", "leverage must be positive"));
    }
    Ok(())
}

fn validate_trading_hours(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    match config
        .get_string("scanner", "trading_hours")
        .filter(|s| !s.trim().is_empty())
    {
        Some(raw) => raw
            .parse::<TradingHours>()
            .map(|_| ())
            .map_err(|reason| invalid("scanner", "trading_hours", reason)),
        None => Ok(()),
    }
}

fn validate_entry_profile(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    match config.get_string("scanner", "entry_profile").as_deref() {
        None | Some("tiered") | Some("adx") | Some("crossover") => Ok(()),
        Some(other) => Err(invalid(
            "scanner",
            "entry_profile",
            format!("expected tiered, adx or crossover, got '{other}'"),
        )),
    }
}

fn validate_adx_thresholds(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    let min_adx = config.get_double("adx", "min_adx", 20.0);
    if !(0.0..=100.0).contains(&min_adx) {
        return Err(invalid("adx", "min_adx", "min_adx must be between 0 and 100"));
    }
    for key in ["min_ma_gap", "min_avg_range"] {
        if config.get_double("adx", key, 0.0) < 0.0 {
            return Err(invalid("adx", key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn validate_exit(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    match config.get_string("exit", "profile").as_deref() {
        None | Some("tiered") | Some("profit_bucketed") => {}
        Some(other) => {
            return Err(invalid(
                "exit",
                "profile",
                format!("expected tiered or profit_bucketed, got '{other}'"),
            ));
        }
    }
    if config.get_string("exit", "trailing_activation").is_some() {
        let value = config.get_double("exit", "trailing_activation", -1.0);
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "exit",
                "trailing_activation",
                "trailing_activation must be a fraction between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_market(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    match config.get_string("market", "source").as_deref() {
        None | Some("binance") => {}
        Some("csv") => {
            if config
                .get_string("market", "csv_dir")
                .is_none_or(|d| d.trim().is_empty())
            {
                return Err(TrailguardError::ConfigMissing {
                    section: "market".to_string(),
                    key: "csv_dir".to_string(),
                });
            }
        }
        Some(other) => {
            return Err(invalid(
                "market",
                "source",
                format!("expected binance or csv, got '{other}'"),
            ));
        }
    }
    if config.get_int("market", "timeout_seconds", 10) < 1 {
        return Err(invalid(
            "market",
            "timeout_seconds",
            "timeout_seconds must be at least 1",
        ));
    }
    Ok(())
}

fn validate_orders(config: &dyn ConfigPort) -> Result<(), TrailguardError> {
    if config.get_bool("scanner", "test_mode", true) {
        return Ok(());
    }
    for key in ["url", "api_key"] {
        match config.get_string("orders", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(TrailguardError::ConfigMissing {
                    section: "orders".to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}
