//! CLI integration tests for config wiring.
//!
//! Tests cover:
//! - Scan config building from real INI files on disk
//! - Entry and exit profile selection
//! - Validation failures surfacing as config errors
//! - Store wiring and the positions maintenance commands

mod common;

use common::*;
use std::io::Write;
use std::time::Duration;
use trailguard::adapters::file_config_adapter::FileConfigAdapter;
use trailguard::cli;
use trailguard::domain::config_validation::validate_scanner_config;
use trailguard::domain::error::TrailguardError;
use trailguard::domain::exit_policy::ExitProfile;
use trailguard::domain::signal::EntryProfile;
use trailguard::ports::market_data_port::MarketDataPort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[scanner]
symbols = btcusdt, ETHUSDT, solusdt
interval = 15m
candle_limit = 120
scan_interval_seconds = 30
error_cooldown_seconds = 5
test_mode = true
leverage = 0.2
trading_hours = 22:00-06:00
entry_profile = adx
notify_excursion = yes

[adx]
min_adx = 25

[exit]
profile = profit_bucketed
trailing_activation = 0.02

[market]
source = binance
timeout_seconds = 5
"#;

mod config_loading {
    use super::*;

    #[test]
    fn builds_scan_config_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        validate_scanner_config(&adapter).unwrap();
        let config = cli::build_scan_config(&adapter).unwrap();

        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
        assert_eq!(config.interval, "15m");
        assert_eq!(config.candle_limit, 120);
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.error_cooldown, Duration::from_secs(5));
        assert_eq!(config.leverage, 0.2);
        assert_eq!(
            config.trading_hours.map(|h| h.to_string()),
            Some("22:00-06:00".to_string())
        );
        assert!(config.notify_excursion);
    }

    #[test]
    fn adx_profile_takes_overrides_and_defaults() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let profile = cli::build_entry_profile(&adapter).unwrap();
        assert_eq!(
            profile,
            EntryProfile::AdxGated {
                min_adx: 25.0,
                min_ma_gap: 0.00072,
                min_avg_range: 0.001,
            }
        );
    }

    #[test]
    fn exit_policy_from_file() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let policy = cli::build_exit_policy(&adapter).unwrap();
        assert_eq!(policy.profile, ExitProfile::ProfitBucketed);
        assert_eq!(policy.trailing_activation, Some(0.02));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[scanner]\nsymbols = BTCUSDT\n").unwrap();
        let config = cli::build_scan_config(&adapter).unwrap();

        assert_eq!(config.interval, "1h");
        assert_eq!(config.candle_limit, 100);
        assert_eq!(config.scan_interval, Duration::from_secs(60));
        assert_eq!(config.entry_profile, EntryProfile::Tiered);
        assert_eq!(config.exit_policy.profile, ExitProfile::Tiered);
        assert_eq!(config.exit_policy.trailing_activation, None);
        assert!(config.trading_hours.is_none());
        assert!(!config.notify_excursion);
    }

    #[test]
    fn missing_symbols_is_config_error() {
        let adapter = FileConfigAdapter::from_string("[scanner]\ninterval = 1h\n").unwrap();
        let err = cli::build_scan_config(&adapter).unwrap_err();
        assert!(matches!(err, TrailguardError::ConfigMissing { .. }));
    }

    #[test]
    fn bad_trading_hours_is_config_error() {
        let adapter = FileConfigAdapter::from_string(
            "[scanner]\nsymbols = BTCUSDT\ntrading_hours = all day\n",
        )
        .unwrap();
        let err = cli::build_scan_config(&adapter).unwrap_err();
        assert!(matches!(err, TrailguardError::ConfigInvalid { ref key, .. } if key == "trading_hours"));
    }

    #[test]
    fn live_mode_without_endpoint_fails_validation() {
        let adapter = FileConfigAdapter::from_string(
            "[scanner]\nsymbols = BTCUSDT\ntest_mode = false\n",
        )
        .unwrap();
        assert!(validate_scanner_config(&adapter).is_err());
        assert!(cli::build_orders(&adapter).is_err());
    }

    #[test]
    fn test_mode_orders_need_no_endpoint() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert!(cli::build_orders(&adapter).is_ok());
    }

    #[test]
    fn csv_market_source() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("BTCUSDT.csv"),
            "open_time,open,high,low,close,volume\n\
             2024-01-15T00:00:00Z,1.0,1.1,0.9,1.05,10\n",
        )
        .unwrap();
        let ini = format!(
            "[scanner]\nsymbols = BTCUSDT\n[market]\nsource = csv\ncsv_dir = {}\n",
            dir.path().display()
        );
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();

        let market = cli::build_market(&adapter).unwrap();
        let candles = market.fetch_candles("BTCUSDT", "1h", 100).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 1.05);
    }
}

#[cfg(feature = "sqlite")]
mod store_commands {
    use super::*;
    use trailguard::cli::{Cli, Command};
    use trailguard::ports::position_store_port::PositionStorePort;

    fn sqlite_ini(dir: &tempfile::TempDir) -> tempfile::NamedTempFile {
        write_temp_ini(&format!(
            "[scanner]\nsymbols = BTCUSDT\n[sqlite]\npath = {}\n",
            dir.path().join("positions.db").display()
        ))
    }

    #[test]
    fn clear_positions_empties_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = sqlite_ini(&dir);
        let adapter = FileConfigAdapter::from_file(ini.path()).unwrap();

        {
            let store = cli::open_store(&adapter).unwrap();
            store
                .upsert(&open_position("BTCUSDT", Direction::Long, Strength::Normal, 100.0, 100.0))
                .unwrap();
            store
                .upsert(&open_position("ETHUSDT", Direction::Short, Strength::Strong, 50.0, 49.0))
                .unwrap();
            assert_eq!(store.list().unwrap().len(), 2);
        }

        let _ = cli::run(Cli {
            command: Command::ClearPositions {
                config: ini.path().to_path_buf(),
            },
        });

        let store = cli::open_store(&adapter).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn scan_command_with_csv_data_opens_position() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut csv = String::from("open_time,open,high,low,close,volume\n");
        for (i, candle) in uptrend(40, 250.0).iter().enumerate() {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                1_704_067_200_000i64 + i as i64 * 3_600_000,
                candle.open,
                candle.high,
                candle.low,
                candle.close,
                candle.volume
            ));
        }
        std::fs::write(dir.path().join("BTCUSDT.csv"), csv).unwrap();

        let ini = write_temp_ini(&format!(
            "[scanner]\nsymbols = BTCUSDT\ntest_mode = true\n\
             [market]\nsource = csv\ncsv_dir = {dir}\n\
             [sqlite]\npath = {dir}/positions.db\n",
            dir = dir.path().display()
        ));

        let _ = cli::run(Cli {
            command: Command::Scan {
                config: ini.path().to_path_buf(),
            },
        });

        let adapter = FileConfigAdapter::from_file(ini.path()).unwrap();
        let store = cli::open_store(&adapter).unwrap();
        let positions = store.list().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].symbol, "BTCUSDT");
        assert_eq!(positions[0].direction, Direction::Long);
    }
}
