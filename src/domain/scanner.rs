//! Scan orchestrator.
//!
//! One cycle walks the configured symbols in order: fetch candles, then
//! either look for an entry (FLAT) or manage the open position (OPEN), and
//! issue the order and notification side effects. Cycles run back to back
//! with a fixed sleep in between; nothing runs concurrently.
//!
//! Per-symbol I/O failures are logged and the symbol is skipped for that
//! cycle. Invariant violations on the position book abort the loop.

use crate::domain::candle::Candle;
use crate::domain::error::TrailguardError;
use crate::domain::exit_policy::ExitPolicy;
use crate::domain::indicator::compute_snapshot;
use crate::domain::lifecycle::{self, Transition};
use crate::domain::position::{CloseReason, Position};
use crate::domain::signal::{self, EntryProfile, MIN_SIGNAL_BARS};
use crate::domain::trading_hours::TradingHours;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::order_port::{OrderPort, OrderSide};
use crate::ports::position_store_port::PositionStorePort;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub symbols: Vec<String>,
    pub interval: String,
    pub candle_limit: usize,
    pub scan_interval: Duration,
    pub error_cooldown: Duration,
    pub leverage: f64,
    pub trading_hours: Option<TradingHours>,
    pub entry_profile: EntryProfile,
    pub exit_policy: ExitPolicy,
    /// Also notify when a position's excursion is extended.
    pub notify_excursion: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            interval: "1h".to_string(),
            candle_limit: 100,
            scan_interval: Duration::from_secs(60),
            error_cooldown: Duration::from_secs(10),
            leverage: 0.1,
            trading_hours: None,
            entry_profile: EntryProfile::Tiered,
            exit_policy: ExitPolicy::default(),
            notify_excursion: false,
        }
    }
}

/// What happened to one symbol in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    NoData,
    InsufficientData { bars: usize },
    OutsideTradingHours,
    NoSignal,
    Opened(Position),
    Held { excursion_updated: bool },
    Closed(CloseReason),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub outcomes: Vec<(String, SymbolOutcome)>,
}

impl CycleReport {
    pub fn opened(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Opened(_)))
    }

    pub fn closed(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Closed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Failed(_)))
    }

    /// True when the cycle had symbols and none of them got through.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.failed() == self.outcomes.len()
    }

    pub fn outcome(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, o)| o)
    }

    fn count(&self, pred: impl Fn(&SymbolOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct Scanner<'a> {
    config: ScanConfig,
    market: &'a dyn MarketDataPort,
    orders: &'a dyn OrderPort,
    notifier: &'a dyn NotifyPort,
    store: &'a dyn PositionStorePort,
}

impl<'a> Scanner<'a> {
    pub fn new(
        config: ScanConfig,
        market: &'a dyn MarketDataPort,
        orders: &'a dyn OrderPort,
        notifier: &'a dyn NotifyPort,
        store: &'a dyn PositionStorePort,
    ) -> Self {
        Self {
            config,
            market,
            orders,
            notifier,
            store,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Runs cycles until `max_cycles` is reached (forever when `None`) or
    /// a fatal error occurs.
    pub fn run(&self, max_cycles: Option<usize>) -> Result<(), TrailguardError> {
        info!(
            symbols = self.config.symbols.len(),
            interval = %self.config.interval,
            entry_profile = self.config.entry_profile.name(),
            exit_profile = self.config.exit_policy.profile.name(),
            "scanner started"
        );
        self.notify(&format!(
            "Scanner started: {} symbol(s) on {}",
            self.config.symbols.len(),
            self.config.interval
        ));

        let mut completed = 0usize;
        loop {
            let pause = match self.scan_cycle(Utc::now()) {
                Ok(report) => {
                    info!(
                        opened = report.opened(),
                        closed = report.closed(),
                        failed = report.failed(),
                        "cycle complete"
                    );
                    if report.all_failed() {
                        warn!("every symbol failed this cycle, cooling down");
                        self.config.error_cooldown
                    } else {
                        self.config.scan_interval
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "position book invariant violated, stopping");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "scan cycle failed, cooling down");
                    self.config.error_cooldown
                }
            };

            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                return Ok(());
            }
            std::thread::sleep(pause);
        }
    }

    /// One pass over every configured symbol.
    pub fn scan_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, TrailguardError> {
        let mut report = CycleReport::default();

        for symbol in &self.config.symbols {
            let outcome = match self.scan_symbol(symbol, now) {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "skipping symbol this cycle");
                    SymbolOutcome::Failed(e.to_string())
                }
            };
            report.outcomes.push((symbol.clone(), outcome));
        }

        Ok(report)
    }

    pub fn scan_symbol(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<SymbolOutcome, TrailguardError> {
        let candles =
            self.market
                .fetch_candles(symbol, &self.config.interval, self.config.candle_limit)?;

        let Some(price) = candles.last().map(|c| c.close) else {
            info!(symbol, "no candles returned");
            return Ok(SymbolOutcome::NoData);
        };

        match self.store.get(symbol)? {
            None => self.look_for_entry(symbol, &candles, price, now),
            Some(position) => self.manage(position, price, now),
        }
    }

    fn look_for_entry(
        &self,
        symbol: &str,
        candles: &[Candle],
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<SymbolOutcome, TrailguardError> {
        if candles.len() < MIN_SIGNAL_BARS {
            info!(symbol, bars = candles.len(), "not enough candles for a signal");
            return Ok(SymbolOutcome::InsufficientData {
                bars: candles.len(),
            });
        }
        let Some(snapshot) = compute_snapshot(candles) else {
            return Ok(SymbolOutcome::InsufficientData {
                bars: candles.len(),
            });
        };
        info!(symbol, "{}", snapshot);

        if let Some(hours) = self.config.trading_hours {
            if !hours.contains(now) {
                info!(symbol, window = %hours, "outside trading hours, no entry");
                return Ok(SymbolOutcome::OutsideTradingHours);
            }
        }

        let Some(signal) = signal::classify(candles, &snapshot, &self.config.entry_profile) else {
            return Ok(SymbolOutcome::NoSignal);
        };

        let Transition::Opened(position) =
            lifecycle::open_position(self.store, symbol, signal, price, now)?
        else {
            unreachable!("open_position only yields Opened");
        };

        self.notify(&format!(
            "[{symbol}] Entry {} ({}) at {price:.5}",
            signal.direction, signal.strength
        ));
        self.submit(symbol, OrderSide::from(signal.direction));

        Ok(SymbolOutcome::Opened(position))
    }

    fn manage(
        &self,
        position: Position,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<SymbolOutcome, TrailguardError> {
        let symbol = position.symbol.clone();
        let transition = lifecycle::manage_position(
            self.store,
            position,
            price,
            now,
            &self.config.exit_policy,
        )?;

        match transition {
            Transition::Held {
                position,
                check,
                excursion_updated,
            } => {
                info!(
                    symbol = %symbol,
                    direction = %position.direction,
                    price,
                    max_favorable = position.max_favorable_price,
                    "profit {:.2}%, drawdown {:.2}% (trailing {:.2}%, MDD {:.2}%)",
                    check.profit * 100.0,
                    check.drawdown * 100.0,
                    check.trailing_distance * 100.0,
                    check.mdd_threshold * 100.0
                );
                if excursion_updated && self.config.notify_excursion {
                    self.notify(&format!(
                        "[{symbol}] {} new best price {price:.5}",
                        position.direction
                    ));
                }
                Ok(SymbolOutcome::Held { excursion_updated })
            }
            Transition::Closed { check, reason, .. } => {
                let label = match reason {
                    CloseReason::MaxDrawdownCut => "MDD cut triggered",
                    CloseReason::TrailingStop => "Trailing stop triggered",
                };
                self.notify(&format!(
                    "[{symbol}] {label} at {price:.5} - profit {:.2}%",
                    check.profit * 100.0
                ));
                self.submit(&symbol, OrderSide::Flat);
                self.log_book();
                Ok(SymbolOutcome::Closed(reason))
            }
            Transition::Opened(_) => unreachable!("manage_position never opens"),
        }
    }

    /// Order failures leave the book as it is; the divergence is reported,
    /// not reconciled.
    fn submit(&self, symbol: &str, side: OrderSide) {
        if let Err(e) = self.orders.submit(symbol, side, self.config.leverage) {
            error!(symbol, %side, error = %e, "order failed, book and exchange may diverge");
            self.notify(&format!(
                "[{symbol}] {side} order failed: {e}. Position book may not match the exchange."
            ));
        }
    }

    fn notify(&self, message: &str) {
        if let Err(e) = self.notifier.notify(message) {
            warn!(error = %e, "notification not delivered");
        }
    }

    fn log_book(&self) {
        match self.store.list() {
            Ok(positions) if positions.is_empty() => info!("position book is empty"),
            Ok(positions) => {
                for p in positions {
                    info!(
                        symbol = %p.symbol,
                        direction = %p.direction,
                        strength = %p.strength,
                        entry = p.entry_price,
                        max_favorable = p.max_favorable_price,
                        "open position"
                    );
                }
            }
            Err(e) => warn!(error = %e, "could not list positions"),
        }
    }
}
