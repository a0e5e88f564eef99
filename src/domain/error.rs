//! Domain error types.

/// Top-level error type for trailguard.
#[derive(Debug, thiserror::Error)]
pub enum TrailguardError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid symbol list: {reason}")]
    InvalidSymbols { reason: String },

    #[error("market data error for {symbol}: {reason}")]
    MarketData { symbol: String, reason: String },

    #[error("order submission failed for {symbol}: {reason}")]
    Order { symbol: String, reason: String },

    #[error("notification failed: {reason}")]
    Notify { reason: String },

    #[error("position already open for {symbol}")]
    PositionExists { symbol: String },

    #[error("no open position for {symbol}")]
    PositionMissing { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrailguardError {
    /// Invariant violations on the position book. Everything else is
    /// either a startup error or a per-symbol transient failure.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrailguardError::PositionExists { .. } | TrailguardError::PositionMissing { .. }
        )
    }
}

impl From<&TrailguardError> for std::process::ExitCode {
    fn from(err: &TrailguardError) -> Self {
        let code: u8 = match err {
            TrailguardError::Io(_) => 1,
            TrailguardError::ConfigParse { .. }
            | TrailguardError::ConfigMissing { .. }
            | TrailguardError::ConfigInvalid { .. }
            | TrailguardError::InvalidSymbols { .. } => 2,
            TrailguardError::Database { .. } | TrailguardError::DatabaseQuery { .. } => 3,
            TrailguardError::MarketData { .. } => 5,
            TrailguardError::PositionExists { .. } | TrailguardError::PositionMissing { .. } => 6,
            TrailguardError::Order { .. } | TrailguardError::Notify { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_errors_are_fatal() {
        let exists = TrailguardError::PositionExists {
            symbol: "BTCUSDT".into(),
        };
        let missing = TrailguardError::PositionMissing {
            symbol: "BTCUSDT".into(),
        };
        assert!(exists.is_fatal());
        assert!(missing.is_fatal());
    }

    #[test]
    fn io_failures_are_transient() {
        let fetch = TrailguardError::MarketData {
            symbol: "ETHUSDT".into(),
            reason: "timeout".into(),
        };
        let order = TrailguardError::Order {
            symbol: "ETHUSDT".into(),
            reason: "HTTP 502".into(),
        };
        assert!(!fetch.is_fatal());
        assert!(!order.is_fatal());
        assert!(!TrailguardError::Database { reason: "locked".into() }.is_fatal());
    }

    #[test]
    fn display_includes_context() {
        let err = TrailguardError::ConfigInvalid {
            section: "scanner".into(),
            key: "leverage".into(),
            reason: "leverage must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [scanner] leverage: leverage must be positive"
        );
    }
}
