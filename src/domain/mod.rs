//! Core domain types and logic.

pub mod candle;
pub mod indicator;
pub mod signal;
pub mod exit_policy;
pub mod position;
pub mod lifecycle;
pub mod scanner;
pub mod universe;
pub mod trading_hours;
pub mod config_validation;
pub mod error;
