//! Port traits for the engine's external collaborators.

pub mod config_port;
pub mod market_data_port;
pub mod notify_port;
pub mod order_port;
pub mod position_store_port;
