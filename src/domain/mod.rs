//! Core domain types and logic.

pub mod frame;
pub mod ohlcv;
pub mod window;
pub mod indicator;
pub mod reinvest;
pub mod config_validation;
pub mod error;
