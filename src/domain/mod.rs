//! Core domain types and logic.

pub mod candle;
pub mod interval;
pub mod query;
pub mod intraday;
pub mod indicator;
pub mod refresh;
pub mod settings;
pub mod error;
