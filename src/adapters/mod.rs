//! Concrete adapter implementations for ports.

pub mod alpha_vantage;
pub mod chart_svg;
pub mod csv_export;
pub mod file_config_adapter;
pub mod file_credential_store;
pub mod refresh_service;
#[cfg(feature = "web")]
pub mod web;
