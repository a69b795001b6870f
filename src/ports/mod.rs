//! Port traits (hexagonal boundaries).

pub mod config_port;
pub mod credential_port;
pub mod quote_port;
