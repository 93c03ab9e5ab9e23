/// Database configuration and connection management
pub mod database;

/// Billing policy constants loaded from config.toml
pub mod policy;
