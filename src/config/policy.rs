//! Billing policy loading from config.toml
//!
//! All the tunable policy constants of the billing pipeline live here rather
//! than being hard-coded at their call sites: the revenue share split, the
//! tick period, the presence TTL, and the payout threshold. Defaults match
//! the reference policy; a `config.toml` at the working directory overrides
//! them.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tunable constants of the billing pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingPolicy {
    /// Percent of every gross charge credited to the reader
    pub reader_share_pct: u32,
    /// Billing ticker period in seconds
    pub tick_interval_secs: u64,
    /// Presence signal time-to-live in seconds
    pub presence_ttl_secs: u64,
    /// Minimum payout balance in cents eligible for a transfer
    pub payout_min_cents: i64,
    /// Minimum wallet deposit in cents accepted from the gateway
    pub deposit_min_cents: i64,
    /// How many minutes before its start time an appointment may start
    pub start_grace_mins: i64,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            reader_share_pct: 70,
            tick_interval_secs: 60,
            presence_ttl_secs: 15,
            payout_min_cents: 1500,
            deposit_min_cents: 100,
            start_grace_mins: 5,
        }
    }
}

impl BillingPolicy {
    /// Billing ticker period as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Presence TTL as a [`Duration`].
    #[must_use]
    pub const fn presence_ttl(&self) -> Duration {
        Duration::from_secs(self.presence_ttl_secs)
    }
}

/// Configuration structure representing the config.toml file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    billing: BillingPolicy,
}

/// Loads the billing policy from a TOML file.
///
/// A missing file is not an error; the defaults apply. A present but
/// unparsable file is a configuration error.
pub fn load_policy<P: AsRef<Path>>(path: P) -> Result<BillingPolicy> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(BillingPolicy::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })?;
    Ok(config.billing)
}

/// Loads the billing policy from the default location (./config.toml)
pub fn load_default_policy() -> Result<BillingPolicy> {
    load_policy("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = BillingPolicy::default();
        assert_eq!(policy.reader_share_pct, 70);
        assert_eq!(policy.tick_interval(), Duration::from_secs(60));
        assert_eq!(policy.presence_ttl(), Duration::from_secs(15));
        assert_eq!(policy.payout_min_cents, 1500);
    }

    #[test]
    fn test_parse_policy_overrides() {
        let toml_str = r#"
            [billing]
            reader_share_pct = 80
            payout_min_cents = 2000
        "#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.billing.reader_share_pct, 80);
        assert_eq!(config.billing.payout_min_cents, 2000);
        // Unset keys keep their defaults
        assert_eq!(config.billing.tick_interval_secs, 60);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let policy = load_policy("does-not-exist.toml").unwrap();
        assert_eq!(policy.reader_share_pct, 70);
    }
}
