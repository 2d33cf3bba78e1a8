//! Cache configuration.
//!
//! Controls the list response cache via the `[cache]` section of `catalog.toml`.

use std::time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 300;
const DEFAULT_MAX_ENTRIES: usize = 1024;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every lookup misses and nothing is stored.
    pub enabled: bool,
    /// Lifetime of a populated list entry.
    pub ttl: Duration,
    /// Upper bound on live entries held by the in-memory backend.
    pub max_entries: usize,
    /// Period of the background sweep that purges expired entries.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl_seconds.get()),
            max_entries: settings.max_entries.get(),
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs.get()),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_entries, 1024);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn disabled_keeps_other_defaults() {
        let config = CacheConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(300));
    }
}
