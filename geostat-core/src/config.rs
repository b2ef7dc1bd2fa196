use crate::error::{GeostatError, Result};
use std::time::Duration;

/// Environment variable holding the statistics API base location.
pub const API_BASE_ENV: &str = "GEOSTAT_API_BASE";

/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "GEOSTAT_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api/datasets";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for [`crate::client::StatsClient`].
#[derive(Debug, PartialEq, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Serve repeated requests for the same key from memory.
    pub cache_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `GEOSTAT_API_BASE` / `GEOSTAT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();
        if let Some(base) = lookup(API_BASE_ENV) {
            config = config.with_base_url(&base)?;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV) {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                GeostatError::Config(format!("{} must be whole seconds, got {:?}", TIMEOUT_ENV, secs))
            })?;
            config = config.with_timeout_secs(secs)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(GeostatError::Config(format!(
                "API base must be an http(s) URL, got {:?}",
                base_url
            )));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Result<Self> {
        if secs == 0 {
            return Err(GeostatError::Config("timeout must be positive".to_string()));
        }
        self.timeout = Duration::from_secs(secs);
        Ok(self)
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_BASE_ENV, "https://stats.example.org/api/"),
            (TIMEOUT_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://stats.example.org/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[(API_BASE_ENV, "ftp://x")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "0")])).is_err());
    }
}
