//! Server configuration from environment variables
//!
//! - `SEARCH_DIR`: Doxygen `html/search` directory (default `doc/html/search`)
//! - `PORT`: listen port (default 3000)
//! - `CACHE_CAPACITY`: max cached query responses (default 10,000)
//! - `CACHE_TTL_SECS`: cached response lifetime (default 300)
//!
//! Log filtering is left to `RUST_LOG`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub search_dir: PathBuf,
    pub port: u16,
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            search_dir: PathBuf::from("doc/html/search"),
            port: 3000,
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value, expected }),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let search_dir = lookup("SEARCH_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.search_dir);
        let port = parse_var(&lookup, "PORT", "port number", defaults.port)?;
        let cache_capacity = parse_var(&lookup, "CACHE_CAPACITY", "entry count", defaults.cache_capacity)?;
        let ttl_secs = parse_var(&lookup, "CACHE_TTL_SECS", "number of seconds", defaults.cache_ttl.as_secs())?;

        Ok(Self {
            search_dir,
            port,
            cache_capacity,
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("SEARCH_DIR", "/srv/docs/search"),
            ("PORT", "8080"),
            ("CACHE_TTL_SECS", " 60 "),
        ]))
        .unwrap();
        assert_eq!(config.search_dir, PathBuf::from("/srv/docs/search"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "99999")])).unwrap_err();
        let ConfigError::Invalid { var, value, .. } = err;
        assert_eq!(var, "PORT");
        assert_eq!(value, "99999");
    }
}
