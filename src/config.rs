//! Configuration Module
//!
//! Loads service configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase service-role key used for REST and auth calls
    pub supabase_service_key: String,
    /// Integration credential TTL in seconds
    pub credential_ttl: u64,
    /// Bearer token -> user id TTL in seconds
    pub token_ttl: u64,
    /// Membership -> role TTL in seconds
    pub membership_ttl: u64,
    /// Per-cache entry limit, 0 = unbounded
    pub cache_max_entries: usize,
    /// Background sweep interval in seconds, 0 = lazy expiry only
    pub sweep_interval: u64,
    /// Key required by the admin routes; unset disables them
    pub admin_key: Option<String>,
    /// Timeout in seconds for calls to Supabase
    pub upstream_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SUPABASE_URL` - Supabase project URL (default: http://localhost:54321)
    /// - `SUPABASE_SERVICE_ROLE_KEY` - service-role key (default: empty)
    /// - `CREDENTIAL_TTL_SECS` - credential cache TTL (default: 300)
    /// - `TOKEN_TTL_SECS` - token cache TTL (default: 60)
    /// - `MEMBERSHIP_TTL_SECS` - membership cache TTL (default: 300)
    /// - `CACHE_MAX_ENTRIES` - per-cache entry limit (default: 0, unbounded)
    /// - `SWEEP_INTERVAL_SECS` - expired-entry sweep interval (default: 0, off)
    /// - `ADMIN_KEY` - admin route key (default: unset)
    /// - `UPSTREAM_TIMEOUT_SECS` - Supabase request timeout (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            supabase_url: env::var("SUPABASE_URL").unwrap_or(defaults.supabase_url),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or(defaults.supabase_service_key),
            credential_ttl: parse_var("CREDENTIAL_TTL_SECS", defaults.credential_ttl),
            token_ttl: parse_var("TOKEN_TTL_SECS", defaults.token_ttl),
            membership_ttl: parse_var("MEMBERSHIP_TTL_SECS", defaults.membership_ttl),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            sweep_interval: parse_var("SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            admin_key: env::var("ADMIN_KEY").ok().filter(|key| !key.is_empty()),
            upstream_timeout: parse_var("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: String::new(),
            credential_ttl: 300,
            token_ttl: 60,
            membership_ttl: 300,
            cache_max_entries: 0,
            sweep_interval: 0,
            admin_key: None,
            upstream_timeout: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.credential_ttl, 300);
        assert_eq!(config.token_ttl, 60);
        assert_eq!(config.membership_ttl, 300);
        assert_eq!(config.cache_max_entries, 0);
        assert_eq!(config.sweep_interval, 0);
        assert!(config.admin_key.is_none());
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("WORKSPACE_CACHE_TEST_PORT", "not-a-number");
        assert_eq!(parse_var("WORKSPACE_CACHE_TEST_PORT", 3000u16), 3000);

        env::set_var("WORKSPACE_CACHE_TEST_PORT", "8080");
        assert_eq!(parse_var("WORKSPACE_CACHE_TEST_PORT", 3000u16), 8080);
        env::remove_var("WORKSPACE_CACHE_TEST_PORT");
    }

    #[test]
    fn test_parse_var_missing_uses_default() {
        env::remove_var("WORKSPACE_CACHE_TEST_MISSING");
        assert_eq!(parse_var("WORKSPACE_CACHE_TEST_MISSING", 42u64), 42);
    }
}
