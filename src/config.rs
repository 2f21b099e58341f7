use std::env;
use std::time::Duration;

/// How long cached list reads stay fresh unless overridden.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        // Best effort: a missing .env file is not an error.
        let _ = dotenvy::dotenv();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://library.db?mode=rwc".to_string());

        let cache_ttl = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        Self {
            database_url,
            cache_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cache_ttl_override_from_env() {
        unsafe { env::set_var("CACHE_TTL_SECS", "9") };
        let config = Config::from_env();
        assert_eq!(config.cache_ttl, Duration::from_secs(9));
        unsafe { env::remove_var("CACHE_TTL_SECS") };
    }

    #[test]
    #[serial]
    fn unparseable_ttl_falls_back_to_default() {
        unsafe { env::set_var("CACHE_TTL_SECS", "soon") };
        let config = Config::from_env();
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL);
        unsafe { env::remove_var("CACHE_TTL_SECS") };
    }
}
