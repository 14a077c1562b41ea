//! API service settings
//!
//! Loaded with the `config` crate from `FOODGRAM_*` environment variables on
//! top of built-in defaults. Database, Redis and JWT settings keep their own
//! `from_env` constructors, shared with the auth service.

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::net::SocketAddr;

/// HTTP server and media settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host (`FOODGRAM_HOST`, default `0.0.0.0`)
    pub host: String,
    /// Bind port (`FOODGRAM_PORT`, default `8000`)
    pub port: u16,
    /// Directory uploaded images are written to (`FOODGRAM_MEDIA_ROOT`)
    pub media_root: String,
    /// URL prefix media is served under (`FOODGRAM_MEDIA_URL`)
    pub media_url: String,
    /// Catalog file used by `load_ingredients` (`FOODGRAM_INGREDIENTS_CSV`)
    pub ingredients_csv: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("media_root", "media")?
            .set_default("media_url", "/media/")?
            .set_default("ingredients_csv", "data/ingredients.csv")?
            .add_source(Environment::with_prefix("FOODGRAM").try_parsing(true))
            .build()
            .context("Failed to load server configuration")?
            .try_deserialize()
            .context("Invalid server configuration")
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 5] = [
        "FOODGRAM_HOST",
        "FOODGRAM_PORT",
        "FOODGRAM_MEDIA_ROOT",
        "FOODGRAM_MEDIA_URL",
        "FOODGRAM_INGREDIENTS_CSV",
    ];

    fn clear() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.media_root, "media");
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.ingredients_csv, "data/ingredients.csv");
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:8000");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear();
        unsafe {
            env::set_var("FOODGRAM_PORT", "9100");
            env::set_var("FOODGRAM_MEDIA_URL", "/uploads/");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.media_url, "/uploads/");

        clear();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_rejected() {
        clear();
        unsafe {
            env::set_var("FOODGRAM_PORT", "not-a-port");
        }

        assert!(ServerConfig::from_env().is_err());

        clear();
    }
}
