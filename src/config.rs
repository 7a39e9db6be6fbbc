//! Broker configuration, read from the environment at startup.

use std::env;

use crate::broker::constants::{DEFAULT_HOST, DEFAULT_PORT, MAX_FRAME_SIZE, MIN_PORT};
use crate::broker::error::{BrokerError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,
    /// TCP port to bind; ports below 1024 are rejected
    pub port: u16,
    /// Hard upper bound on a single request frame in bytes
    pub max_frame_size: usize,
    /// Log connection accepts and closes at info level instead of debug
    pub log_connections: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame_size: MAX_FRAME_SIZE,
            log_connections: false,
        }
    }
}

impl Config {
    /// Build a configuration from `BROKER_*` environment variables, falling
    /// back to defaults for unset ones. Set but unparsable values are
    /// configuration errors, not silently defaulted.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(host) = env::var("BROKER_HOST") {
            if host.trim().is_empty() {
                return Err(BrokerError::InvalidConfig("BROKER_HOST must not be empty".into()));
            }
            config.host = host;
        }

        if let Ok(port) = env::var("BROKER_PORT") {
            let port: u16 = port.parse().map_err(|_| {
                BrokerError::InvalidConfig(format!("BROKER_PORT is not a valid port: {port:?}"))
            })?;
            if port < MIN_PORT {
                return Err(BrokerError::InvalidConfig(format!(
                    "BROKER_PORT must be at least {MIN_PORT}, got {port}"
                )));
            }
            config.port = port;
        }

        if let Ok(size) = env::var("BROKER_MAX_FRAME_SIZE") {
            let size: usize = size.parse().map_err(|_| {
                BrokerError::InvalidConfig(format!(
                    "BROKER_MAX_FRAME_SIZE is not a valid size: {size:?}"
                ))
            })?;
            if size == 0 {
                return Err(BrokerError::InvalidConfig(
                    "BROKER_MAX_FRAME_SIZE must be positive".into(),
                ));
            }
            config.max_frame_size = size;
        }

        if let Ok(flag) = env::var("BROKER_LOG_CONNECTIONS") {
            match flag.as_str() {
                "1" | "true" | "yes" => config.log_connections = true,
                "0" | "false" | "no" => config.log_connections = false,
                other => {
                    return Err(BrokerError::InvalidConfig(format!(
                        "BROKER_LOG_CONNECTIONS is not a boolean: {other:?}"
                    )));
                }
            }
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9092);
        assert_eq!(config.max_frame_size, MAX_FRAME_SIZE);
        assert!(!config.log_connections);
    }

    #[test]
    fn test_listen_addr() {
        let config = Config { host: "127.0.0.1".into(), port: 9095, ..Config::default() };
        assert_eq!(config.listen_addr(), "127.0.0.1:9095");
    }
}
