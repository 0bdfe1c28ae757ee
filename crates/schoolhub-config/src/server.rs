use std::env;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Port of the separate Prometheus listener.
    pub metrics_port: u16,
    /// Apply pending SQL migrations before serving.
    pub run_migrations: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            metrics_port: env_or("METRICS_PORT", 9000),
            run_migrations: env_or("RUN_MIGRATIONS", false),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            metrics_port: 9000,
            run_migrations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            metrics_port: 9100,
            run_migrations: true,
        };
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.metrics_address(), "127.0.0.1:9100");
    }

    #[test]
    fn test_env_or_falls_back_on_missing_key() {
        assert_eq!(env_or("SCHOOLHUB_TEST_SURELY_UNSET", 42u16), 42);
    }
}
