// Configuration module
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker thread count; zero lets actix pick one per core
    #[serde(default)]
    pub workers: usize,
}

/// Backend engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// MySQL-protocol URL of the SQL engine
    #[serde(default = "default_engine_url")]
    pub url: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; empty disables the file layer
    #[serde(default)]
    pub file_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), workers: 0 }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { url: default_engine_url() }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: String::new(),
            log_to_console: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_engine_url() -> String {
    "mysql://root@localhost:3306/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TREEGATE_SERVER_HOST: Override server.host
    /// - TREEGATE_SERVER_PORT: Override server.port
    /// - TREEGATE_ENGINE_URL: Override engine.url
    /// - TREEGATE_LOG_LEVEL: Override logging.level
    ///
    /// Environment variables take precedence over config.toml values
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(host) = env::var("TREEGATE_SERVER_HOST") {
            self.server.host = host;
        }

        if let Ok(port_str) = env::var("TREEGATE_SERVER_PORT") {
            self.server.port = port_str.parse().map_err(|_| {
                anyhow::anyhow!("Invalid TREEGATE_SERVER_PORT value: {}", port_str)
            })?;
        }

        if let Ok(url) = env::var("TREEGATE_ENGINE_URL") {
            self.engine.url = url;
        }

        if let Ok(level) = env::var("TREEGATE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        if self.engine.url.trim().is_empty() {
            return Err(anyhow::anyhow!("engine.url cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert!(config.logging.log_to_console);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = ServerConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = ServerConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ServerConfig =
            toml::from_str("[server]\nport = 9090\n").unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_override_engine_url() {
        env::set_var("TREEGATE_ENGINE_URL", "mysql://gw@db:3306/");
        let mut config = ServerConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.engine.url, "mysql://gw@db:3306/");
        env::remove_var("TREEGATE_ENGINE_URL");
    }
}
