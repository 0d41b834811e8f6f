//! Controller configuration
//!
//! Loaded from a TOML file and overridden by `WR3223_`-prefixed environment
//! variables (`WR3223_HOST`, `WR3223_CONTROLLER_ADDR`, ...).
//!
//! ```toml
//! refresh_interval = 15
//! host = "192.168.1.40"
//! port = 8899
//! controller_addr = 1
//! ```

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_CONTROLLER_ADDRESS, DEFAULT_REFRESH_INTERVAL_SECS,
    MAX_CONTROLLER_ADDRESS,
};
use crate::error::{Wr3223Error, Wr3223Result};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "WR3223_";

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Wr3223Config {
    /// Polling interval in seconds
    pub refresh_interval: u64,
    /// TCP host. Takes precedence over `serial_port`.
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Serial device, e.g. `/dev/ttyUSB0`
    pub serial_port: Option<String>,
    pub baud_rate: u32,
    /// Controller bus address (1-99)
    pub controller_addr: u8,
    /// Default tracing directive, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for Wr3223Config {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            host: None,
            port: None,
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            controller_addr: DEFAULT_CONTROLLER_ADDRESS,
            log_level: "info".to_string(),
        }
    }
}

/// Where the controller is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Tcp { host: String, port: u16 },
    Serial { port: String, baud_rate: u32 },
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            Self::Serial { port, baud_rate } => write!(f, "{}@{}", port, baud_rate),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Wr3223Config {
    /// Load from a TOML file merged with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Wr3223Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        figment.extract().map_err(|e| {
            Wr3223Error::configuration(format!(
                "Failed to load configuration from {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse a TOML document without environment overrides.
    pub fn from_toml_str(toml: &str) -> Wr3223Result<Self> {
        Figment::from(Toml::string(toml))
            .extract()
            .map_err(|e| Wr3223Error::configuration(format!("Invalid configuration: {}", e)))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    /// Check the values that do not depend on the link type.
    pub fn validate(&self) -> Wr3223Result<()> {
        if self.controller_addr == 0 || self.controller_addr > MAX_CONTROLLER_ADDRESS {
            return Err(Wr3223Error::configuration(format!(
                "controller_addr must be between 1 and {}, got {}",
                MAX_CONTROLLER_ADDRESS, self.controller_addr
            )));
        }
        if self.refresh_interval == 0 {
            return Err(Wr3223Error::configuration(
                "refresh_interval must be at least 1 second",
            ));
        }
        Ok(())
    }

    /// Resolve the link to open. TCP wins whenever a host is set.
    pub fn connection_target(&self) -> Wr3223Result<ConnectionTarget> {
        self.validate()?;

        if let Some(host) = non_empty(&self.host) {
            let port = self.port.ok_or_else(|| {
                Wr3223Error::configuration(format!("host {} configured without port", host))
            })?;
            return Ok(ConnectionTarget::Tcp {
                host: host.to_string(),
                port,
            });
        }

        if let Some(port) = non_empty(&self.serial_port) {
            return Ok(ConnectionTarget::Serial {
                port: port.to_string(),
                baud_rate: self.baud_rate,
            });
        }

        Err(Wr3223Error::configuration(
            "Neither host nor serial port configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Wr3223Config::from_toml_str("").unwrap();
        assert_eq!(config, Wr3223Config::default());
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.controller_addr, 1);
    }

    #[test]
    fn test_tcp_target_wins() {
        let config = Wr3223Config::from_toml_str(
            r#"
            host = "10.0.0.5"
            port = 8899
            serial_port = "/dev/ttyUSB0"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.connection_target().unwrap(),
            ConnectionTarget::Tcp {
                host: "10.0.0.5".to_string(),
                port: 8899
            }
        );
    }

    #[test]
    fn test_serial_target() {
        let config = Wr3223Config::from_toml_str(
            r#"
            serial_port = "/dev/ttyUSB0"
            baud_rate = 19200
            controller_addr = 12
            "#,
        )
        .unwrap();
        let target = config.connection_target().unwrap();
        assert_eq!(target.to_string(), "/dev/ttyUSB0@19200");
    }

    #[test]
    fn test_missing_link_is_configuration_error() {
        let err = Wr3223Config::default().connection_target().unwrap_err();
        assert!(matches!(err, Wr3223Error::Configuration { .. }));

        let config = Wr3223Config {
            host: Some("  ".to_string()),
            ..Wr3223Config::default()
        };
        assert!(config.connection_target().is_err());
    }

    #[test]
    fn test_host_without_port() {
        let config = Wr3223Config {
            host: Some("wr3223.local".to_string()),
            ..Wr3223Config::default()
        };
        assert!(config.connection_target().is_err());
    }

    #[test]
    fn test_address_range() {
        let mut config = Wr3223Config {
            serial_port: Some("/dev/ttyS0".to_string()),
            ..Wr3223Config::default()
        };
        config.controller_addr = 0;
        assert!(config.validate().is_err());
        config.controller_addr = 100;
        assert!(config.validate().is_err());
        config.controller_addr = 99;
        assert!(config.connection_target().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Wr3223Config::from_toml_str("controller_addr = \"one\"").unwrap_err();
        assert!(matches!(err, Wr3223Error::Configuration { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("wr3223-config-{}.toml", std::process::id()));
        std::fs::write(&path, "host = \"127.0.0.1\"\nport = 5000\nrefresh_interval = 30\n")
            .unwrap();

        let config = Wr3223Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.refresh_interval, 30);
        assert_eq!(config.port, Some(5000));
    }
}
