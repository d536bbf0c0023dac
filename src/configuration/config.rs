use super::types::*;
use crate::error_handling::types::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Maximum length of a Unix socket path (`sun_path` minus the NUL byte).
const MAX_SOCKET_PATH_LEN: usize = 107;

/// Application configuration structure that defines all runtime parameters.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// working configuration capturing on `eth0` and listening on
/// `/tmp/packet_capture_socket`.
///
/// # Examples
///
/// ```
/// use tcpwatch::configuration::Config;
///
/// let config = Config::from_toml_str("[capture]\ninterface = \"lo\"\n").unwrap();
/// assert_eq!(config.capture.interface, "lo");
/// assert!(config.output.console);
/// ```
///
/// # Fields Overview
///
/// - `capture`: device, snapshot length, promiscuous mode and read timeout used when a
///   session opens the capture facility
/// - `control`: control socket path and command handling policy
/// - `output`: append-only summary file and console stream toggle
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub control: ControlConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Reads and parses a TOML configuration file. The result is not validated,
    /// call [`Config::validate`] once overrides have been applied.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    /// Checks the bounds the rest of the program relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.interface.trim().is_empty() {
            return Err(ConfigError::EmptyInterface);
        }
        if !(64..=262_144).contains(&self.capture.snaplen) {
            return Err(ConfigError::NotInRange(format!(
                "snaplen {} not in 64..=262144",
                self.capture.snaplen
            )));
        }
        if self.capture.read_timeout_ms <= 0 {
            return Err(ConfigError::NotInRange(format!(
                "read_timeout_ms {} must be positive",
                self.capture.read_timeout_ms
            )));
        }
        // "start" is the longest command and must fit
        if !(5..=64).contains(&self.control.max_command_len) {
            return Err(ConfigError::NotInRange(format!(
                "max_command_len {} not in 5..=64",
                self.control.max_command_len
            )));
        }
        let socket_len = self.control.socket_path.as_os_str().len();
        if socket_len == 0 || socket_len > MAX_SOCKET_PATH_LEN {
            return Err(ConfigError::NotInRange(format!(
                "socket_path length {} not in 1..={}",
                socket_len, MAX_SOCKET_PATH_LEN
            )));
        }
        Ok(())
    }
}
