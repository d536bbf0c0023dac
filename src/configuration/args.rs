use super::config::Config;
use super::types::{DEFAULT_MAX_COMMAND_LEN, DEFAULT_SOCKET_PATH};
use crate::error_handling::types::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments of the analyzer.
///
/// Every flag is optional: values given here override the ones read from the
/// configuration file, which in turn override the built-in defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tcpwatch")]
#[command(version)]
#[command(about = "Live TCP traffic monitor driven over a local control socket")]
pub struct AnalyzerArgs {
    /// Path to a TOML configuration file
    ///
    /// # Command Line
    /// Use `--config <PATH>` or the `TCPWATCH_CONFIG` environment variable
    #[arg(short, long, env = "TCPWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Network interface to capture on
    #[arg(short, long, env = "TCPWATCH_INTERFACE")]
    pub interface: Option<String>,

    /// Control socket path the controller connects to
    #[arg(long, env = "TCPWATCH_SOCKET_PATH")]
    pub socket_path: Option<PathBuf>,

    /// Append-only file receiving one line per analyzed TCP segment
    #[arg(short, long, env = "TCPWATCH_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Snapshot length handed to the capture facility
    #[arg(long)]
    pub snaplen: Option<i32>,

    /// Read timeout in milliseconds; bounds how long a stop request waits for
    /// a blocked read
    #[arg(long)]
    pub read_timeout_ms: Option<i32>,

    /// Do not put the interface in promiscuous mode
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_promisc: bool,

    /// Suppress the per-segment console status lines
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub quiet: bool,
}

impl AnalyzerArgs {
    /// Loads the configuration file (if any), applies the command-line
    /// overrides and validates the result.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(self, config: &mut Config) {
        if let Some(interface) = self.interface {
            config.capture.interface = interface;
        }
        if let Some(socket_path) = self.socket_path {
            config.control.socket_path = socket_path;
        }
        if let Some(output_file) = self.output_file {
            config.output.file = output_file;
        }
        if let Some(snaplen) = self.snaplen {
            config.capture.snaplen = snaplen;
        }
        if let Some(timeout) = self.read_timeout_ms {
            config.capture.read_timeout_ms = timeout;
        }
        if self.no_promisc {
            config.capture.promiscuous = false;
        }
        if self.quiet {
            config.output.console = false;
        }
    }
}

/// Command-line arguments of the controller client.
#[derive(Parser, Debug, Clone)]
#[command(name = "tcpwatch-ctl")]
#[command(version)]
#[command(about = "Interactive controller for a running tcpwatch analyzer")]
pub struct ClientArgs {
    /// Control socket path of the analyzer
    #[arg(long, env = "TCPWATCH_SOCKET_PATH", default_value = DEFAULT_SOCKET_PATH)]
    pub socket_path: PathBuf,

    /// Longest command token the client will send
    #[arg(long, default_value_t = DEFAULT_MAX_COMMAND_LEN)]
    pub max_command_len: usize,
}
