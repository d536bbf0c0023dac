use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Well-known path of the control channel endpoint.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/packet_capture_socket";
pub const DEFAULT_OUTPUT_FILE: &str = "captured_packets.txt";
/// Longest accepted command payload, terminator excluded.
pub const DEFAULT_MAX_COMMAND_LEN: usize = 9;

/// Settings handed to the capture facility when a session opens the device.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub interface: String,
    pub snaplen: i32,
    pub promiscuous: bool,
    /// Upper bound on how long a blocked read waits before the delivery loop
    /// gets to look at the stop flag again.
    pub read_timeout_ms: i32,
    pub verify_interface: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: String::from("eth0"),
            snaplen: 8192,
            promiscuous: true,
            read_timeout_ms: 250,
            verify_interface: true,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub socket_path: PathBuf,
    pub max_command_len: usize,
    /// Stop an active capture before closing the connection on `exit`.
    pub stop_on_exit: bool,
    /// Terminate the analyzer after handling `exit`.
    pub shutdown_on_exit: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
            stop_on_exit: true,
            shutdown_on_exit: false,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub file: PathBuf,
    pub console: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            console: true,
        }
    }
}
