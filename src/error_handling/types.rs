use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    EmptyInterface,
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::EmptyInterface => write!(f, "Capture interface name is empty"),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Control channel failures. Fatal when they happen while setting the channel up.
#[derive(Debug)]
pub enum TransportError {
    BindFailed(std::io::Error),
    AcceptFailed(std::io::Error),
    ConnectFailed(std::io::Error),
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::BindFailed(e) => write!(f, "Control socket bind failed: {}", e),
            TransportError::AcceptFailed(e) => write!(f, "Control socket accept failed: {}", e),
            TransportError::ConnectFailed(e) => write!(f, "Control socket connect failed: {}", e),
            TransportError::Io(e) => write!(f, "Control channel IO error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

/// The capture facility could not provide frames for the configured interface.
#[derive(Debug)]
pub enum DeviceError {
    NotFound(String),
    OpenFailed { interface: String, reason: String },
    ReadFailed(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound(name) => write!(f, "Capture device not found: {}", name),
            DeviceError::OpenFailed { interface, reason } => {
                write!(f, "Couldn't open device {}: {}", interface, reason)
            }
            DeviceError::ReadFailed(e) => write!(f, "Capture read failed: {}", e),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A command token that could not be accepted. Never changes session state.
#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolError {
    Empty,
    Oversized { limit: usize },
    InvalidUtf8,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Empty => write!(f, "Empty command token"),
            ProtocolError::Oversized { limit } => {
                write!(f, "Command token longer than {} bytes", limit)
            }
            ProtocolError::InvalidUtf8 => write!(f, "Command token is not valid UTF-8"),
        }
    }
}

impl std::error::Error for ProtocolError {}

#[derive(Debug)]
pub struct SinkWriteError {
    pub sink: String,
    pub source: std::io::Error,
}

impl fmt::Display for SinkWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Write to {} failed: {}", self.sink, self.source)
    }
}

impl std::error::Error for SinkWriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Reasons a captured frame cannot be decoded. Absorbed by the classifier.
#[derive(Debug, PartialEq, Eq)]
pub enum MalformedFrameError {
    Truncated { needed: usize, available: usize },
    BadIpVersion(u8),
    BadIpHeaderLength(u8),
    BadTcpDataOffset(u8),
}

impl fmt::Display for MalformedFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedFrameError::Truncated { needed, available } => write!(
                f,
                "Frame truncated: needed {} bytes, {} available",
                needed, available
            ),
            MalformedFrameError::BadIpVersion(version) => {
                write!(f, "Unexpected IP version {} in an IPv4 frame", version)
            }
            MalformedFrameError::BadIpHeaderLength(ihl) => {
                write!(f, "Invalid IPv4 header length field: {}", ihl)
            }
            MalformedFrameError::BadTcpDataOffset(offset) => {
                write!(f, "Invalid TCP data offset field: {}", offset)
            }
        }
    }
}

impl std::error::Error for MalformedFrameError {}

#[derive(Debug)]
pub enum SessionError {
    Device(DeviceError),
    WorkerFailed(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Device(e) => write!(f, "Device error: {}", e),
            SessionError::WorkerFailed(e) => write!(f, "Capture worker failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<DeviceError> for SessionError {
    fn from(err: DeviceError) -> Self {
        SessionError::Device(err)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    Transport(TransportError),
    Device(DeviceError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Transport(e) => write!(f, "Transport error: {}", e),
            ControllerError::Device(e) => write!(f, "Device error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<TransportError> for ControllerError {
    fn from(err: TransportError) -> Self {
        ControllerError::Transport(err)
    }
}

impl From<DeviceError> for ControllerError {
    fn from(err: DeviceError) -> Self {
        ControllerError::Device(err)
    }
}
