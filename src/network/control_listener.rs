//! # Control Listener Module
//!
//! Local control endpoint of the analyzer: a Unix domain stream socket at a
//! well-known path. Connections are accepted one at a time; while one is
//! being served, further connection attempts wait in the kernel backlog.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌───────────────────┐
//! │ tcpwatch-ctl    │───▶│ ControlListener  │───▶│ CommandDispatcher │
//! │ (controller)    │    │ (Unix socket)    │    │                   │
//! └─────────────────┘    └──────────────────┘    └───────────────────┘
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tokio::net::{UnixListener, UnixStream};

use crate::error_handling::types::TransportError;

pub struct ControlListener {
    listener: UnixListener,
    path: PathBuf,
}

impl ControlListener {
    /// Binds the control socket, replacing a stale socket file left behind by
    /// a previous run.
    pub fn bind<P: AsRef<Path>>(path: P) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed stale control socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(TransportError::BindFailed(e)),
        }

        let listener = UnixListener::bind(&path).map_err(TransportError::BindFailed)?;
        info!("Control socket listening on {}", path.display());
        Ok(Self { listener, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn accept(&self) -> Result<UnixStream, TransportError> {
        let (stream, _) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        info!("Controller connected");
        Ok(stream)
    }
}

impl Drop for ControlListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove control socket {}: {}", self.path.display(), e);
            }
        }
    }
}
