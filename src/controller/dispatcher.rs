use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, BufReader};

use crate::configuration::types::ControlConfig;
use crate::error_handling::types::TransportError;
use crate::network::command::{CommandReader, ControlCommand};
use crate::session_management::{CaptureSession, Transition};

/// What the dispatcher wants done with the connection after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    CloseConnection,
    Shutdown,
}

/// Why serving a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The controller closed its end.
    Disconnected,
    /// `exit` was received.
    ExitRequested,
    /// `exit` was received and the analyzer should terminate.
    Shutdown,
}

/// Turns control commands into capture session transitions.
///
/// Commands of a connection are handled strictly one after the other: the
/// next token is only read once the previous transition has completed.
pub struct CommandDispatcher {
    session: CaptureSession,
    control: ControlConfig,
}

impl CommandDispatcher {
    pub fn new(session: CaptureSession, control: ControlConfig) -> Self {
        Self { session, control }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub async fn dispatch(&mut self, command: ControlCommand) -> DispatchOutcome {
        match command {
            ControlCommand::Start => {
                match self.session.start().await {
                    Ok(Transition::Started(id)) => debug!("[{}] start handled", id),
                    Ok(other) => debug!("start ignored: {:?}", other),
                    Err(e) => error!("Start failed, session stays idle: {}", e),
                }
                DispatchOutcome::Continue
            }
            ControlCommand::Stop => {
                self.stop_session().await;
                DispatchOutcome::Continue
            }
            ControlCommand::Exit => {
                if self.control.stop_on_exit {
                    self.stop_session().await;
                }
                if self.control.shutdown_on_exit {
                    info!("Exit requested, shutting down");
                    DispatchOutcome::Shutdown
                } else {
                    info!("Exit requested, closing connection");
                    DispatchOutcome::CloseConnection
                }
            }
            ControlCommand::Unknown(token) => {
                warn!("Unknown command {:?} ignored", token);
                DispatchOutcome::Continue
            }
        }
    }

    /// Reads and dispatches commands until the controller disconnects or
    /// sends `exit`. Malformed tokens are logged and skipped.
    pub async fn serve<S: AsyncRead + Unpin>(
        &mut self,
        stream: S,
    ) -> Result<ConnectionEnd, TransportError> {
        let mut reader = CommandReader::new(BufReader::new(stream), self.control.max_command_len);
        loop {
            let command = match reader.next_command().await? {
                None => {
                    info!("Controller disconnected");
                    return Ok(ConnectionEnd::Disconnected);
                }
                Some(Err(e)) => {
                    warn!("Rejected command: {}", e);
                    continue;
                }
                Some(Ok(command)) => command,
            };
            debug!("Received command: {}", command);

            match self.dispatch(command).await {
                DispatchOutcome::Continue => {}
                DispatchOutcome::CloseConnection => return Ok(ConnectionEnd::ExitRequested),
                DispatchOutcome::Shutdown => return Ok(ConnectionEnd::Shutdown),
            }
        }
    }

    /// Stops any active capture. Used on exit and on analyzer shutdown.
    pub async fn stop_session(&mut self) {
        if let Err(e) = self.session.stop().await {
            error!("Stop failed: {}", e);
        }
    }
}
