//! Controller side of the control channel, used by `tcpwatch-ctl`.

use std::io::Write;
use std::path::Path;

use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::error_handling::types::{ProtocolError, TransportError};
use crate::network::command::ControlCommand;

/// Local token that only toggles the client display; never sent.
pub const TOGGLE_TOKEN: &str = "S";

#[derive(Debug, PartialEq, Eq)]
pub enum ClientInput {
    Send(ControlCommand),
    Toggle,
    Exit,
    Rejected(ProtocolError),
}

pub fn interpret(token: &str, max_len: usize) -> ClientInput {
    if token == TOGGLE_TOKEN {
        return ClientInput::Toggle;
    }
    if token.len() > max_len {
        return ClientInput::Rejected(ProtocolError::Oversized { limit: max_len });
    }
    match ControlCommand::parse(token) {
        ControlCommand::Exit => ClientInput::Exit,
        command => ClientInput::Send(command),
    }
}

pub struct ControlClient<W> {
    writer: W,
    max_len: usize,
}

impl ControlClient<UnixStream> {
    pub async fn connect<P: AsRef<Path>>(path: P, max_len: usize) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(path.as_ref())
            .await
            .map_err(TransportError::ConnectFailed)?;
        debug!("Connected to {}", path.as_ref().display());
        Ok(Self::new(stream, max_len))
    }
}

impl<W: AsyncWrite + Unpin> ControlClient<W> {
    pub fn new(writer: W, max_len: usize) -> Self {
        Self { writer, max_len }
    }

    /// Sends one newline-terminated command.
    pub async fn send(&mut self, command: &ControlCommand) -> Result<(), TransportError> {
        let mut line = Vec::with_capacity(command.as_str().len() + 1);
        line.extend_from_slice(command.as_str().as_bytes());
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Interactive loop: prompts on `out`, reads whitespace-separated tokens
    /// from `input` and forwards them until `exit` or end of input (which is
    /// treated as `exit`).
    pub async fn run<R, O>(&mut self, input: R, out: &mut O) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
        O: Write,
    {
        let mut lines = input.lines();
        loop {
            write!(out, "Enter command: ")?;
            out.flush()?;

            let line = match lines.next_line().await? {
                Some(line) => line,
                None => {
                    writeln!(out)?;
                    return self.exit(out).await;
                }
            };

            for token in line.split_whitespace() {
                match interpret(token, self.max_len) {
                    ClientInput::Send(command) => self.send(&command).await?,
                    ClientInput::Toggle => writeln!(out, "Toggle start/stop")?,
                    ClientInput::Exit => return self.exit(out).await,
                    ClientInput::Rejected(e) => {
                        debug!("{:?} not sent: {}", token, e);
                        writeln!(out, "Rejected {:?}: {}", token, e)?;
                    }
                }
            }
        }
    }

    async fn exit<O: Write>(&mut self, out: &mut O) -> Result<(), TransportError> {
        self.send(&ControlCommand::Exit).await?;
        writeln!(out, "Exiting...")?;
        self.writer.shutdown().await?;
        Ok(())
    }
}
