//! Control commands and their wire framing.
//!
//! A command is a short text token terminated by `\n` (a trailing `\r` or NUL
//! is tolerated). Tokens are read with a hard upper bound so that a peer that
//! never sends a terminator cannot make the reader buffer without limit.

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error_handling::types::{ProtocolError, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Exit,
    Unknown(String),
}

impl ControlCommand {
    pub fn parse(token: &str) -> Self {
        match token {
            "start" => ControlCommand::Start,
            "stop" => ControlCommand::Stop,
            "exit" => ControlCommand::Exit,
            other => ControlCommand::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ControlCommand::Start => "start",
            ControlCommand::Stop => "stop",
            ControlCommand::Exit => "exit",
            ControlCommand::Unknown(token) => token.as_str(),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a raw token (terminator already removed).
pub fn parse_token(raw: &[u8], max_len: usize) -> Result<ControlCommand, ProtocolError> {
    let raw = strip_terminators(raw);
    if raw.len() > max_len {
        return Err(ProtocolError::Oversized { limit: max_len });
    }
    let token = std::str::from_utf8(raw).map_err(|_| ProtocolError::InvalidUtf8)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(ControlCommand::parse(token))
}

fn strip_terminators(mut raw: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r' | 0] = raw {
        raw = rest;
    }
    raw
}

/// Reads bounded, newline-terminated command tokens from a byte stream.
pub struct CommandReader<R> {
    reader: R,
    max_len: usize,
}

impl<R: AsyncBufRead + Unpin> CommandReader<R> {
    pub fn new(reader: R, max_len: usize) -> Self {
        Self { reader, max_len }
    }

    /// Returns `Ok(None)` at end of stream. A token that is invalid on its own
    /// comes back as `Some(Err(..))` and the stream stays usable.
    pub async fn next_command(
        &mut self,
    ) -> Result<Option<Result<ControlCommand, ProtocolError>>, TransportError> {
        // room for the payload plus "\r\n"
        let limit = self.max_len + 2;
        let mut buf = Vec::with_capacity(limit);
        let n = (&mut self.reader)
            .take(limit as u64)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') && n == limit {
            self.discard_line().await?;
            return Ok(Some(Err(ProtocolError::Oversized {
                limit: self.max_len,
            })));
        }
        Ok(Some(parse_token(&buf, self.max_len)))
    }

    /// Skips the remainder of an oversized line.
    async fn discard_line(&mut self) -> Result<(), TransportError> {
        let mut scratch = Vec::new();
        loop {
            scratch.clear();
            let n = (&mut self.reader)
                .take(1024)
                .read_until(b'\n', &mut scratch)
                .await?;
            if n == 0 || scratch.last() == Some(&b'\n') {
                return Ok(());
            }
        }
    }
}
