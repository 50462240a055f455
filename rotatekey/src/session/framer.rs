use crate::error::{RotateKeyError, RotateKeyResult};
use log::trace;
use regex::Regex;
use std::io;
use std::sync::OnceLock;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Exec or config prompt, e.g. `router>`, `router#`, `router(config)#`,
/// `RP/0/RP0/CPU0:xr(config)#`.
const PROMPT_PATTERN: &str = r"^[\w.\-@/:()~]{1,96}[>#]$";

fn prompt() -> &'static Regex {
    static PROMPT: OnceLock<Regex> = OnceLock::new();
    PROMPT.get_or_init(|| Regex::new(PROMPT_PATTERN).expect("prompt pattern is valid"))
}

/// Splits an interactive shell stream into command responses by reading up
/// to the next device prompt.
pub struct PromptFramer<T> {
    read_buffer: Vec<u8>,
    channel: T,
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> PromptFramer<T> {
    pub fn new(channel: T) -> Self {
        PromptFramer {
            read_buffer: Vec::new(),
            channel,
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.channel
    }

    /// Read until the stream ends in a prompt and return everything before
    /// the prompt line, with carriage returns removed.
    pub async fn read_until_prompt(&mut self) -> RotateKeyResult<String> {
        let mut buffer = [0u8; 1024];
        loop {
            if let Some(output) = self.take_response() {
                return Ok(output);
            }
            let bytes = self.channel.read(&mut buffer).await?;
            if bytes == 0 {
                return Err(RotateKeyError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "session closed before prompt",
                )));
            }
            self.read_buffer.extend(&buffer[..bytes]);
        }
    }

    /// Send one command line and return its output without the echoed
    /// command and the trailing prompt.
    pub async fn send_command(&mut self, command: &str) -> RotateKeyResult<String> {
        trace!("> {}", command);
        self.channel.write_all(command.as_bytes()).await?;
        self.channel.write_all(b"\n").await?;
        self.channel.flush().await?;

        let output = self.read_until_prompt().await?;
        trace!("< {}", output);
        Ok(strip_echo(&output, command))
    }

    fn take_response(&mut self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.read_buffer).replace('\r', "");
        let (head, last) = match text.rfind('\n') {
            Some(pos) => (&text[..pos], &text[pos + 1..]),
            None => ("", text.as_str()),
        };
        if !prompt().is_match(last.trim_end()) {
            return None;
        }
        let response = head.to_string();
        self.read_buffer.clear();
        Some(response)
    }
}

fn strip_echo(output: &str, command: &str) -> String {
    let mut lines = output.lines().peekable();
    while let Some(line) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
        } else {
            break;
        }
    }
    if let Some(line) = lines.peek() {
        if line.trim_end().ends_with(command.trim()) {
            lines.next();
        }
    }
    lines.collect::<Vec<_>>().join("\n").trim_end().to_string()
}
