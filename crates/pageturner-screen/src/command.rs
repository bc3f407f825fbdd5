//! External command runner shared by the screen adapters.
//!
//! Every adapter is a command line with an optional `{window}` placeholder,
//! so the same code drives X11 tools (`import`, `xdotool`), Wayland helpers
//! or a user script.

use std::fmt;
use std::process::{Output, Stdio};
use std::time::Duration;

use pageturner_core::TargetHandle;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Replaced by the target window id in every argument.
pub const WINDOW_PLACEHOLDER: &str = "{window}";

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command line has no program.
    #[error("Command line is empty")]
    Empty,

    /// A quote was opened but never closed.
    #[error("Unterminated quote in command line: {0}")]
    UnterminatedQuote(String),

    /// The program could not be started.
    #[error("Failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The program did not exit in time and was killed.
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// The program exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Reading or writing the program's pipes failed.
    #[error("I/O with {program} failed: {reason}")]
    Io { program: String, reason: String },
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line at whitespace. Single or double quotes group
    /// words; there are no escapes.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut in_word = false;
        let mut quote: Option<char> = None;

        for c in line.chars() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => current.push(c),
                None if c == '"' || c == '\'' => {
                    quote = Some(c);
                    in_word = true;
                }
                None if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                None => {
                    current.push(c);
                    in_word = true;
                }
            }
        }
        if quote.is_some() {
            return Err(CommandError::UnterminatedQuote(line.to_string()));
        }
        if in_word {
            words.push(current);
        }

        let mut words = words.into_iter();
        let program = words.next().ok_or(CommandError::Empty)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Copy with `{window}` replaced by `target` in every argument.
    #[must_use]
    pub fn for_target(&self, target: &TargetHandle) -> Self {
        Self {
            program: self.program.clone(),
            args: self
                .args
                .iter()
                .map(|arg| arg.replace(WINDOW_PLACEHOLDER, target.as_str()))
                .collect(),
        }
    }

    /// Run to completion, feeding `stdin` if given, and return the raw output
    /// whatever the exit status.
    ///
    /// The child is killed if `timeout` elapses.
    pub async fn run(
        &self,
        stdin: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<Output, CommandError> {
        tracing::debug!(command = %self, "Running command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        // Feed stdin concurrently so a chatty child cannot deadlock on a full
        // stdout pipe.
        let writer = match (stdin, child.stdin.take()) {
            (Some(data), Some(mut pipe)) => Some(tokio::spawn(async move {
                let result = pipe.write_all(&data).await;
                drop(pipe);
                result
            })),
            _ => None,
        };

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| CommandError::Timeout {
                program: self.program.clone(),
                timeout,
            })?
            .map_err(|e| self.io_error(&e))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // A child may exit without reading all of stdin.
                Ok(Err(e)) => tracing::debug!(error = %e, "stdin not fully consumed"),
                Err(e) => return Err(self.io_error(&e)),
            }
        }
        Ok(output)
    }

    /// Like [`run`](Self::run) but a non-zero exit is an error.
    pub async fn run_checked(
        &self,
        stdin: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<Vec<u8>, CommandError> {
        let output = self.run(stdin, timeout).await?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        Err(CommandError::Failed {
            program: self.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn io_error(&self, e: &dyn std::error::Error) -> CommandError {
        CommandError::Io {
            program: self.program.clone(),
            reason: e.to_string(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
