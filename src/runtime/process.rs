//! External command execution.
//!
//! Commands always run to completion one at a time; the caller awaits each
//! invocation before issuing the next. Output is captured in memory and can
//! additionally be echoed to the console, wrapped and indented so nested
//! package output lines up under its log label.

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::RealRuntime;
use crate::error::LinkyError;

/// Column width used when echoing command output.
pub const WRAP_WIDTH: usize = 80;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
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
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a command is run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Working directory of the child. `None` inherits ours.
    pub cwd: Option<PathBuf>,
    /// Echo stdout/stderr while the command runs.
    pub stream: bool,
    /// Indentation of echoed lines.
    pub indent: usize,
    /// Abort the command when it runs longer than this.
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(dir.into()),
            ..Default::default()
        }
    }

    pub fn streamed(mut self, indent: usize) -> Self {
        self.stream = true;
        self.indent = indent;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Split `text` into lines of at most `width` characters, each prefixed by
/// `indent` spaces. Empty lines are dropped.
pub fn wrap_lines(text: &str, width: usize, indent: usize) -> String {
    let width = width.max(1);
    let pad = " ".repeat(indent);
    let mut out = String::new();

    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        for chunk in chars.chunks(width) {
            out.push_str(&pad);
            out.extend(chunk);
            out.push('\n');
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
enum Echo {
    Stdout,
    Stderr,
}

/// Read a child stream to the end, echoing complete lines when requested.
async fn drain<S: AsyncRead + Unpin>(
    stream: S,
    options: &RunOptions,
    echo: Echo,
) -> std::io::Result<String> {
    let mut reader = BufReader::new(stream);
    let mut collected = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let chunk = String::from_utf8_lossy(&buf);
        if options.stream {
            let wrapped = wrap_lines(&chunk, WRAP_WIDTH, options.indent);
            if !wrapped.is_empty() {
                match echo {
                    Echo::Stdout => print!("{}", wrapped),
                    Echo::Stderr => eprint!("{}", wrapped),
                }
            }
        }
        collected.push_str(&chunk);
    }
    Ok(collected)
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn run_impl(
        &self,
        command: &HostCommand,
        options: &RunOptions,
    ) -> Result<String> {
        log::debug!("Running `{}` in {:?}", command, options.cwd);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &options.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", command))?;
        let stdout = child
            .stdout
            .take()
            .context("Child process has no stdout handle")?;
        let stderr = child
            .stderr
            .take()
            .context("Child process has no stderr handle")?;

        let completion = async {
            let (out, err) = tokio::try_join!(
                drain(stdout, options, Echo::Stdout),
                drain(stderr, options, Echo::Stderr),
            )?;
            let status = child.wait().await?;
            Ok::<(ExitStatus, String, String), std::io::Error>((status, out, err))
        };

        let (status, stdout, stderr) = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, completion)
                .await
                .map_err(|_| LinkyError::Timeout {
                    command: command.to_string(),
                    limit,
                })?,
            None => completion.await,
        }
        .with_context(|| format!("Failed to wait for `{}`", command))?;

        if status.success() {
            Ok(stdout.trim().to_string())
        } else {
            Err(LinkyError::Subprocess {
                command: command.to_string(),
                code: status.code(),
                stderr: stderr.trim().to_string(),
            }
            .into())
        }
    }
}
