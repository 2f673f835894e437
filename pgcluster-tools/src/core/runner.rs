// Copyright 2023 The PgCluster Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Process execution seam.
//!
//! Everything that touches the host goes through [`CommandRunner`]. The production
//! implementation spawns the program with tokio; tests plug in a simulated host.

use std::fmt;
use std::future::Future;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing::warn;

use crate::core::ClusterError;
use crate::core::ClusterResult;

const REDACTED: &str = "******";

/// A program invocation: program, arguments, extra environment and optional stdin
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
    secret_args: Vec<usize>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an argument that is masked whenever the command line is displayed
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    #[inline]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[inline]
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    #[inline]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[inline]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[inline]
    pub fn get_envs(&self) -> &[(String, String)] {
        &self.envs
    }

    #[inline]
    pub fn get_stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for (index, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&index) {
                // keep the `--set=name=` prefix so the operator sees which variable it was
                let parts: Vec<&str> = arg.splitn(3, '=').collect();
                match parts.as_slice() {
                    [flag, name, _] => write!(f, " {flag}={name}={REDACTED}")?,
                    [flag, _] => write!(f, " {flag}={REDACTED}")?,
                    _ => write!(f, " {REDACTED}")?,
                }
            } else if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandLine").field(&self.to_string()).finish()
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    #[inline]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Return the output of a failed command instead of [`ClusterError::CommandFailed`]
    pub continue_on_error: bool,
}

/// Executes administrative programs. The returned future completes once the process has
/// exited and its output has been fully captured.
pub trait CommandRunner: Send + Sync {
    fn execute(&self, command: &CommandLine) -> impl Future<Output = ClusterResult<CommandOutput>> + Send;
}

/// Runs `command` and turns a non-zero exit into [`ClusterError::CommandFailed`] unless
/// `options.continue_on_error` is set.
pub async fn run<R: CommandRunner>(runner: &R, command: &CommandLine, options: RunOptions) -> ClusterResult<CommandOutput> {
    debug!(command = %command, "running administrative command");
    let output = runner.execute(command).await?;
    if !output.success() {
        if !options.continue_on_error {
            return Err(ClusterError::command_failed(
                command.to_string(),
                output.exit_code,
                output.stderr.trim(),
            ));
        }
        warn!(
            command = %command,
            exit_code = ?output.exit_code,
            "command failed, continuing: {}",
            output.stderr.trim()
        );
    }
    Ok(output)
}

/// Spawns real processes with `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    async fn execute(&self, command: &CommandLine) -> ClusterResult<CommandOutput> {
        let mut cmd = tokio::process::Command::new(command.program());
        cmd.args(command.get_args())
            .envs(command.get_envs().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if command.get_stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn()?;
        if let Some(input) = command.get_stdin() {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
        }
        let output = child.wait_with_output().await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
