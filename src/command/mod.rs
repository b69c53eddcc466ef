use std::fmt;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::errors::Error;

#[cfg(test)]
pub mod testing;

/// What to do when a command exits non-zero or cannot be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnFailure {
    /// Stop provisioning with the given message.
    Abort(String),
    /// Log the message and carry on.
    Log(String),
    /// The caller inspects the exit code itself.
    Ignore,
}

/// A single external program invocation. Arguments are passed as-is, never through a shell.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
    pub on_failure: OnFailure,
}

impl CommandRequest {
    pub fn new(program: impl Into<String>) -> Self {
        CommandRequest {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            on_failure: OnFailure::Ignore,
        }
    }

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

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn or_abort(mut self, message: impl Into<String>) -> Self {
        self.on_failure = OnFailure::Abort(message.into());
        self
    }

    pub fn or_log(mut self, message: impl Into<String>) -> Self {
        self.on_failure = OnFailure::Log(message.into());
        self
    }

    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line().join(" "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal or never started.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait Runner: Send + Sync {
    /// Run the request to completion. A non-zero exit is not an error here.
    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, Error>;

    /// Run the request and apply its failure policy.
    async fn execute(&self, request: &CommandRequest) -> Result<CommandOutput, Error> {
        let output = match self.run(request).await {
            Ok(output) => output,
            Err(Error::CommandError(_, err)) => CommandOutput {
                stdout: String::new(),
                stderr: err.to_string(),
                code: None,
            },
            Err(err) => return Err(err),
        };
        if output.success() {
            return Ok(output);
        }

        match &request.on_failure {
            OnFailure::Abort(message) => {
                warn!(command = %request, code = ?output.code, stderr = %output.stderr.trim(), "command failed");
                Err(Error::StepFailed(message.clone()))
            }
            OnFailure::Log(message) => {
                error!(command = %request, code = ?output.code, stderr = %output.stderr.trim(), "{message}");
                Ok(output)
            }
            OnFailure::Ignore => {
                debug!(command = %request, code = ?output.code, "command failed");
                Ok(output)
            }
        }
    }
}

/// Runs requests as real child processes.
pub struct SystemRunner;

#[async_trait]
impl Runner for SystemRunner {
    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, Error> {
        debug!(command = %request, "running");

        let mut child = Command::new(&request.program)
            .args(&request.args)
            .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| Error::CommandError(request.command_line(), err))?;

        // Feed stdin while collecting output so a chatty child cannot block on a full pipe.
        let pipe = child.stdin.take();
        let feed = async {
            if let (Some(mut pipe), Some(input)) = (pipe, request.stdin.as_ref()) {
                pipe.write_all(input.as_bytes()).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if let Err(err) = fed {
            warn!(command = %request, "failed to write stdin: {err}");
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

/// `oc` pointed at the admin kubeconfig.
pub fn oc(config: &Config) -> CommandRequest {
    CommandRequest::new("oc").env("KUBECONFIG", config.kubeconfig().to_string_lossy())
}

/// `oadm` pointed at the admin kubeconfig.
pub fn oadm(config: &Config) -> CommandRequest {
    CommandRequest::new("oadm").env("KUBECONFIG", config.kubeconfig().to_string_lossy())
}
