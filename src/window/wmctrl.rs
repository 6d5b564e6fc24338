use super::{ActivationError, Activator, ProbeError, WindowProbe};
use crate::config::Config;
use std::future::Future;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone)]
struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    fn is_installed(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn command(&self, extra_arg: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(arg) = extra_arg {
            cmd.arg(arg);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

enum RunFailure {
    NotFound,
    Failed(String),
}

async fn run(tool: &CommandSpec, extra_arg: Option<&str>, timeout: Duration) -> Result<Output, RunFailure> {
    let result = tokio::time::timeout(timeout, tool.command(extra_arg).output()).await;

    let output = match result {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => return Err(RunFailure::NotFound),
        Ok(Err(e)) => return Err(RunFailure::Failed(format!("{}: {}", tool.program, e))),
        Err(_) => {
            return Err(RunFailure::Failed(format!(
                "{} timed out after {}s",
                tool.program,
                timeout.as_secs()
            )))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RunFailure::Failed(format!(
            "{} exited with {}: {}",
            tool.program,
            output.status,
            stderr.trim()
        )));
    }

    Ok(output)
}

/// `wmctrl -l` for listing and `wmctrl -a <name>` for activation, or
/// whatever commands `config.toml` substitutes for them.
#[derive(Debug, Clone)]
pub struct WmctrlTool {
    list: CommandSpec,
    activate: CommandSpec,
    timeout: Duration,
}

impl WmctrlTool {
    pub fn from_config(config: &Config) -> Self {
        Self {
            list: CommandSpec {
                program: config.list_command.clone(),
                args: config.list_args.clone(),
            },
            activate: CommandSpec {
                program: config.activate_command.clone(),
                args: config.activate_args.clone(),
            },
            timeout: config.command_timeout(),
        }
    }

    async fn list(&self) -> Result<String, ProbeError> {
        let output = run(&self.list, None, self.timeout).await.map_err(|e| match e {
            RunFailure::NotFound => ProbeError::ToolNotFound(self.list.program.clone()),
            RunFailure::Failed(msg) => ProbeError::InvocationFailed(msg),
        })?;

        // A single title in another encoding must not hide the rest of the listing.
        let text = String::from_utf8_lossy(&output.stdout);
        if text.trim().is_empty() {
            return Err(ProbeError::NoOutput);
        }
        Ok(text.into_owned())
    }

    async fn raise(&self, target: &str) -> Result<(), ActivationError> {
        run(&self.activate, Some(target), self.timeout)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                RunFailure::NotFound => ActivationError::ToolNotFound(self.activate.program.clone()),
                RunFailure::Failed(msg) => ActivationError::InvocationFailed(msg),
            })
    }
}

impl WindowProbe for WmctrlTool {
    fn is_available(&self) -> bool {
        self.list.is_installed()
    }

    fn list_windows(&self) -> impl Future<Output = Result<String, ProbeError>> + Send {
        self.list()
    }
}

impl Activator for WmctrlTool {
    fn activate(&self, target: &str) -> impl Future<Output = Result<(), ActivationError>> + Send {
        self.raise(target)
    }
}
