use super::{CommandOutput, CommandRunner, Interrupt, Invocation};
use crate::{ConsoleError, Result};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/// Runs external tools as child processes.
///
/// Every call is bounded by the invocation's timeout (or the default) and by the
/// operator interrupt; the child is killed when either fires.
pub struct ProcessRunner {
    runtime: Runtime,
    interrupt: Interrupt,
    default_timeout: Duration,
}

impl ProcessRunner {
    pub fn new(default_timeout: Duration) -> Result<Self> {
        let runtime = Runtime::new()?;
        Ok(Self {
            runtime,
            interrupt: Interrupt::new(),
            default_timeout,
        })
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Route Ctrl+C to the interrupt instead of terminating the process.
    pub fn listen_for_interrupts(&self) {
        self.interrupt.listen(self.runtime.handle());
    }

    fn token_for(&self, invocation: &Invocation) -> CancellationToken {
        if invocation.cancellable {
            self.interrupt.token()
        } else {
            CancellationToken::new()
        }
    }
}

fn command(invocation: &Invocation) -> Command {
    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).kill_on_drop(true);
    command
}

fn spawn_error(invocation: &Invocation, source: std::io::Error) -> ConsoleError {
    ConsoleError::Spawn {
        program: invocation.program.clone(),
        source,
    }
}

fn timeout_error(invocation: &Invocation, limit: Duration) -> ConsoleError {
    ConsoleError::Timeout {
        command: invocation.command_line(),
        seconds: limit.as_secs(),
    }
}

/// Returns `None` when the token fired before the child finished. Nothing is
/// spawned once the token has fired.
async fn capture(
    invocation: &Invocation,
    limit: Duration,
    token: CancellationToken,
) -> Result<Option<Output>> {
    let mut cmd = command(invocation);
    cmd.stdin(if invocation.stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    if token.is_cancelled() {
        return Ok(None);
    }
    let mut child = cmd.spawn().map_err(|e| spawn_error(invocation, e))?;

    if let (Some(text), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
        stdin.write_all(text.as_bytes()).await?;
        stdin.shutdown().await?;
    }

    tokio::select! {
        output = child.wait_with_output() => Ok(Some(output?)),
        _ = tokio::time::sleep(limit) => Err(timeout_error(invocation, limit)),
        _ = token.cancelled() => Ok(None),
    }
}

async fn attach(
    invocation: &Invocation,
    limit: Option<Duration>,
    token: CancellationToken,
) -> Result<Option<ExitStatus>> {
    let mut cmd = command(invocation);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if token.is_cancelled() {
        return Ok(None);
    }
    let mut child = cmd.spawn().map_err(|e| spawn_error(invocation, e))?;

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        status = child.wait() => Ok(Some(status?)),
        _ = deadline => Err(timeout_error(invocation, limit.unwrap_or_default())),
        _ = token.cancelled() => Ok(None),
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!("Running: {}", invocation.command_line());

        let limit = invocation.timeout.unwrap_or(self.default_timeout);
        let token = self.token_for(invocation);

        let output = match self
            .runtime
            .block_on(capture(invocation, limit, token.clone()))?
        {
            Some(output) if !token.is_cancelled() => output,
            _ => return Err(ConsoleError::Cancelled),
        };

        if !output.status.success() {
            tracing::debug!(
                "Command exited with {}: {}",
                output.status,
                invocation.command_line()
            );
        }

        Ok(CommandOutput {
            succeeded: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_attached(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!("Running attached: {}", invocation.command_line());

        let token = self.token_for(invocation);

        match self
            .runtime
            .block_on(attach(invocation, invocation.timeout, token.clone()))?
        {
            Some(status) if !token.is_cancelled() => Ok(CommandOutput {
                succeeded: status.success(),
                ..CommandOutput::default()
            }),
            _ => Err(ConsoleError::Cancelled),
        }
    }

    fn pause(&self, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            return Ok(());
        }

        let token = self.interrupt.token();
        self.runtime.block_on(async {
            tokio::select! {
                _ = tokio::time::sleep(duration) => Ok(()),
                _ = token.cancelled() => Err(ConsoleError::Cancelled),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessRunner;
    use crate::runner::{CommandRunner, Invocation};
    use crate::ConsoleError;
    use std::time::Duration;

    const MISSING_TOOL: &str = "grafana-ops-missing-tool";

    #[test]
    fn test_nothing_spawns_after_interrupt() {
        let runner = ProcessRunner::new(Duration::from_secs(5)).unwrap();
        let _guard = runner.interrupt().begin();
        runner.interrupt().trigger();

        // A spawn attempt would surface as a Spawn error for the missing program
        let captured = runner.run(&Invocation::new(MISSING_TOOL));
        let attached = runner.run_attached(&Invocation::new(MISSING_TOOL));

        assert!(matches!(captured, Err(ConsoleError::Cancelled)));
        assert!(matches!(attached, Err(ConsoleError::Cancelled)));
    }

    #[test]
    fn test_uncancellable_command_still_spawns_after_interrupt() {
        let runner = ProcessRunner::new(Duration::from_secs(5)).unwrap();
        let _guard = runner.interrupt().begin();
        runner.interrupt().trigger();

        let result = runner.run(&Invocation::new(MISSING_TOOL).uncancellable());

        assert!(matches!(result, Err(ConsoleError::Spawn { .. })));
    }

    #[test]
    fn test_pause_after_interrupt_is_cancelled() {
        let runner = ProcessRunner::new(Duration::from_secs(5)).unwrap();
        let _guard = runner.interrupt().begin();
        runner.interrupt().trigger();

        let result = runner.pause(Duration::from_secs(30));

        assert!(matches!(result, Err(ConsoleError::Cancelled)));
    }
}
