// External command execution
pub mod interrupt;
pub mod process;

pub use interrupt::{Interrupt, OperationGuard};
pub use process::ProcessRunner;

use crate::{ConsoleError, Result};
use std::time::Duration;

/// A single external command: program, arguments, optional input and time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub timeout: Option<Duration>,
    /// Cleanup calls run to completion even after an interrupt.
    pub cancellable: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout: None,
            cancellable: true,
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

    pub fn stdin(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(text.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn uncancellable(mut self) -> Self {
        self.cancellable = false;
        self
    }

    /// Program and arguments joined by spaces, for logs and error messages.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured result of an external command. A non-zero exit is not an error at this level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a non-zero exit into `CommandFailed`.
    pub fn require_success(self, invocation: &Invocation) -> Result<Self> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(ConsoleError::CommandFailed {
                command: invocation.command_line(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Seam between the console's sequencing logic and the external tools it drives.
pub trait CommandRunner {
    /// Run to completion with output captured.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run attached to the terminal (streaming logs, port-forwarding).
    /// Returns `Err(Cancelled)` when the operator interrupts it.
    fn run_attached(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Interruptible sleep used for settle periods and poll back-off.
    fn pause(&self, duration: Duration) -> Result<()>;
}
