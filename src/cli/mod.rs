// CLI module - interactive menu and direct subcommands
pub mod backup;
pub mod cluster;
pub mod diagnostics;
pub mod grafana;
pub mod health;
pub mod menu;
pub mod monitoring;
pub mod operator;

use crate::console::{self, Prompter};
use crate::runner::{CommandRunner, Interrupt, OperationGuard};
use crate::settings::Settings;
use crate::ConsoleError;
use anyhow::Result;

/// Everything a menu or subcommand needs to drive an operation.
pub struct Session<'a> {
    pub settings: &'a Settings,
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub interrupt: Option<&'a Interrupt>,
}

impl<'a> Session<'a> {
    /// Mark an operation in flight so Ctrl+C cancels it instead of exiting.
    pub fn begin(&self) -> Option<OperationGuard<'a>> {
        self.interrupt.map(Interrupt::begin)
    }

    /// Run a menu action, reporting its failure and returning to the menu.
    ///
    /// Only a closed input stream escapes, since the menu cannot continue without it.
    pub fn perform<F>(&self, label: &str, action: F) -> Result<()>
    where
        F: FnOnce() -> crate::Result<()>,
    {
        let _guard = self.begin();
        match action() {
            Ok(()) => Ok(()),
            Err(ConsoleError::InputClosed) => Err(ConsoleError::InputClosed.into()),
            Err(ConsoleError::Cancelled) => {
                println!();
                console::warn(format!("{} interrupted", label));
                Ok(())
            }
            Err(e) => {
                tracing::debug!("{} failed: {:?}", label, e);
                console::error(format!("{} failed: {}", label, e));
                if e.is_retryable() {
                    println!("  This may succeed if retried.");
                }
                Ok(())
            }
        }
    }

    /// Ask for a yes/no answer, defaulting to no.
    pub fn confirm(&self, message: &str) -> Result<bool> {
        Ok(self.prompter.confirm(message, false)?)
    }
}

/// Print a numbered submenu and return the operator's choice (0 = back).
pub fn choose(session: &Session, title: &str, items: &[&str]) -> Result<usize> {
    console::heading(title);
    for (idx, item) in items.iter().enumerate() {
        println!("{}. {}", idx + 1, item);
    }
    println!("0. Back to Main Menu");
    Ok(session.prompter.choose("Select option", items.len())?)
}
