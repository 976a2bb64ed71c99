// Operator-facing output: colored status lines, spinners, prompts, tables
pub mod prompt;
pub mod table;

pub use prompt::{Prompter, StdinPrompter};

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const RED: &str = "\x1b[1;31m";
const BLUE: &str = "\x1b[1;34m";
const CYAN: &str = "\x1b[1;36m";

pub fn ok(message: impl AsRef<str>) {
    println!("{GREEN}[OK]{RESET} {}", message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    println!("{YELLOW}[WARNING]{RESET} {}", message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    println!("{RED}[ERROR]{RESET} {}", message.as_ref());
}

pub fn info(message: impl AsRef<str>) {
    println!("{BLUE}[INFO]{RESET} {}", message.as_ref());
}

pub fn wait(message: impl AsRef<str>) {
    println!("{YELLOW}[WAIT]{RESET} {}", message.as_ref());
}

pub fn heading(title: impl AsRef<str>) {
    println!("\n{CYAN}{}{RESET}", title.as_ref());
}

pub fn banner(title: &str) {
    let rule = "=".repeat(60);
    println!("{CYAN}{rule}{RESET}");
    println!("{CYAN}   {title}{RESET}");
    println!("{CYAN}{rule}{RESET}");
}

/// Indented raw text (command output, job logs).
pub fn block(text: &str) {
    for line in text.lines() {
        println!("  {}", line);
    }
}

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
