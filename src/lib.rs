pub mod backup;
pub mod cli;
pub mod cluster;
pub mod console;
pub mod diagnostics;
pub mod error;
pub mod grafana;
pub mod health;
pub mod kube;
pub mod monitoring;
pub mod operator;
pub mod runner;
pub mod settings;
pub mod steps;
pub mod wait;

pub use error::{ConsoleError, Result};
