use super::Session;
use crate::console;
use crate::ConsoleError;
use anyhow::Result;

const MAIN_MENU: [&str; 7] = [
    "Cluster Management",
    "Operator Management",
    "Grafana Instance Management",
    "Database Backup & Restore",
    "Monitoring & Infrastructure",
    "System Health Check",
    "Diagnostics & Logs",
];

/// Interactive main loop. Ends on choice 0 or when input is closed.
pub fn run(session: &Session) -> Result<()> {
    console::banner("Grafana Operator Management Console");

    loop {
        match dispatch(session) {
            Ok(true) => continue,
            Ok(false) => break,
            Err(e) if input_closed(&e) => break,
            Err(e) => return Err(e),
        }
    }

    println!();
    console::info("Goodbye!");
    Ok(())
}

/// One round of the main menu. `false` means the operator chose to exit.
fn dispatch(session: &Session) -> Result<bool> {
    console::heading("Main Menu");
    for (idx, item) in MAIN_MENU.iter().enumerate() {
        println!("{}. {}", idx + 1, item);
    }
    println!("0. Exit");

    match session.prompter.choose("Select option", MAIN_MENU.len())? {
        0 => return Ok(false),
        1 => super::cluster::menu(session)?,
        2 => super::operator::menu(session)?,
        3 => super::grafana::menu(session)?,
        4 => super::backup::menu(session)?,
        5 => super::monitoring::menu(session)?,
        6 => super::health::menu(session)?,
        7 => super::diagnostics::menu(session)?,
        _ => {}
    }
    Ok(true)
}

fn input_closed(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ConsoleError>(),
        Some(ConsoleError::InputClosed)
    )
}
