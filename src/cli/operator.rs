use super::{choose, Session};
use crate::operator::OperatorManager;
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let manager = OperatorManager::new(session.runner, session.settings);

    loop {
        let choice = choose(
            session,
            "Operator Management",
            &[
                "Install Operator",
                "Uninstall Operator",
                "Get Operator Status",
                "View Operator Logs",
            ],
        )?;

        match choice {
            0 => return Ok(()),
            1 => session.perform("Install operator", || manager.install())?,
            2 => {
                if session.confirm("Are you sure you want to uninstall the Grafana Operator?")? {
                    session.perform("Uninstall operator", || manager.uninstall())?;
                }
            }
            3 => session.perform("Operator status", || manager.status())?,
            4 => session.perform("Operator logs", || manager.stream_logs())?,
            _ => {}
        }
    }
}
