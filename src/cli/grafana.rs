use super::{choose, Session};
use crate::grafana::GrafanaManager;
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let manager = GrafanaManager::new(session.runner, session.settings);

    loop {
        let choice = choose(
            session,
            "Grafana Instance Management",
            &[
                "Deploy Grafana Instance",
                "List Instances",
                "Delete Instance",
                "Port Forward (Access Grafana)",
            ],
        )?;

        match choice {
            0 => return Ok(()),
            1 => session.perform("Deploy Grafana", || manager.deploy())?,
            2 => session.perform("List instances", || manager.list_instances().map(|_| ()))?,
            3 => {
                let name = session.prompter.ask("Enter instance name", None)?;
                let prompt = format!("Are you sure you want to delete instance '{}'?", name);
                if session.confirm(&prompt)? {
                    session.perform("Delete instance", || manager.delete_instance(&name))?;
                }
            }
            4 => session.perform("Port forward", || manager.port_forward())?,
            _ => {}
        }
    }
}
