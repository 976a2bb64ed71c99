use super::{choose, Session};
use crate::diagnostics::Diagnostics;
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let diagnostics = Diagnostics::new(session.runner, session.settings);
    let default_namespace = session.settings.grafana_namespace.as_str();

    loop {
        let choice = choose(
            session,
            "Diagnostics & Logs",
            &["Check All Resources", "View Pod Logs", "Describe Resource"],
        )?;

        match choice {
            0 => return Ok(()),
            1 => session.perform("Check resources", || diagnostics.all_resources())?,
            2 => {
                let namespace = session
                    .prompter
                    .ask("Enter namespace", Some(default_namespace))?;
                let pod = session.prompter.ask("Enter pod name", None)?;
                session.perform("Pod logs", || diagnostics.pod_logs(&namespace, &pod))?;
            }
            3 => {
                let namespace = session
                    .prompter
                    .ask("Enter namespace", Some(default_namespace))?;
                let kind = session
                    .prompter
                    .ask("Enter resource type (pod/deployment/svc)", None)?;
                let name = session.prompter.ask("Enter resource name", None)?;
                session.perform("Describe", || diagnostics.describe(&namespace, &kind, &name))?;
            }
            _ => {}
        }
    }
}
