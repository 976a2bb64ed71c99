use super::{choose, Session};
use crate::monitoring::MonitoringManager;
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let manager = MonitoringManager::new(session.runner, session.settings);

    loop {
        match choose(
            session,
            "Monitoring & Infrastructure",
            &["Deploy Prometheus", "Deploy Istio"],
        )? {
            0 => return Ok(()),
            1 => session.perform("Deploy Prometheus", || manager.deploy_prometheus())?,
            2 => session.perform("Deploy Istio", || manager.deploy_istio())?,
            _ => {}
        }
    }
}
