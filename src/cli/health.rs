use super::{choose, Session};
use crate::health::{Dimension, HealthMonitor};
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let monitor = HealthMonitor::new(session.runner, session.settings);

    let mut items = vec!["Full Health Check"];
    items.extend(Dimension::ALL.iter().map(|d| d.label()));

    loop {
        match choose(session, "Health Check", &items)? {
            0 => return Ok(()),
            1 => session.perform("Health check", || monitor.check_all().map(|_| ()))?,
            n => {
                if let Some(&dimension) = Dimension::ALL.get(n - 2) {
                    session.perform(dimension.label(), || monitor.check(dimension).map(|_| ()))?;
                }
            }
        }
    }
}

/// `health` subcommand. Returns whether every dimension is healthy.
pub fn execute(session: &Session) -> Result<bool> {
    let _guard = session.begin();
    let report = HealthMonitor::new(session.runner, session.settings).check_all()?;
    Ok(report.healthy() == report.total())
}
