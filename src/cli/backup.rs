use super::{choose, Session};
use crate::backup::{BackupOrchestrator, BackupOutcome, RestoreOutcome};
use crate::console;
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let orchestrator = BackupOrchestrator::new(session.runner, session.settings);

    loop {
        let choice = choose(
            session,
            "Database Backup & Restore",
            &[
                "Trigger Manual Backup",
                "List Available Backups",
                "View Backup Schedule",
                "View Latest Backup Logs",
                "Check Backup System Health",
                "Restore from Backup",
            ],
        )?;

        match choice {
            0 => return Ok(()),
            1 => session.perform("Backup", || orchestrator.trigger_backup().map(|_| ()))?,
            2 => session.perform("List backups", || orchestrator.list_backups().map(|_| ()))?,
            3 => session.perform("Backup schedule", || orchestrator.show_schedule())?,
            4 => session.perform("Backup logs", || orchestrator.show_latest_logs())?,
            5 => session.perform("Backup health", || {
                orchestrator.check_health().map(|_| ())
            })?,
            6 => session.perform("Restore", || {
                orchestrator.restore(session.prompter).map(report_restore)
            })?,
            _ => {}
        }
    }
}

#[derive(Debug, PartialEq)]
enum Note {
    Ok(String),
    Warn(&'static str),
}

/// Lines to print once a restore returns. A declined restore and an empty
/// volume were already reported while prompting.
fn restore_notes(outcome: &RestoreOutcome) -> Vec<Note> {
    match outcome {
        RestoreOutcome::Cancelled | RestoreOutcome::NoBackups => Vec::new(),
        RestoreOutcome::Restored {
            archive,
            rollout_ready,
            ..
        } => {
            let mut notes = vec![Note::Ok(format!("Database restored from {}", archive))];
            if !rollout_ready {
                notes.push(Note::Warn(
                    "Grafana pods are still rolling out. Check status shortly.",
                ));
            }
            notes
        }
    }
}

fn report_restore(outcome: RestoreOutcome) {
    for note in restore_notes(&outcome) {
        match note {
            Note::Ok(line) => console::ok(line),
            Note::Warn(line) => console::warn(line),
        }
    }
}

/// `backup` subcommand: trigger one backup and wait for it. A job still running
/// after the wait window is not a failure; it keeps going in the cluster.
pub fn execute_backup(session: &Session) -> Result<()> {
    let _guard = session.begin();
    let orchestrator = BackupOrchestrator::new(session.runner, session.settings);

    match orchestrator.trigger_backup()? {
        BackupOutcome::Completed { job, .. } => {
            tracing::info!("Backup job {} completed", job);
            Ok(())
        }
        BackupOutcome::StillRunning { job } => {
            tracing::warn!("Backup job {} still running after the wait window", job);
            Ok(())
        }
    }
}

/// `backups` subcommand: print the archives on the backup volume.
pub fn execute_list(session: &Session) -> Result<()> {
    let _guard = session.begin();
    let orchestrator = BackupOrchestrator::new(session.runner, session.settings);
    orchestrator.list_backups()?;
    Ok(())
}

/// `restore` subcommand: the interactive restore flow outside the menu.
pub fn execute_restore(session: &Session) -> Result<()> {
    let _guard = session.begin();
    let orchestrator = BackupOrchestrator::new(session.runner, session.settings);
    report_restore(orchestrator.restore(session.prompter)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{restore_notes, Note};
    use crate::backup::RestoreOutcome;

    #[test]
    fn test_declined_restore_adds_nothing() {
        assert!(restore_notes(&RestoreOutcome::Cancelled).is_empty());
        assert!(restore_notes(&RestoreOutcome::NoBackups).is_empty());
    }

    #[test]
    fn test_slow_rollout_adds_warning() {
        let outcome = RestoreOutcome::Restored {
            archive: "grafana_20250101_120000.sql.gz".to_string(),
            job: "postgresql-restore-1".to_string(),
            rollout_ready: false,
        };

        let notes = restore_notes(&outcome);

        assert_eq!(notes.len(), 2);
        assert_eq!(
            notes[0],
            Note::Ok("Database restored from grafana_20250101_120000.sql.gz".to_string())
        );
        assert!(matches!(notes[1], Note::Warn(_)));
    }
}
