use super::artifact::{next_stamp, restore_job_name};
use super::BackupOrchestrator;
use crate::console::{self, Prompter};
use crate::kube::{manifest, JobState};
use crate::{ConsoleError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The operator backed out before anything destructive happened.
    Cancelled,
    NoBackups,
    Restored {
        archive: String,
        job: String,
        /// Whether the rollout reported ready within the window.
        rollout_ready: bool,
    },
}

impl BackupOrchestrator<'_> {
    fn print_manual_scale_up(&self) {
        println!("\nManual scaling required:");
        println!(
            "  kubectl scale deployment -n {} --all --replicas={}",
            self.namespace(),
            self.settings.grafana_replicas
        );
    }

    /// Restore the database from an archive the operator picks.
    ///
    /// Nothing destructive runs until the operator has picked an archive and
    /// confirmed. From then on the sequence runs to the end or stops at the first
    /// failure. A restore that fails or is interrupted after the scale-down leaves
    /// the deployments at zero and prints the command to bring them back.
    pub fn restore(&self, prompter: &dyn Prompter) -> Result<RestoreOutcome> {
        self.ensure_infrastructure()?;

        console::heading("WARNING: Database Restore");
        println!("This will:");
        println!("  - Drop the current Grafana database");
        println!("  - Delete ALL existing data");
        println!("  - Restore from the selected backup");
        println!("\nTHIS CANNOT BE UNDONE!");

        console::info("Fetching available backups...");
        let backups = self.enumerate_archives()?;
        if backups.is_empty() {
            console::error("No backups available");
            return Ok(RestoreOutcome::NoBackups);
        }

        console::heading("Available Backups:");
        for (idx, backup) in backups.iter().enumerate() {
            println!("  {}. {}", idx + 1, backup.filename);
        }

        let choice = prompter.choose(
            "Select backup number to restore (or 0 to cancel)",
            backups.len(),
        )?;
        let Some(selected) = choice.checked_sub(1).and_then(|idx| backups.get(idx)) else {
            console::warn("Restore cancelled");
            return Ok(RestoreOutcome::Cancelled);
        };
        let archive = selected.filename.clone();

        let confirmed = prompter.confirm(
            &format!(
                "Restore from '{}'? This will DELETE all current data!",
                archive
            ),
            false,
        )?;
        if !confirmed {
            console::warn("Restore cancelled");
            return Ok(RestoreOutcome::Cancelled);
        }

        tracing::info!("Restoring database from {}", archive);
        console::info(format!("Starting restore from {}...", archive));

        // Sever database connections before the restore drops the schema
        console::wait("Scaling Grafana to 0 replicas...");
        let scale_down = self.kubectl.scale_all(self.namespace(), 0)?;
        if !scale_down.succeeded {
            console::error(format!(
                "Failed to scale down Grafana: {}",
                scale_down.stderr.trim()
            ));
            return Err(ConsoleError::ScaleFailed {
                replicas: 0,
                stderr: scale_down.stderr.trim().to_string(),
            });
        }
        console::ok("Grafana scaled to 0 replicas");

        // Any exit from here until the scale-up leaves Grafana at zero replicas
        let job = match self.restore_while_scaled_down(&archive) {
            Ok(job) => job,
            Err(e) => {
                if matches!(e, ConsoleError::Cancelled) {
                    console::warn("Restore interrupted while Grafana is scaled to 0 replicas");
                }
                self.print_manual_scale_up();
                return Err(e);
            }
        };

        console::ok("Database restored successfully!");

        let replicas = self.settings.grafana_replicas;
        console::info("Scaling Grafana back to original replica count...");
        let scale_up = self.kubectl.scale_all(self.namespace(), replicas)?;
        if !scale_up.succeeded {
            console::warn(format!(
                "Failed to scale up Grafana: {}",
                scale_up.stderr.trim()
            ));
            self.print_manual_scale_up();
            return Err(ConsoleError::ScaleFailed {
                replicas,
                stderr: scale_up.stderr.trim().to_string(),
            });
        }
        console::ok(format!("Grafana scaled back to {} replicas", replicas));

        console::wait("Waiting for pods to be ready...");
        self.runner.pause(self.settings.pacing.before_rollout_check)?;
        let rollout = self
            .kubectl
            .rollout_status(self.namespace(), self.settings.timeouts.rollout)?;

        if rollout.succeeded {
            console::ok("All Grafana pods are ready with restored data!");
            console::info(format!("Access Grafana at: {}", self.settings.grafana_url()));
        } else {
            console::warn("Rollout taking longer than expected. Check status manually.");
        }

        Ok(RestoreOutcome::Restored {
            archive,
            job,
            rollout_ready: rollout.succeeded,
        })
    }

    /// Settle, run the restore job and wait for it. Returns the job name once it
    /// has completed.
    fn restore_while_scaled_down(&self, archive: &str) -> Result<String> {
        self.runner.pause(self.settings.pacing.after_scale_down)?;

        let job = restore_job_name(next_stamp());
        self.kubectl
            .apply_manifest(&manifest::restore_job(&job, archive, self.settings))?;
        console::ok(format!("Restore job '{}' started", job));
        console::wait("Waiting for restore to complete (this may take a few minutes)...");

        let limit = self.settings.timeouts.restore_job;
        let state = self.wait_for_job(&job, limit)?;

        let log = self
            .kubectl
            .logs(&format!("job/{}", job), self.namespace(), None)?;
        console::heading("Restore Log:");
        console::block(&log);

        match state {
            Some(JobState::Complete) => Ok(job),
            Some(JobState::Failed) => {
                console::error("Restore job failed. Check logs above.");
                Err(ConsoleError::JobFailed { job, log })
            }
            _ => {
                console::error("Restore job timed out. Check logs above.");
                Err(ConsoleError::Timeout {
                    command: format!("job/{}", job),
                    seconds: limit.as_secs(),
                })
            }
        }
    }
}
