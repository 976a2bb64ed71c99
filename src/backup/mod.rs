// Backup/restore orchestration for the Grafana PostgreSQL database
pub mod artifact;
pub mod restore;

pub use artifact::BackupArtifact;
pub use restore::RestoreOutcome;

use crate::console;
use crate::kube::manifest;
use crate::kube::objects::{Job, List};
use crate::kube::{JobState, Kubectl};
use crate::runner::CommandRunner;
use crate::settings::{ManifestCatalog, Settings};
use crate::wait::{poll_until, Poll};
use crate::{ConsoleError, Result};
use artifact::{backup_job_name, inspection_pod_name, next_stamp, parse_listing};
use std::time::Duration;

const DATABASE_SELECTOR: &str = "app=postgresql";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfraStatus {
    /// Schedule and volume were both present.
    Healthy,
    /// Something was missing and the backup manifest was applied.
    Repaired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Completed { job: String, log: String },
    /// Not finished within the wait window. The job may still complete later.
    StillRunning { job: String },
}

pub struct BackupOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    kubectl: Kubectl<'a>,
    settings: &'a Settings,
}

/// Deletes the inspection pod when dropped, whatever happened in between.
struct PodCleanup<'k, 'a> {
    kubectl: &'k Kubectl<'a>,
    name: String,
    namespace: &'k str,
}

impl Drop for PodCleanup<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .kubectl
            .delete_ignore_missing("pod", &self.name, self.namespace)
        {
            tracing::warn!("Failed to remove inspection pod {}: {}", self.name, e);
        }
    }
}

impl<'a> BackupOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            kubectl: Kubectl::new(runner),
            settings,
        }
    }

    fn namespace(&self) -> &str {
        &self.settings.grafana_namespace
    }

    /// Verify the backup schedule and its volume exist, applying the backup
    /// manifest once if either is missing.
    pub fn ensure_infrastructure(&self) -> Result<InfraStatus> {
        let backup = &self.settings.backup;

        let missing = if !self.kubectl.exists("cronjob", &backup.cronjob, self.namespace())? {
            Some("Backup CronJob")
        } else if !self.kubectl.exists("pvc", &backup.pvc, self.namespace())? {
            Some("Backup PVC")
        } else {
            None
        };

        let Some(what) = missing else {
            tracing::debug!("Backup infrastructure present");
            return Ok(InfraStatus::Healthy);
        };

        console::warn(format!("{} not found. Attempting to create...", what));
        tracing::warn!("{} missing in {}, redeploying", what, self.namespace());

        let manifest = ManifestCatalog::require(self.settings.manifests().postgresql_backup())?;
        self.kubectl.apply_file(&manifest)?;
        console::ok("Backup infrastructure deployed");
        Ok(InfraStatus::Repaired)
    }

    /// Menu entry: report on the backup infrastructure, repairing it if needed.
    pub fn check_health(&self) -> Result<InfraStatus> {
        let status = self.ensure_infrastructure()?;
        match status {
            InfraStatus::Healthy => console::ok("Backup system is healthy"),
            InfraStatus::Repaired => console::ok("Backup system repaired"),
        }
        Ok(status)
    }

    /// Block until the first database pod reports Ready, for at most the configured window.
    fn ensure_database_ready(&self) -> Result<()> {
        let pods = self.kubectl.pods(self.namespace(), DATABASE_SELECTOR)?;
        let Some(first) = pods.first() else {
            return Err(ConsoleError::DatabaseNotReady(format!(
                "no pods match {} in {}",
                DATABASE_SELECTOR,
                self.namespace()
            )));
        };
        if first.is_ready() {
            return Ok(());
        }

        console::warn("PostgreSQL pod not ready. Waiting...");
        let limit = self.settings.timeouts.database_ready;
        let ready = poll_until(self.runner, &self.settings.backoff, limit, || {
            let pods = self.kubectl.pods(self.namespace(), DATABASE_SELECTOR)?;
            Ok(match pods.first() {
                Some(pod) if pod.is_ready() => Poll::Ready(()),
                _ => Poll::Pending,
            })
        })?;

        ready.ok_or_else(|| {
            ConsoleError::DatabaseNotReady(format!(
                "PostgreSQL pod not ready after {}s",
                limit.as_secs()
            ))
        })
    }

    /// Poll a job until it completes or fails. `None` when `limit` passes first.
    pub(crate) fn wait_for_job(&self, job: &str, limit: Duration) -> Result<Option<JobState>> {
        let spinner = console::spinner(&format!("Waiting for job {}...", job));
        let result = poll_until(self.runner, &self.settings.backoff, limit, || {
            match self.kubectl.job_state(job, self.namespace()) {
                Ok(JobState::Pending) | Err(ConsoleError::NotFound(_)) => Ok(Poll::Pending),
                Ok(state) => Ok(Poll::Ready(state)),
                Err(e) => Err(e),
            }
        });
        spinner.finish_and_clear();
        result
    }

    /// Start a one-off backup from the schedule's template and wait for it.
    pub fn trigger_backup(&self) -> Result<BackupOutcome> {
        self.ensure_infrastructure()?;

        console::info("Triggering database backup...");
        self.ensure_database_ready()?;

        let backup = &self.settings.backup;
        let job = backup_job_name(&backup.cronjob, next_stamp());
        self.kubectl
            .create_job_from_cronjob(&job, &backup.cronjob, self.namespace())?;
        console::ok(format!("Backup job '{}' started", job));
        tracing::info!("Created backup job {}", job);

        console::wait("Waiting for backup to complete...");
        let state = self.wait_for_job(&job, self.settings.timeouts.backup_job)?;

        match state {
            Some(JobState::Complete) => {
                let log = self.kubectl.logs(&format!("job/{}", job), self.namespace(), None)?;
                console::heading("Backup Log:");
                console::block(&log);
                console::ok("Backup completed");
                Ok(BackupOutcome::Completed { job, log })
            }
            Some(JobState::Failed) => {
                let log = self.kubectl.logs(&format!("job/{}", job), self.namespace(), None)?;
                console::heading("Backup Log:");
                console::block(&log);
                console::error(format!("Backup job '{}' failed", job));
                Err(ConsoleError::JobFailed { job, log })
            }
            _ => {
                console::warn("Backup job taking longer than expected. Check logs later.");
                Ok(BackupOutcome::StillRunning { job })
            }
        }
    }

    /// List archive names on the backup volume through a short-lived pod.
    /// The pod is removed on every path out of this function.
    pub fn enumerate_archives(&self) -> Result<Vec<BackupArtifact>> {
        let name = inspection_pod_name(next_stamp());
        let namespace = self.namespace();

        let _cleanup = PodCleanup {
            kubectl: &self.kubectl,
            name: name.clone(),
            namespace,
        };

        self.kubectl
            .apply_manifest(&manifest::inspection_pod(&name, self.settings))?;
        tracing::debug!("Started inspection pod {}", name);

        let limit = self.settings.timeouts.inspection_pod;
        let finished = poll_until(self.runner, &self.settings.backoff, limit, || {
            match self.kubectl.pod(&name, namespace) {
                Ok(pod) if pod.is_finished() => Ok(Poll::Ready(())),
                Ok(_) | Err(ConsoleError::NotFound(_)) => Ok(Poll::Pending),
                Err(e) => Err(e),
            }
        })?;

        if finished.is_none() {
            return Err(ConsoleError::Timeout {
                command: format!("pod/{} listing backups", name),
                seconds: limit.as_secs(),
            });
        }

        let log = self.kubectl.logs(&name, namespace, None)?;
        Ok(parse_listing(&log))
    }

    pub fn list_backups(&self) -> Result<Vec<BackupArtifact>> {
        self.ensure_infrastructure()?;

        console::info("Listing available backups...");
        let backups = self.enumerate_archives()?;

        if backups.is_empty() {
            console::warn("No backups found yet");
        } else {
            console::heading("Available Backups:");
            console::table::print_backups(&backups);
        }
        Ok(backups)
    }

    pub fn show_schedule(&self) -> Result<()> {
        self.ensure_infrastructure()?;
        let backup = &self.settings.backup;

        console::heading("Backup Schedule:");
        self.kubectl.run_attached([
            "get",
            "cronjob",
            backup.cronjob.as_str(),
            "-n",
            self.namespace(),
            "-o",
            "wide",
        ])?;

        console::heading("Recent Backup Jobs:");
        let selector = format!("app={}", backup.job_label);
        self.kubectl.run_attached([
            "get",
            "jobs",
            "-n",
            self.namespace(),
            "-l",
            selector.as_str(),
            "--sort-by=.metadata.creationTimestamp",
        ])?;
        Ok(())
    }

    /// Print the tail of the newest backup job's log.
    pub fn show_latest_logs(&self) -> Result<()> {
        console::info("Fetching latest backup logs...");
        let selector = format!("app={}", self.settings.backup.job_label);
        let jobs: List<Job> = self
            .kubectl
            .get_json(&["get", "jobs", "-n", self.namespace(), "-l", selector.as_str()])?;

        let Some(latest) = jobs
            .items
            .iter()
            .max_by_key(|job| job.metadata.creation_timestamp)
        else {
            console::warn("No backup jobs found");
            return Ok(());
        };

        console::heading(format!("Logs from: {}", latest.metadata.name));
        let log = self.kubectl.logs(
            &format!("job/{}", latest.metadata.name),
            self.namespace(),
            Some(50),
        )?;
        console::block(&log);
        Ok(())
    }
}
