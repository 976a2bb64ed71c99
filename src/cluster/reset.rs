use super::ClusterManager;
use crate::backup::{BackupOrchestrator, InfraStatus};
use crate::console;
use crate::grafana::GrafanaManager;
use crate::health::{HealthMonitor, HealthReport};
use crate::kube::objects::PersistentVolumeClaim;
use crate::kube::Kubectl;
use crate::monitoring::MonitoringManager;
use crate::operator::OperatorManager;
use crate::runner::Invocation;
use crate::settings::ManifestCatalog;
use crate::steps::Sequence;
use crate::{ConsoleError, Result};

const RESET_STEPS: usize = 10;

impl ClusterManager<'_> {
    /// Destroy the cluster and rebuild the whole stack from the manifests.
    ///
    /// Steps run in order and the first hard failure stops the rebuild. The
    /// Prometheus and backup steps only warn.
    pub fn complete_reset(&self) -> Result<HealthReport> {
        let settings = self.settings;
        let pacing = settings.pacing;
        let kubectl = Kubectl::new(self.runner);
        let mut steps = Sequence::new(RESET_STEPS);

        steps.step("Deleting Kind cluster", || {
            if self.exists()? {
                self.delete()?;
            } else {
                console::info("No existing cluster");
            }
            self.runner.pause(pacing.between_reset_steps)
        })?;

        steps.step("Cleaning up Docker resources", || {
            let prune = Invocation::new("docker").args(["system", "prune", "-f"]);
            let output = self.runner.run(&prune)?;
            if output.succeeded {
                console::ok("Docker cleanup complete");
            } else {
                console::warn(format!("Docker cleanup failed: {}", output.stderr.trim()));
            }
            Ok(())
        })?;

        steps.step("Verifying cleanup", || {
            if !self.exists()? {
                console::ok("Cluster completely removed");
                return Ok(());
            }
            console::warn("Cluster still exists, retrying...");
            self.delete()?;
            self.runner.pause(pacing.between_reset_steps)
        })?;

        steps.step("Creating fresh cluster", || self.create())?;

        steps.step("Verifying new cluster", || {
            let nodes = kubectl.run_checked(["get", "nodes"])?;
            console::ok("New cluster is ready!");
            console::block(&nodes);
            Ok(())
        })?;

        steps.step("Installing Grafana Operator + Database", || {
            OperatorManager::new(self.runner, settings).install()
        })?;

        steps.step("Deploying Grafana Instance", || {
            GrafanaManager::new(self.runner, settings).deploy()
        })?;

        steps.step("Deploying Prometheus Monitoring", || {
            match MonitoringManager::new(self.runner, settings).deploy_prometheus() {
                Err(ConsoleError::Cancelled) => Err(ConsoleError::Cancelled),
                Err(e) => {
                    console::warn(format!("Prometheus deployment skipped or failed: {}", e));
                    Ok(())
                }
                Ok(()) => Ok(()),
            }
        })?;

        steps.step("Configuring automated backups", || {
            match self.deploy_backups(&kubectl) {
                Err(ConsoleError::Cancelled) => Err(ConsoleError::Cancelled),
                Err(e) => {
                    console::warn(format!("Backup deployment warning: {}", e));
                    Ok(())
                }
                Ok(()) => Ok(()),
            }
        })?;

        let report = steps.step("Running health check", || {
            self.runner.pause(pacing.between_reset_steps)?;
            HealthMonitor::new(self.runner, settings).check_all()
        })?;

        print_summary(&report);
        Ok(report)
    }

    fn deploy_backups(&self, kubectl: &Kubectl<'_>) -> Result<()> {
        let settings = self.settings;
        let manifest = ManifestCatalog::require(settings.manifests().postgresql_backup())?;
        kubectl.apply_file(&manifest)?;
        console::ok("Backup infrastructure deployed");

        self.runner.pause(settings.pacing.before_pvc_check)?;
        let namespace = settings.grafana_namespace.as_str();
        let pvc_args = ["get", "pvc", settings.backup.pvc.as_str(), "-n", namespace];
        match kubectl.get_json::<PersistentVolumeClaim>(&pvc_args) {
            Ok(pvc) if pvc.is_bound() => console::ok("Backup PVC bound successfully"),
            Ok(pvc) => console::warn(format!(
                "Backup PVC status: {}",
                pvc.status.phase.as_deref().unwrap_or("Unknown")
            )),
            Err(ConsoleError::Cancelled) => return Err(ConsoleError::Cancelled),
            Err(e) => console::warn(format!("Backup PVC not readable: {}", e)),
        }

        let orchestrator = BackupOrchestrator::new(self.runner, settings);
        match orchestrator.ensure_infrastructure()? {
            InfraStatus::Healthy => console::ok("Backup CronJob configured"),
            InfraStatus::Repaired => console::warn("Backup CronJob had to be re-applied"),
        }
        Ok(())
    }
}

fn print_summary(report: &HealthReport) {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    console::ok("COMPLETE RESET FINISHED");
    println!("Health: {} ({}/{})", report.grade(), report.healthy(), report.total());
    println!("{}", rule);
}
