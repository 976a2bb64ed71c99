//! Health monitor for the five dimensions of the stack.
//!
//! Checks run one after another and each yields a boolean. Two of them also try
//! a corrective action: a rolling restart of a degraded operator and deletion of
//! application pods that are not running. Neither action is verified before the
//! check returns.

use crate::console;
use crate::kube::Kubectl;
use crate::runner::{CommandRunner, Invocation};
use crate::settings::Settings;
use crate::{ConsoleError, Result};
use std::fmt;

const OPERATOR_DEPLOYMENT: &str = "grafana-operator";
const GRAFANA_SELECTOR: &str = "app=grafana-instance";
const DATABASE_SELECTOR: &str = "app=postgresql";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Cluster,
    Operator,
    Grafana,
    Database,
    Backups,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Cluster,
        Dimension::Operator,
        Dimension::Grafana,
        Dimension::Database,
        Dimension::Backups,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Cluster => "Cluster",
            Dimension::Operator => "Operator",
            Dimension::Grafana => "Grafana",
            Dimension::Database => "Database",
            Dimension::Backups => "Backups",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthGrade {
    AllHealthy,
    MostlyHealthy,
    NeedsAttention,
}

impl HealthGrade {
    /// All pass, at least 70% pass, or fewer.
    pub fn classify(healthy: usize, total: usize) -> Self {
        if healthy == total {
            HealthGrade::AllHealthy
        } else if healthy * 10 >= total * 7 {
            HealthGrade::MostlyHealthy
        } else {
            HealthGrade::NeedsAttention
        }
    }
}

impl fmt::Display for HealthGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthGrade::AllHealthy => "ALL HEALTHY",
            HealthGrade::MostlyHealthy => "MOSTLY HEALTHY",
            HealthGrade::NeedsAttention => "NEEDS ATTENTION",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub results: Vec<(Dimension, bool)>,
}

impl HealthReport {
    pub fn healthy(&self) -> usize {
        self.results.iter().filter(|(_, ok)| *ok).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn grade(&self) -> HealthGrade {
        HealthGrade::classify(self.healthy(), self.total())
    }

    pub fn get(&self, dimension: Dimension) -> Option<bool> {
        self.results
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, ok)| *ok)
    }
}

pub struct HealthMonitor<'a> {
    kubectl: Kubectl<'a>,
    settings: &'a Settings,
    probe_url: Option<String>,
}

impl<'a> HealthMonitor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            kubectl: Kubectl::new(runner),
            settings,
            probe_url: Some(format!("{}/api/health", settings.grafana_url())),
        }
    }

    /// Skip the HTTP reachability probe of the Grafana endpoint.
    pub fn without_http_probe(mut self) -> Self {
        self.probe_url = None;
        self
    }

    pub fn check_all(&self) -> Result<HealthReport> {
        console::info("Running system health check...");
        println!();

        let mut report = HealthReport::default();
        for dimension in Dimension::ALL {
            let ok = self.check(dimension)?;
            report.results.push((dimension, ok));
        }

        print_summary(&report);
        Ok(report)
    }

    /// Run one check. Anything but an interrupt is reported and counts as unhealthy.
    pub fn check(&self, dimension: Dimension) -> Result<bool> {
        let outcome = match dimension {
            Dimension::Cluster => self.check_cluster(),
            Dimension::Operator => self.check_operator(),
            Dimension::Grafana => self.check_grafana(),
            Dimension::Database => self.check_database(),
            Dimension::Backups => self.check_backups(),
        };

        match outcome {
            Ok(ok) => Ok(ok),
            Err(ConsoleError::Cancelled) => Err(ConsoleError::Cancelled),
            Err(e) => {
                console::error(format!("{}: Error - {}", dimension.label(), e));
                Ok(false)
            }
        }
    }

    fn check_cluster(&self) -> Result<bool> {
        let invocation = Invocation::new("kubectl")
            .arg("cluster-info")
            .timeout(self.settings.timeouts.cluster_probe);

        match self.kubectl.runner().run(&invocation) {
            Ok(output) if output.succeeded => {
                console::ok("Cluster: Healthy");
                Ok(true)
            }
            Ok(_) => {
                console::error("Cluster: Not responding");
                Ok(false)
            }
            Err(ConsoleError::Timeout { .. }) | Err(ConsoleError::Spawn { .. }) => {
                console::error("Cluster: Not accessible");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn check_operator(&self) -> Result<bool> {
        let namespace = &self.settings.operator_namespace;
        let deployment = match self.kubectl.deployment(OPERATOR_DEPLOYMENT, namespace) {
            Ok(deployment) => deployment,
            Err(ConsoleError::NotFound(_)) => {
                console::warn("Operator: Not deployed");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let status = deployment.snapshot(chrono::Utc::now());
        if status.is_at_parity() {
            console::ok(format!(
                "Operator: Healthy ({}/{} replicas)",
                status.ready_replicas, status.desired_replicas
            ));
            return Ok(true);
        }

        console::warn(format!(
            "Operator: {}/{} replicas ready",
            status.ready_replicas, status.desired_replicas
        ));
        console::warn("Auto-healing: Restarting operator...");
        tracing::warn!("Operator degraded, requesting rollout restart");
        if let Err(e) = self.kubectl.rollout_restart(OPERATOR_DEPLOYMENT, namespace) {
            if matches!(e, ConsoleError::Cancelled) {
                return Err(e);
            }
            tracing::warn!("Operator restart failed: {}", e);
        }
        Ok(false)
    }

    fn check_grafana(&self) -> Result<bool> {
        let namespace = &self.settings.grafana_namespace;
        let pods = self.kubectl.pods(namespace, GRAFANA_SELECTOR)?;

        if pods.is_empty() {
            console::warn("Grafana: No pods found");
            return Ok(false);
        }

        let running = pods.iter().filter(|pod| pod.is_running()).count();
        let total = pods.len();

        if running == total {
            console::ok(format!("Grafana: Healthy ({}/{} pods)", running, total));
            self.probe_endpoint();
            return Ok(true);
        }

        console::warn(format!("Grafana: {}/{} pods running", running, total));
        for pod in pods.iter().filter(|pod| !pod.is_running()) {
            let name = &pod.metadata.name;
            console::warn(format!("Auto-healing: Deleting pod {}...", name));
            tracing::warn!("Deleting pod {} in phase {}", name, pod.phase());
            if let Err(e) = self.kubectl.delete("pod", name, namespace) {
                if matches!(e, ConsoleError::Cancelled) {
                    return Err(e);
                }
                tracing::warn!("Failed to delete pod {}: {}", name, e);
            }
        }
        Ok(false)
    }

    /// Informational only; never changes the Grafana verdict.
    fn probe_endpoint(&self) {
        let Some(url) = &self.probe_url else {
            return;
        };

        let agent = ureq::AgentBuilder::new()
            .timeout(self.settings.timeouts.probe)
            .build();

        match agent.get(url).call() {
            Ok(response) if response.status() == 200 => {
                console::ok(format!("Grafana: Accessible at {}", self.settings.grafana_url()))
            }
            Ok(_) | Err(ureq::Error::Status(..)) => {
                console::warn("Grafana: Pods running but not accessible")
            }
            Err(e) => {
                tracing::debug!("Endpoint probe failed: {}", e);
                println!("  Grafana: Port check skipped (no port-forward?)");
            }
        }
    }

    fn check_database(&self) -> Result<bool> {
        let pods = self
            .kubectl
            .pods(&self.settings.grafana_namespace, DATABASE_SELECTOR)?;

        match pods.first() {
            None => {
                console::warn("Database: No pods found");
                Ok(false)
            }
            Some(pod) if pod.is_running() => {
                console::ok("Database: Healthy");
                Ok(true)
            }
            Some(pod) => {
                console::warn(format!("Database: Status - {}", pod.phase()));
                Ok(false)
            }
        }
    }

    fn check_backups(&self) -> Result<bool> {
        let present = self.kubectl.exists(
            "cronjob",
            &self.settings.backup.cronjob,
            &self.settings.grafana_namespace,
        )?;

        if present {
            console::ok("Backups: CronJob configured");
        } else {
            console::warn("Backups: Not configured");
        }
        Ok(present)
    }
}

fn print_summary(report: &HealthReport) {
    let rule = "=".repeat(50);
    println!("\n{}", rule);
    match report.grade() {
        HealthGrade::AllHealthy => console::ok("System Status: ALL HEALTHY"),
        grade @ HealthGrade::MostlyHealthy => console::warn(format!(
            "System Status: {} ({}/{})",
            grade,
            report.healthy(),
            report.total()
        )),
        grade @ HealthGrade::NeedsAttention => console::error(format!(
            "System Status: {} ({}/{})",
            grade,
            report.healthy(),
            report.total()
        )),
    }
    println!("{}\n", rule);
}

#[cfg(test)]
mod tests {
    use super::{Dimension, HealthGrade, HealthReport};

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(HealthGrade::classify(5, 5), HealthGrade::AllHealthy);
        assert_eq!(HealthGrade::classify(4, 5), HealthGrade::MostlyHealthy);
        assert_eq!(HealthGrade::classify(2, 5), HealthGrade::NeedsAttention);
        // exactly 70%
        assert_eq!(HealthGrade::classify(7, 10), HealthGrade::MostlyHealthy);
        assert_eq!(HealthGrade::classify(3, 5), HealthGrade::NeedsAttention);
    }

    #[test]
    fn test_grade_labels() {
        assert_eq!(HealthGrade::AllHealthy.to_string(), "ALL HEALTHY");
        assert_eq!(HealthGrade::MostlyHealthy.to_string(), "MOSTLY HEALTHY");
        assert_eq!(HealthGrade::NeedsAttention.to_string(), "NEEDS ATTENTION");
    }

    #[test]
    fn test_report_counts() {
        let report = HealthReport {
            results: vec![
                (Dimension::Cluster, true),
                (Dimension::Operator, true),
                (Dimension::Grafana, false),
                (Dimension::Database, true),
                (Dimension::Backups, true),
            ],
        };

        assert_eq!(report.healthy(), 4);
        assert_eq!(report.total(), 5);
        assert_eq!(report.grade(), HealthGrade::MostlyHealthy);
        assert_eq!(report.get(Dimension::Grafana), Some(false));
    }
}
