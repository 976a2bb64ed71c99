use crate::console;
use crate::kube::Kubectl;
use crate::runner::{CommandRunner, Invocation};
use crate::settings::{ManifestCatalog, Settings};
use crate::{ConsoleError, Result};

const PROMETHEUS_REPO: &str = "prometheus-community";
const PROMETHEUS_REPO_URL: &str = "https://prometheus-community.github.io/helm-charts";
const PROMETHEUS_CHART: &str = "prometheus-community/kube-prometheus-stack";
const MONITORING_NAMESPACE: &str = "monitoring";

/// Chart values fixed for the local stack.
const PROMETHEUS_VALUES: [&str; 6] = [
    "prometheus.prometheusSpec.serviceMonitorSelectorNilUsesHelmValues=false",
    "prometheus.prometheusSpec.podMonitorSelectorNilUsesHelmValues=false",
    "prometheus.prometheusSpec.retention=30d",
    "prometheus.prometheusSpec.storageSpec.volumeClaimTemplate.spec.storageClassName=standard",
    "prometheus.prometheusSpec.storageSpec.volumeClaimTemplate.spec.resources.requests.storage=50Gi",
    "grafana.enabled=false",
];

/// Optional add-ons: Prometheus (helm) and Istio (istioctl).
pub struct MonitoringManager<'a> {
    runner: &'a dyn CommandRunner,
    kubectl: Kubectl<'a>,
    settings: &'a Settings,
}

impl<'a> MonitoringManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            kubectl: Kubectl::new(runner),
            settings,
        }
    }

    /// Whether `<tool> version` runs cleanly.
    fn tool_available(&self, tool: &str) -> Result<bool> {
        let invocation = Invocation::new(tool)
            .arg("version")
            .timeout(self.settings.timeouts.cluster_probe);
        match self.runner.run(&invocation) {
            Ok(output) => Ok(output.succeeded),
            Err(ConsoleError::Spawn { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn deploy_prometheus(&self) -> Result<()> {
        console::info("Deploying Prometheus...");
        if !self.tool_available("helm")? {
            console::error("Helm not installed. Please install Helm first.");
            return Err(ConsoleError::NotFound("helm".to_string()));
        }

        let repo_add =
            Invocation::new("helm").args(["repo", "add", PROMETHEUS_REPO, PROMETHEUS_REPO_URL]);
        let output = self.runner.run(&repo_add)?;
        if !output.succeeded {
            // Re-adding an existing repo fails; the update below is what matters
            tracing::debug!("helm repo add: {}", output.stderr.trim());
        }

        let update = Invocation::new("helm").args(["repo", "update"]);
        self.runner.run(&update)?.require_success(&update)?;

        let mut install = Invocation::new("helm").args([
            "install",
            "prometheus",
            PROMETHEUS_CHART,
            "--namespace",
            MONITORING_NAMESPACE,
            "--create-namespace",
        ]);
        for value in PROMETHEUS_VALUES {
            install = install.args(["--set", value]);
        }
        let install = install
            .args(["--wait", "--timeout=10m"])
            .timeout(self.settings.timeouts.helm_install);

        let spinner = console::spinner("Installing Prometheus...");
        let output = self.runner.run(&install);
        spinner.finish_and_clear();
        output?.require_success(&install)?;

        console::info("Applying ServiceMonitors...");
        self.kubectl.apply_file(&ManifestCatalog::require(
            self.settings.manifests().service_monitors(),
        )?)?;

        console::ok("Prometheus deployed successfully");
        Ok(())
    }

    pub fn deploy_istio(&self) -> Result<()> {
        console::info("Deploying Istio...");
        if !self.tool_available("istioctl")? {
            console::error("istioctl not installed. Please install Istio CLI first.");
            println!("Install: curl -L https://istio.io/downloadIstio | sh -");
            return Err(ConsoleError::NotFound("istioctl".to_string()));
        }

        let install = Invocation::new("istioctl")
            .args(["install", "--set", "profile=default", "-y"])
            .timeout(self.settings.timeouts.helm_install);
        let spinner = console::spinner("Installing Istio...");
        let output = self.runner.run(&install);
        spinner.finish_and_clear();
        output?.require_success(&install)?;

        console::info("Enabling Istio injection...");
        self.kubectl.run_checked([
            "label",
            "namespace",
            self.settings.grafana_namespace.as_str(),
            "istio-injection=enabled",
            "--overwrite",
        ])?;

        console::info("Applying Istio Gateway...");
        self.runner.pause(self.settings.pacing.before_istio_gateway)?;
        self.kubectl.apply_file(&ManifestCatalog::require(
            self.settings.manifests().istio_gateway(),
        )?)?;

        console::ok("Istio deployed successfully");
        Ok(())
    }
}
