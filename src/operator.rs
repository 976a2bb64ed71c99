use crate::console;
use crate::kube::Kubectl;
use crate::runner::CommandRunner;
use crate::settings::{ManifestCatalog, Settings};
use crate::wait::{poll_until, Poll};
use crate::{ConsoleError, Result};

const DEPLOYMENT: &str = "grafana-operator";

/// Install, inspect and remove the Grafana operator.
pub struct OperatorManager<'a> {
    runner: &'a dyn CommandRunner,
    kubectl: Kubectl<'a>,
    settings: &'a Settings,
}

impl<'a> OperatorManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            runner,
            kubectl: Kubectl::new(runner),
            settings,
        }
    }

    fn namespace(&self) -> &str {
        &self.settings.operator_namespace
    }

    /// CRDs, namespace, RBAC, the operator deployment, then the database.
    pub fn install(&self) -> Result<()> {
        let manifests = self.settings.manifests();

        console::info("Installing Grafana CRDs...");
        let local_crds = manifests.operator_crds();
        if local_crds.exists() {
            self.kubectl.apply_file(&local_crds)?;
        } else {
            tracing::info!("No local CRDs, applying {}", self.settings.operator_crd_url);
            self.kubectl.apply_url(&self.settings.operator_crd_url)?;
        }

        console::info("Creating namespace...");
        self.kubectl
            .apply_file(&ManifestCatalog::require(manifests.operator_namespace())?)?;

        console::info("Applying RBAC...");
        self.kubectl
            .apply_file(&ManifestCatalog::require(manifests.operator_rbac())?)?;

        console::info("Deploying operator...");
        self.kubectl
            .apply_file(&ManifestCatalog::require(manifests.operator_deployment())?)?;

        console::wait("Waiting for operator to be ready...");
        self.wait_until_available()?;

        console::info("Deploying PostgreSQL database...");
        let postgresql = manifests.postgresql();
        if postgresql.exists() {
            self.kubectl.apply_file(&postgresql)?;
            console::ok("PostgreSQL deployed");
        } else {
            console::warn("PostgreSQL manifest not found");
        }

        console::ok("Grafana Operator and Database installed successfully");
        Ok(())
    }

    fn wait_until_available(&self) -> Result<()> {
        let limit = self.settings.timeouts.operator_ready;
        let spinner = console::spinner("Waiting for grafana-operator to become available...");
        let available = poll_until(self.runner, &self.settings.backoff, limit, || {
            match self.kubectl.deployment(DEPLOYMENT, self.namespace()) {
                Ok(deployment) if deployment.is_available() => Ok(Poll::Ready(())),
                Ok(_) | Err(ConsoleError::NotFound(_)) => Ok(Poll::Pending),
                Err(e) => Err(e),
            }
        });
        spinner.finish_and_clear();

        available?.ok_or_else(|| ConsoleError::Timeout {
            command: format!("deployment/{} availability", DEPLOYMENT),
            seconds: limit.as_secs(),
        })
    }

    pub fn uninstall(&self) -> Result<()> {
        self.kubectl
            .run_checked(["delete", "namespace", self.namespace()])?;
        console::ok("Grafana Operator uninstalled successfully");
        Ok(())
    }

    /// Deployment summary table, falling back to kubectl's own table when the
    /// JSON cannot be decoded.
    pub fn status(&self) -> Result<()> {
        match self.kubectl.deployment(DEPLOYMENT, self.namespace()) {
            Ok(deployment) => {
                console::heading("Grafana Operator Status");
                console::table::print_deployment(&deployment.snapshot(chrono::Utc::now()));
                Ok(())
            }
            Err(ConsoleError::NotFound(_)) => {
                console::error("Operator not found");
                Ok(())
            }
            Err(ConsoleError::Decode { source, .. }) => {
                tracing::debug!("Falling back to plain kubectl output: {}", source);
                console::warn("Could not read operator status, using kubectl fallback...");
                let table = self.kubectl.run_checked([
                    "get",
                    "deployment",
                    DEPLOYMENT,
                    "-n",
                    self.namespace(),
                    "-o",
                    "wide",
                ])?;
                println!("{}", table);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Follow operator logs until the operator interrupts.
    pub fn stream_logs(&self) -> Result<()> {
        let selector = format!("app={}", DEPLOYMENT);
        let result = self.kubectl.run_attached([
            "logs",
            "-n",
            self.namespace(),
            "-l",
            selector.as_str(),
            "--tail=100",
            "-f",
        ]);

        match result {
            Err(ConsoleError::Cancelled) => {
                console::warn("Log streaming stopped");
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }
}
