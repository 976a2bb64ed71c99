use crate::console;
use crate::kube::objects::{GrafanaInstance, List};
use crate::kube::Kubectl;
use crate::runner::CommandRunner;
use crate::settings::{ManifestCatalog, Settings};
use crate::{ConsoleError, Result};
use std::path::PathBuf;

pub struct GrafanaManager<'a> {
    runner: &'a dyn CommandRunner,
    kubectl: Kubectl<'a>,
    settings: &'a Settings,
}

impl<'a> GrafanaManager<'a> {
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

    fn apply(&self, path: PathBuf) -> Result<()> {
        self.kubectl.apply_file(&ManifestCatalog::require(path)?)
    }

    fn database_present(&self) -> Result<bool> {
        let probe = self.kubectl.run_with_timeout(
            ["get", "statefulset", "postgresql", "-n", self.namespace()],
            self.settings.timeouts.probe,
        );
        match probe {
            Ok(output) => Ok(output.succeeded),
            Err(ConsoleError::Cancelled) => Err(ConsoleError::Cancelled),
            Err(e) => {
                tracing::debug!("PostgreSQL probe failed: {}", e);
                console::warn("Could not check PostgreSQL, deploying to be safe...");
                Ok(false)
            }
        }
    }

    pub fn deploy(&self) -> Result<()> {
        let manifests = self.settings.manifests();
        let pacing = &self.settings.pacing;

        console::info("Checking PostgreSQL...");
        if self.database_present()? {
            console::ok("PostgreSQL already running");
        } else {
            console::warn("PostgreSQL not found, deploying now...");
            self.apply(manifests.postgresql())?;
            self.runner.pause(pacing.after_database_deploy)?;
        }

        console::info("Configuring storage...");
        self.apply(manifests.storage_class())?;

        console::info("Applying ConfigMaps...");
        self.apply(manifests.grafana_config())?;
        self.apply(manifests.resource_quotas())?;

        console::info("Deploying Grafana instance...");
        self.apply(manifests.grafana_instance())?;

        console::info("Configuring datasources...");
        self.runner.pause(pacing.before_datasources)?;
        self.apply(manifests.grafana_datasources())?;

        console::info("Configuring networking...");
        self.apply(manifests.services())?;
        self.apply(manifests.network_policies())?;

        console::ok("Grafana deployed successfully");
        console::info(format!("Access Grafana at: {}", self.settings.grafana_url()));
        println!("Username: {}", self.settings.admin_user);
        println!("Password: {}", self.settings.admin_password);
        Ok(())
    }

    pub fn list_instances(&self) -> Result<Vec<GrafanaInstance>> {
        let list: List<GrafanaInstance> = self
            .kubectl
            .get_json(&["get", "grafanas", "-n", self.namespace()])?;

        console::heading("Grafana Instances");
        console::table::print_grafana_instances(&list.items, chrono::Utc::now());
        Ok(list.items)
    }

    pub fn delete_instance(&self, name: &str) -> Result<()> {
        self.kubectl.delete("grafana", name, self.namespace())?;
        console::ok(format!("Instance '{}' deleted successfully", name));
        Ok(())
    }

    /// Forward the Grafana service to the local port until interrupted.
    pub fn port_forward(&self) -> Result<()> {
        let port = self.settings.grafana_local_port;
        console::info(format!("Port forwarding Grafana to {}", self.settings.grafana_url()));
        println!("Press Ctrl+C to stop");

        let mapping = format!("{}:3000", port);
        let result = self.kubectl.run_attached([
            "port-forward",
            "-n",
            self.namespace(),
            "svc/grafana-instance-service",
            mapping.as_str(),
        ]);

        match result {
            Err(ConsoleError::Cancelled) => {
                console::warn("Port forwarding stopped");
                Ok(())
            }
            Ok(output) if !output.succeeded => Err(ConsoleError::CommandFailed {
                command: "kubectl port-forward".to_string(),
                stderr: "port-forward exited with an error".to_string(),
            }),
            other => other.map(|_| ()),
        }
    }
}
