// Kind cluster lifecycle
pub mod reset;

use crate::console;
use crate::kube::objects::{List, Node};
use crate::kube::Kubectl;
use crate::runner::{CommandRunner, Invocation};
use crate::settings::{ManifestCatalog, Settings};
use crate::{ConsoleError, Result};

pub struct ClusterManager<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a Settings,
}

impl<'a> ClusterManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self { runner, settings }
    }

    fn kind(&self) -> Invocation {
        Invocation::new("kind")
    }

    pub fn create(&self) -> Result<()> {
        let config = ManifestCatalog::require(self.settings.manifests().kind_config())?;
        tracing::info!("Creating kind cluster {}", self.settings.cluster_name);

        let invocation = self
            .kind()
            .args(["create", "cluster", "--config"])
            .arg(config.to_string_lossy())
            .args(["--name", self.settings.cluster_name.as_str(), "--wait", "5m"])
            .timeout(self.settings.timeouts.cluster_create);

        let spinner = console::spinner("Creating Kind cluster...");
        let output = self.runner.run(&invocation);
        spinner.finish_and_clear();
        output?.require_success(&invocation)?;

        console::ok("Cluster created successfully");
        console::info("Cluster Info:");
        self.info()
    }

    pub fn delete(&self) -> Result<()> {
        let invocation = self
            .kind()
            .args(["delete", "cluster", "--name", self.settings.cluster_name.as_str()]);
        self.runner.run(&invocation)?.require_success(&invocation)?;
        console::ok("Cluster deleted successfully");
        Ok(())
    }

    pub fn exists(&self) -> Result<bool> {
        let invocation = self.kind().args(["get", "clusters"]);
        let output = self.runner.run(&invocation)?.require_success(&invocation)?;
        Ok(output
            .stdout
            .lines()
            .any(|line| line.trim() == self.settings.cluster_name))
    }

    /// Print the node table.
    pub fn info(&self) -> Result<()> {
        if !self.exists()? {
            return Err(ConsoleError::NotFound(format!(
                "cluster '{}'",
                self.settings.cluster_name
            )));
        }

        let nodes: List<Node> = Kubectl::new(self.runner).get_json(&["get", "nodes"])?;
        console::heading("Cluster Nodes");
        console::table::print_nodes(&nodes.items);
        Ok(())
    }

    pub fn export_kubeconfig(&self) -> Result<()> {
        let invocation = self.kind().args([
            "export",
            "kubeconfig",
            "--name",
            self.settings.cluster_name.as_str(),
        ]);
        self.runner.run(&invocation)?.require_success(&invocation)?;
        console::ok("Kubeconfig exported successfully");
        Ok(())
    }
}
