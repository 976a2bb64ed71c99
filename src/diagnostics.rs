use crate::console;
use crate::kube::Kubectl;
use crate::runner::CommandRunner;
use crate::settings::Settings;
use crate::{ConsoleError, Result};

/// Raw kubectl views printed straight to the terminal.
pub struct Diagnostics<'a> {
    kubectl: Kubectl<'a>,
    settings: &'a Settings,
}

impl<'a> Diagnostics<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        Self {
            kubectl: Kubectl::new(runner),
            settings,
        }
    }

    pub fn namespaces(&self) -> Vec<&str> {
        vec![
            self.settings.grafana_namespace.as_str(),
            self.settings.operator_namespace.as_str(),
            "monitoring",
            "istio-system",
        ]
    }

    pub fn all_resources(&self) -> Result<()> {
        for namespace in self.namespaces() {
            console::heading(format!("Namespace: {}", namespace));
            let output = self.kubectl.run_attached(["get", "all", "-n", namespace])?;
            if !output.succeeded {
                tracing::debug!("kubectl get all failed for {}", namespace);
            }
        }
        Ok(())
    }

    pub fn pod_logs(&self, namespace: &str, pod: &str) -> Result<()> {
        self.attached(["logs", "-n", namespace, pod, "--tail=100"])
    }

    pub fn describe(&self, namespace: &str, kind: &str, name: &str) -> Result<()> {
        self.attached(["describe", kind, name, "-n", namespace])
    }

    fn attached<const N: usize>(&self, args: [&str; N]) -> Result<()> {
        let output = self.kubectl.run_attached(args)?;
        if output.succeeded {
            Ok(())
        } else {
            Err(ConsoleError::CommandFailed {
                command: format!("kubectl {}", args.join(" ")),
                stderr: "see output above".to_string(),
            })
        }
    }
}
