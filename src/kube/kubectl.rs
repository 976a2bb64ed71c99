use super::objects::{Deployment, Job, JobState, List, Pod};
use crate::runner::{CommandOutput, CommandRunner, Invocation};
use crate::{ConsoleError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Thin typed wrapper over the `kubectl` binary.
pub struct Kubectl<'a> {
    runner: &'a dyn CommandRunner,
}

fn invocation<I, S>(args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Invocation::new("kubectl").args(args)
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NotFound") || stderr.contains("not found")
}

impl<'a> Kubectl<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &'a dyn CommandRunner {
        self.runner
    }

    /// Run with output captured; a non-zero exit is returned, not raised.
    pub fn run<I, S>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run(&invocation(args))
    }

    pub fn run_with_timeout<I, S>(&self, args: I, timeout: Duration) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run(&invocation(args).timeout(timeout))
    }

    /// Run and require a zero exit. Returns stdout.
    pub fn run_checked<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = invocation(args);
        let output = self.runner.run(&invocation)?.require_success(&invocation)?;
        Ok(output.stdout)
    }

    pub fn run_attached<I, S>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run_attached(&invocation(args))
    }

    pub fn apply_file(&self, path: &Path) -> Result<()> {
        tracing::debug!("Applying {}", path.display());
        let path = path.to_string_lossy();
        self.run_checked(["apply", "-f", &*path])?;
        Ok(())
    }

    pub fn apply_url(&self, url: &str) -> Result<()> {
        self.run_checked(["apply", "-f", url])?;
        Ok(())
    }

    /// Serialize an object and apply it from stdin.
    pub fn apply_manifest<T: Serialize>(&self, manifest: &T) -> Result<()> {
        let body = serde_json::to_string(manifest)?;
        let invocation = invocation(["apply", "-f", "-"]).stdin(body);
        self.runner.run(&invocation)?.require_success(&invocation)?;
        Ok(())
    }

    /// Whether `kubectl get <kind> <name>` succeeds.
    pub fn exists(&self, kind: &str, name: &str, namespace: &str) -> Result<bool> {
        Ok(self.run(["get", kind, name, "-n", namespace])?.succeeded)
    }

    /// `kubectl get ... -o json`, decoded. A missing object is `NotFound`.
    pub fn get_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let invocation = invocation(args.iter().copied().chain(["-o", "json"]));
        let output = self.runner.run(&invocation)?;

        if !output.succeeded && is_not_found(&output.stderr) {
            return Err(ConsoleError::NotFound(args.join(" ")));
        }
        let output = output.require_success(&invocation)?;

        serde_json::from_str(&output.stdout).map_err(|source| ConsoleError::Decode {
            what: invocation.command_line(),
            source,
        })
    }

    pub fn deployment(&self, name: &str, namespace: &str) -> Result<Deployment> {
        self.get_json(&["get", "deployment", name, "-n", namespace])
    }

    pub fn pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
        let list: List<Pod> = self.get_json(&["get", "pods", "-n", namespace, "-l", selector])?;
        Ok(list.items)
    }

    pub fn pod(&self, name: &str, namespace: &str) -> Result<Pod> {
        self.get_json(&["get", "pod", name, "-n", namespace])
    }

    pub fn job_state(&self, name: &str, namespace: &str) -> Result<JobState> {
        let job: Job = self.get_json(&["get", "job", name, "-n", namespace])?;
        Ok(job.state())
    }

    /// Logs of a pod or `job/<name>`. Failure to read them is not an error.
    pub fn logs(&self, target: &str, namespace: &str, tail: Option<u32>) -> Result<String> {
        let mut args = vec!["logs".to_string(), "-n".to_string(), namespace.to_string()];
        args.push(target.to_string());
        if let Some(tail) = tail {
            args.push(format!("--tail={}", tail));
        }

        let output = self.run(args)?;
        if output.succeeded {
            Ok(output.stdout)
        } else {
            tracing::debug!("No logs for {}: {}", target, output.stderr.trim());
            Ok(String::new())
        }
    }

    pub fn delete(&self, kind: &str, name: &str, namespace: &str) -> Result<()> {
        self.run_checked(["delete", kind, name, "-n", namespace])?;
        Ok(())
    }

    /// Delete without caring whether the object still exists. Runs even after an
    /// interrupt so temporary objects are always removed.
    pub fn delete_ignore_missing(&self, kind: &str, name: &str, namespace: &str) -> Result<()> {
        let invocation = invocation([
            "delete",
            kind,
            name,
            "-n",
            namespace,
            "--ignore-not-found=true",
        ])
        .uncancellable();

        let output = self.runner.run(&invocation)?;
        if !output.succeeded {
            tracing::warn!("Failed to delete {} {}: {}", kind, name, output.stderr.trim());
        }
        Ok(())
    }

    /// Scale every deployment in the namespace. The raw output is returned so the
    /// caller decides how a failure is reported.
    pub fn scale_all(&self, namespace: &str, replicas: u32) -> Result<CommandOutput> {
        self.run([
            "scale".to_string(),
            "deployment".to_string(),
            "-n".to_string(),
            namespace.to_string(),
            "--all".to_string(),
            format!("--replicas={}", replicas),
        ])
    }

    /// Block until the namespace's deployments have rolled out or `timeout` passes.
    pub fn rollout_status(&self, namespace: &str, timeout: Duration) -> Result<CommandOutput> {
        let args = [
            "rollout".to_string(),
            "status".to_string(),
            "deployment".to_string(),
            "-n".to_string(),
            namespace.to_string(),
            format!("--timeout={}s", timeout.as_secs()),
        ];
        // Leave headroom over kubectl's own timeout
        self.run_with_timeout(args, timeout + Duration::from_secs(30))
    }

    pub fn rollout_restart(&self, deployment: &str, namespace: &str) -> Result<()> {
        self.run_checked(["rollout", "restart", "deployment", deployment, "-n", namespace])?;
        Ok(())
    }

    pub fn create_job_from_cronjob(&self, job: &str, cronjob: &str, namespace: &str) -> Result<()> {
        let from = format!("--from=cronjob/{}", cronjob);
        self.run_checked(["create", "job", job, from.as_str(), "-n", namespace])?;
        Ok(())
    }
}
