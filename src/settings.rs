use crate::wait::Backoff;
use crate::{ConsoleError, Result};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OPERATOR_CRD_URL: &str =
    "https://raw.githubusercontent.com/grafana/grafana-operator/master/deploy/kustomize/base/crds.yaml";

/// Process-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_dir: PathBuf,

    // Cluster layout
    pub cluster_name: String,
    pub operator_namespace: String,
    pub grafana_namespace: String,
    pub grafana_replicas: u32,

    // Access
    pub grafana_local_port: u16,
    pub admin_user: String,
    pub admin_password: String,

    pub operator_crd_url: String,
    pub backup: BackupSettings,
    pub timeouts: Timeouts,
    pub pacing: Pacing,
    pub backoff: Backoff,
}

#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub pvc: String,
    pub cronjob: String,
    pub secret: String,
    pub scripts_configmap: String,
    pub image: String,
    pub mount_path: String,
    pub job_label: String,
    pub restore_label: String,
    pub ttl_seconds_after_finished: u32,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            pvc: "postgresql-backup-pvc".to_string(),
            cronjob: "postgresql-backup".to_string(),
            secret: "postgresql-secret".to_string(),
            scripts_configmap: "postgresql-backup-scripts".to_string(),
            image: "postgres:16-alpine".to_string(),
            mount_path: "/backups".to_string(),
            job_label: "postgresql-backup".to_string(),
            restore_label: "postgresql-restore".to_string(),
            ttl_seconds_after_finished: 300,
        }
    }
}

/// Upper bounds for external calls and readiness waits.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub command: Duration,
    pub probe: Duration,
    pub cluster_probe: Duration,
    pub cluster_create: Duration,
    pub helm_install: Duration,
    pub operator_ready: Duration,
    pub database_ready: Duration,
    pub inspection_pod: Duration,
    pub backup_job: Duration,
    pub restore_job: Duration,
    pub rollout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(300),
            probe: Duration::from_secs(5),
            cluster_probe: Duration::from_secs(10),
            cluster_create: Duration::from_secs(600),
            helm_install: Duration::from_secs(660),
            operator_ready: Duration::from_secs(300),
            database_ready: Duration::from_secs(60),
            inspection_pod: Duration::from_secs(60),
            backup_job: Duration::from_secs(120),
            restore_job: Duration::from_secs(300),
            rollout: Duration::from_secs(120),
        }
    }
}

/// Fixed settle periods between steps that have no readiness signal to poll.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub after_scale_down: Duration,
    pub before_rollout_check: Duration,
    pub after_database_deploy: Duration,
    pub before_datasources: Duration,
    pub before_istio_gateway: Duration,
    pub before_pvc_check: Duration,
    pub between_reset_steps: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_scale_down: Duration::from_secs(5),
            before_rollout_check: Duration::from_secs(5),
            after_database_deploy: Duration::from_secs(10),
            before_datasources: Duration::from_secs(10),
            before_istio_gateway: Duration::from_secs(5),
            before_pvc_check: Duration::from_secs(5),
            between_reset_steps: Duration::from_secs(3),
        }
    }
}

impl Settings {
    /// Load `<config_dir>/.env` into the environment, then read settings from it.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let env_file = config_dir.join(".env");
        if env_file.exists() {
            dotenv::from_path(&env_file).map_err(|e| {
                ConsoleError::InvalidConfig(format!("{}: {}", env_file.display(), e))
            })?;
            tracing::debug!("Loaded settings file {}", env_file.display());
        }

        Self::from_lookup(config_dir, |key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(config_dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = BackupSettings::default();
        let backup = BackupSettings {
            pvc: text(&lookup, "BACKUP_PVC", &defaults.pvc),
            cronjob: text(&lookup, "BACKUP_CRONJOB", &defaults.cronjob),
            secret: text(&lookup, "POSTGRES_SECRET", &defaults.secret),
            scripts_configmap: text(&lookup, "BACKUP_SCRIPTS_CONFIGMAP", &defaults.scripts_configmap),
            image: text(&lookup, "POSTGRES_IMAGE", &defaults.image),
            ..defaults
        };

        let timeouts = Timeouts {
            command: Duration::from_secs(parsed(&lookup, "COMMAND_TIMEOUT_SECS", 300u64)?),
            ..Timeouts::default()
        };
        if timeouts.command.is_zero() {
            return Err(ConsoleError::InvalidConfig(
                "COMMAND_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            cluster_name: text(&lookup, "CLUSTER_NAME", "grafana-cluster"),
            operator_namespace: text(&lookup, "OPERATOR_NAMESPACE", "grafana-operator"),
            grafana_namespace: text(&lookup, "GRAFANA_NAMESPACE", "grafana-system"),
            grafana_replicas: parsed(&lookup, "GRAFANA_REPLICAS", 2u32)?,
            grafana_local_port: parsed(&lookup, "GRAFANA_LOCAL_PORT", 3030u16)?,
            admin_user: text(&lookup, "GRAFANA_ADMIN_USER", "admin"),
            admin_password: text(&lookup, "GRAFANA_ADMIN_PASSWORD", "Admin@12345"),
            operator_crd_url: text(&lookup, "OPERATOR_CRD_URL", DEFAULT_OPERATOR_CRD_URL),
            backup,
            timeouts,
            pacing: Pacing::default(),
            backoff: Backoff::default(),
        })
    }

    pub fn manifests(&self) -> ManifestCatalog {
        ManifestCatalog::new(self.config_dir.clone())
    }

    pub fn grafana_url(&self) -> String {
        format!("http://localhost:{}", self.grafana_local_port)
    }
}

fn text<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: &str) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw
            .parse()
            .map_err(|e| ConsoleError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        _ => Ok(default),
    }
}

/// Locations of the manifest files applied by the console.
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    root: PathBuf,
}

impl ManifestCatalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn kind_config(&self) -> PathBuf {
        self.root.join("kind-config.yaml")
    }

    pub fn operator_crds(&self) -> PathBuf {
        self.root.join("grafana-operator").join("crds.yaml")
    }

    pub fn operator_namespace(&self) -> PathBuf {
        self.root.join("grafana-operator").join("namespace.yaml")
    }

    pub fn operator_rbac(&self) -> PathBuf {
        self.root.join("grafana-operator").join("rbac.yaml")
    }

    pub fn operator_deployment(&self) -> PathBuf {
        self.root.join("grafana-operator").join("operator-deployment.yaml")
    }

    pub fn postgresql(&self) -> PathBuf {
        self.root.join("database").join("postgresql.yaml")
    }

    pub fn postgresql_backup(&self) -> PathBuf {
        self.root.join("database").join("postgresql-backup.yaml")
    }

    pub fn storage_class(&self) -> PathBuf {
        self.root.join("storage").join("storage-class.yaml")
    }

    pub fn grafana_config(&self) -> PathBuf {
        self.root.join("configmaps").join("grafana-config.yaml")
    }

    pub fn resource_quotas(&self) -> PathBuf {
        self.root.join("configmaps").join("resource-quotas.yaml")
    }

    pub fn grafana_instance(&self) -> PathBuf {
        self.root.join("grafana-instances").join("grafana-instance.yaml")
    }

    pub fn grafana_datasources(&self) -> PathBuf {
        self.root.join("grafana-instances").join("grafana-datasources.yaml")
    }

    pub fn services(&self) -> PathBuf {
        self.root.join("networking").join("services.yaml")
    }

    pub fn network_policies(&self) -> PathBuf {
        self.root.join("networking").join("network-policies.yaml")
    }

    pub fn istio_gateway(&self) -> PathBuf {
        self.root.join("networking").join("istio-gateway.yaml")
    }

    pub fn service_monitors(&self) -> PathBuf {
        self.root.join("monitoring").join("service-monitors.yaml")
    }

    /// Return the path if the manifest is present on disk.
    pub fn require(path: PathBuf) -> Result<PathBuf> {
        if path.exists() {
            Ok(path)
        } else {
            Err(ConsoleError::ManifestMissing(path))
        }
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod settings_tests;
