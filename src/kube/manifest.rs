use crate::settings::Settings;
use serde::Serialize;
use std::collections::BTreeMap;

const BACKUP_VOLUME: &str = "backup-storage";
const SCRIPTS_VOLUME: &str = "scripts";
const SCRIPTS_MOUNT: &str = "/scripts";
const SCRIPTS_MODE: u32 = 0o755;

/// A Kubernetes object emitted by the console, serialized to JSON and piped to
/// `kubectl apply -f -`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest<S> {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: Metadata,
    pub spec: S,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub restart_policy: &'static str,
    pub containers: Vec<Container>,
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    pub value_from: EnvSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvSource {
    pub secret_key_ref: SecretKeyRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretKeyRef {
    pub name: String,
    pub key: String,
}

impl EnvVar {
    /// Variable read from a key of the same name in `secret`.
    pub fn from_secret(secret: &str, key: &str) -> Self {
        Self {
            name: key.to_string(),
            value_from: EnvSource {
                secret_key_ref: SecretKeyRef {
                    name: secret.to_string(),
                    key: key.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeSource {
    PersistentVolumeClaim {
        #[serde(rename = "claimName")]
        claim_name: String,
    },
    ConfigMap {
        name: String,
        #[serde(rename = "defaultMode")]
        default_mode: u32,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub ttl_seconds_after_finished: u32,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, Serialize)]
pub struct PodTemplate {
    pub metadata: Metadata,
    pub spec: PodSpec,
}

fn backup_volume(settings: &Settings) -> (Volume, VolumeMount) {
    (
        Volume {
            name: BACKUP_VOLUME.to_string(),
            source: VolumeSource::PersistentVolumeClaim {
                claim_name: settings.backup.pvc.clone(),
            },
        },
        VolumeMount {
            name: BACKUP_VOLUME.to_string(),
            mount_path: settings.backup.mount_path.clone(),
        },
    )
}

/// Short-lived pod that prints the archive names on the backup volume, one per line.
pub fn inspection_pod(name: &str, settings: &Settings) -> Manifest<PodSpec> {
    let (volume, mount) = backup_volume(settings);
    let script = format!(
        "for f in {}/*.sql.gz; do [ -e \"$f\" ] && basename \"$f\"; done; true",
        settings.backup.mount_path
    );

    Manifest {
        api_version: "v1",
        kind: "Pod",
        metadata: Metadata {
            name: Some(name.to_string()),
            namespace: Some(settings.grafana_namespace.clone()),
            ..Metadata::default()
        },
        spec: PodSpec {
            restart_policy: "Never",
            containers: vec![Container {
                name: "list".to_string(),
                image: settings.backup.image.clone(),
                command: vec!["sh".to_string(), "-c".to_string(), script],
                env: Vec::new(),
                volume_mounts: vec![mount],
            }],
            volumes: vec![volume],
        },
    }
}

/// One-shot job restoring `archive` through the restore script mounted from the
/// scripts config map. Database credentials come from the secret by reference.
pub fn restore_job(name: &str, archive: &str, settings: &Settings) -> Manifest<JobSpec> {
    let backup = &settings.backup;
    let (volume, mount) = backup_volume(settings);

    let env = ["POSTGRES_DB", "POSTGRES_USER", "POSTGRES_PASSWORD"]
        .iter()
        .map(|key| EnvVar::from_secret(&backup.secret, key))
        .collect();

    let labels = BTreeMap::from([("app".to_string(), backup.restore_label.clone())]);

    Manifest {
        api_version: "batch/v1",
        kind: "Job",
        metadata: Metadata {
            name: Some(name.to_string()),
            namespace: Some(settings.grafana_namespace.clone()),
            ..Metadata::default()
        },
        spec: JobSpec {
            ttl_seconds_after_finished: backup.ttl_seconds_after_finished,
            template: PodTemplate {
                metadata: Metadata {
                    labels,
                    ..Metadata::default()
                },
                spec: PodSpec {
                    restart_policy: "Never",
                    containers: vec![Container {
                        name: "restore".to_string(),
                        image: backup.image.clone(),
                        command: vec![
                            "/bin/bash".to_string(),
                            format!("{}/restore.sh", SCRIPTS_MOUNT),
                            archive.to_string(),
                        ],
                        env,
                        volume_mounts: vec![
                            mount,
                            VolumeMount {
                                name: SCRIPTS_VOLUME.to_string(),
                                mount_path: SCRIPTS_MOUNT.to_string(),
                            },
                        ],
                    }],
                    volumes: vec![
                        volume,
                        Volume {
                            name: SCRIPTS_VOLUME.to_string(),
                            source: VolumeSource::ConfigMap {
                                name: backup.scripts_configmap.clone(),
                                default_mode: SCRIPTS_MODE,
                            },
                        },
                    ],
                },
            },
        },
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod manifest_tests;
