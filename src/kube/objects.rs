//! Typed views of the `kubectl get -o json` responses the console reads.
//!
//! Only the fields the console looks at are modelled; everything else in the
//! response is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Seconds since creation, if the timestamp is known.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.creation_timestamp
            .map(|created| (now - created).num_seconds().max(0))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

fn has_true_condition(conditions: &[Condition], kind: &str) -> bool {
    conditions.iter().any(|c| c.kind == kind && c.is_true())
}

// Deployments

#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DeploymentSpec,
    #[serde(default)]
    pub status: DeploymentState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentSpec {
    #[serde(default)]
    pub replicas: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentState {
    #[serde(default)]
    pub replicas: u32,
    #[serde(default)]
    pub ready_replicas: u32,
    #[serde(default)]
    pub available_replicas: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Point-in-time replica counts for one deployment. Fetched per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub name: String,
    pub desired_replicas: u32,
    pub ready_replicas: u32,
    pub available_replicas: u32,
    pub age_seconds: Option<i64>,
}

impl DeploymentStatus {
    /// Every desired replica is ready and at least one is desired.
    pub fn is_at_parity(&self) -> bool {
        self.desired_replicas > 0 && self.ready_replicas == self.desired_replicas
    }
}

impl Deployment {
    pub fn snapshot(&self, now: DateTime<Utc>) -> DeploymentStatus {
        DeploymentStatus {
            name: self.metadata.name.clone(),
            desired_replicas: self.spec.replicas.unwrap_or(self.status.replicas),
            ready_replicas: self.status.ready_replicas,
            available_replicas: self.status.available_replicas,
            age_seconds: self.metadata.age_seconds(now),
        }
    }

    pub fn is_available(&self) -> bool {
        has_true_condition(&self.status.conditions, "Available")
    }
}

// Pods

#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: PodState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodState {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Pod {
    pub fn phase(&self) -> &str {
        self.status.phase.as_deref().unwrap_or("Unknown")
    }

    pub fn is_running(&self) -> bool {
        self.phase() == "Running"
    }

    /// Running with every container passing its readiness check.
    pub fn is_ready(&self) -> bool {
        self.is_running() && has_true_condition(&self.status.conditions, "Ready")
    }

    /// The pod ran to an end state (inspection pods).
    pub fn is_finished(&self) -> bool {
        matches!(self.phase(), "Succeeded" | "Failed")
    }
}

// Jobs

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: JobStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Complete,
    Failed,
}

impl Job {
    pub fn state(&self) -> JobState {
        if has_true_condition(&self.status.conditions, "Complete") {
            JobState::Complete
        } else if has_true_condition(&self.status.conditions, "Failed") {
            JobState::Failed
        } else {
            JobState::Pending
        }
    }
}

// Nodes

#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub node_info: NodeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default)]
    pub kubelet_version: String,
}

const CONTROL_PLANE_LABEL: &str = "node-role.kubernetes.io/control-plane";

impl Node {
    pub fn role(&self) -> &'static str {
        if self.metadata.labels.contains_key(CONTROL_PLANE_LABEL) {
            "control-plane"
        } else {
            "worker"
        }
    }

    pub fn is_ready(&self) -> bool {
        has_true_condition(&self.status.conditions, "Ready")
    }
}

// Grafana custom resources

#[derive(Debug, Clone, Deserialize)]
pub struct GrafanaInstance {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(default)]
    pub status: GrafanaStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrafanaStatus {
    #[serde(default)]
    pub stage: Option<String>,
}

impl GrafanaInstance {
    pub fn stage(&self) -> &str {
        self.status.stage.as_deref().unwrap_or("Unknown")
    }

    pub fn root_url(&self) -> Option<&str> {
        self.spec
            .pointer("/config/server/root_url")
            .and_then(|v| v.as_str())
    }
}

// Volumes

#[derive(Debug, Clone, Deserialize)]
pub struct PersistentVolumeClaim {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: PodState,
}

impl PersistentVolumeClaim {
    pub fn is_bound(&self) -> bool {
        self.status.phase.as_deref() == Some("Bound")
    }
}

#[cfg(test)]
#[path = "objects_tests.rs"]
mod objects_tests;
