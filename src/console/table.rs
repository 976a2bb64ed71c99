use crate::backup::BackupArtifact;
use crate::kube::objects::{GrafanaInstance, Node};
use crate::kube::DeploymentStatus;
use chrono::{DateTime, Utc};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

/// Compact age: minutes under an hour, hours under a day, days otherwise.
pub fn format_age(seconds: i64) -> String {
    let seconds = seconds.max(0) as f64;
    if seconds < 3600.0 {
        format!("{:.0}m", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else {
        format!("{:.1}d", seconds / 86400.0)
    }
}

pub fn print_nodes(nodes: &[Node]) {
    let mut table = table(vec!["NODE", "ROLE", "STATUS", "VERSION"]);
    for node in nodes {
        table.add_row(vec![
            node.metadata.name.clone(),
            node.role().to_string(),
            if node.is_ready() { "Ready" } else { "NotReady" }.to_string(),
            node.status.node_info.kubelet_version.clone(),
        ]);
    }
    println!("{table}");
}

pub fn print_deployment(status: &DeploymentStatus) {
    let mut table = table(vec!["NAME", "READY", "AVAILABLE", "AGE"]);
    table.add_row(vec![
        status.name.clone(),
        format!("{}/{}", status.ready_replicas, status.desired_replicas),
        status.available_replicas.to_string(),
        status
            .age_seconds
            .map(|age| format!("{:.1}h", age as f64 / 3600.0))
            .unwrap_or_else(|| "N/A".to_string()),
    ]);
    println!("{table}");
}

pub fn print_grafana_instances(instances: &[GrafanaInstance], now: DateTime<Utc>) {
    if instances.is_empty() {
        println!("No Grafana instances found");
        return;
    }

    let mut table = table(vec!["NAME", "STATUS", "URL", "AGE"]);
    for instance in instances {
        table.add_row(vec![
            instance.metadata.name.clone(),
            instance.stage().to_string(),
            instance.root_url().unwrap_or("N/A").to_string(),
            instance
                .metadata
                .age_seconds(now)
                .map(format_age)
                .unwrap_or_else(|| "N/A".to_string()),
        ]);
    }
    println!("{table}");
}

pub fn print_backups(backups: &[BackupArtifact]) {
    let mut table = table(vec!["#", "ARCHIVE", "TAKEN"]);
    for (idx, backup) in backups.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            backup.filename.clone(),
            backup
                .timestamp
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
}
