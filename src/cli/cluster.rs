use super::{choose, Session};
use crate::cluster::ClusterManager;
use crate::console;
use anyhow::Result;

pub fn menu(session: &Session) -> Result<()> {
    let manager = ClusterManager::new(session.runner, session.settings);
    let cluster = &session.settings.cluster_name;

    loop {
        let choice = choose(
            session,
            "Cluster Management",
            &[
                "Create Cluster",
                "Delete Cluster",
                "Get Cluster Info",
                "Export Kubeconfig",
                "Complete Reset (Destroy & Rebuild)",
            ],
        )?;

        match choice {
            0 => return Ok(()),
            1 => session.perform("Create cluster", || manager.create())?,
            2 => {
                let prompt = format!("Are you sure you want to delete cluster '{}'?", cluster);
                if session.confirm(&prompt)? {
                    session.perform("Delete cluster", || manager.delete())?;
                }
            }
            3 => session.perform("Cluster info", || manager.info())?,
            4 => session.perform("Export kubeconfig", || manager.export_kubeconfig())?,
            5 => reset(session, &manager)?,
            _ => {}
        }
    }
}

fn reset(session: &Session, manager: &ClusterManager) -> Result<()> {
    console::heading("COMPLETE RESET - This will destroy EVERYTHING and rebuild from scratch!");
    println!("This will:");
    println!("  - Delete the entire Kind cluster");
    println!("  - Remove all Grafana instances, data and backups");
    println!("  - Clean up Docker resources");
    println!("  - Rebuild the cluster and redeploy the whole stack");
    println!("\nTHIS CANNOT BE UNDONE!");

    if !session.confirm("Are you ABSOLUTELY sure?")? {
        console::warn("Reset cancelled");
        return Ok(());
    }

    session.perform("Complete reset", || manager.complete_reset().map(|_| ()))
}
