mod common;

use common::{fail, ok, test_settings, ScriptedRunner};
use grafana_ops::cluster::ClusterManager;
use grafana_ops::ConsoleError;

#[test]
fn test_exists_matches_whole_cluster_name() {
    let (settings, _dir) = test_settings();
    let runner = ScriptedRunner::new();
    runner.on("kind get clusters", ok("grafana-cluster-old\nkind\n"));

    let manager = ClusterManager::new(&runner, &settings);

    assert!(!manager.exists().unwrap());

    let runner = ScriptedRunner::new();
    runner.on("kind get clusters", ok("kind\ngrafana-cluster\n"));
    let manager = ClusterManager::new(&runner, &settings);

    assert!(manager.exists().unwrap());
}

#[test]
fn test_info_for_absent_cluster_is_not_found() {
    let (settings, _dir) = test_settings();
    let runner = ScriptedRunner::new();

    let manager = ClusterManager::new(&runner, &settings);
    let err = manager.info().unwrap_err();

    assert!(matches!(err, ConsoleError::NotFound(_)));
    assert_eq!(runner.count("get nodes"), 0);
}

#[test]
fn test_create_requires_kind_config() {
    let (settings, _dir) = test_settings();
    let runner = ScriptedRunner::new();

    let manager = ClusterManager::new(&runner, &settings);
    let err = manager.create().unwrap_err();

    assert!(matches!(err, ConsoleError::ManifestMissing(_)));
    assert_eq!(runner.count("kind create"), 0);
}

#[test]
fn test_reset_stops_at_first_failing_step() {
    let (settings, _dir) = test_settings();
    let runner = ScriptedRunner::new();
    runner
        .on_sequence(
            "kind get clusters",
            vec![ok("grafana-cluster\n"), ok("")],
        )
        .on("docker system prune", fail("Cannot connect to the Docker daemon"));

    let manager = ClusterManager::new(&runner, &settings);
    let err = manager.complete_reset().unwrap_err();

    match err {
        ConsoleError::StepFailed {
            step,
            completed,
            total,
            source,
        } => {
            assert_eq!(step, "Creating fresh cluster");
            assert_eq!(completed, 3);
            assert_eq!(total, 10);
            assert!(matches!(*source, ConsoleError::ManifestMissing(_)));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(runner.count("kind delete cluster --name grafana-cluster"), 1);
    assert_eq!(runner.count("helm"), 0);
}

#[test]
fn test_interrupted_reset_is_not_a_step_failure() {
    let (settings, _dir) = test_settings();
    let runner = ScriptedRunner::new().cancelling_pauses();

    let manager = ClusterManager::new(&runner, &settings);
    let err = manager.complete_reset().unwrap_err();

    assert!(matches!(err, ConsoleError::Cancelled));
    assert_eq!(runner.count("docker"), 0);
}
