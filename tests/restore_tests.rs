mod common;

use common::{fail, job, ok, pod, test_settings, Answer, ScriptedPrompter, ScriptedRunner};
use grafana_ops::backup::{BackupOrchestrator, RestoreOutcome};
use grafana_ops::ConsoleError;

const ARCHIVE: &str = "grafana_20250101_120000.sql.gz";

fn restore_runner(job_condition: Option<&str>) -> ScriptedRunner {
    let runner = ScriptedRunner::new();
    runner
        .on("get pod backup-list-", pod("Succeeded"))
        .on(
            "logs -n grafana-system backup-list-",
            ok(format!("{}\ngrafana_20250102_120000.sql.gz\n", ARCHIVE)),
        )
        .on("get job postgresql-restore-", job(job_condition))
        .on("logs -n grafana-system job/postgresql-restore-", ok("restore finished\n"));
    runner
}

fn restore_job_bodies(runner: &ScriptedRunner) -> Vec<serde_json::Value> {
    runner
        .stdin_bodies()
        .iter()
        .filter(|body| body.contains("postgresql-restore-"))
        .map(|body| serde_json::from_str(body).unwrap())
        .collect()
}

#[test]
fn test_successful_restore_scales_back_up_once() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let outcome = orchestrator.restore(&prompter).unwrap();

    match outcome {
        RestoreOutcome::Restored {
            archive,
            job,
            rollout_ready,
        } => {
            assert_eq!(archive, ARCHIVE);
            assert!(job.starts_with("postgresql-restore-"));
            assert!(rollout_ready);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    assert_eq!(runner.count("scale deployment -n grafana-system --all --replicas=0"), 1);
    assert_eq!(runner.count("scale deployment -n grafana-system --all --replicas=2"), 1);
    assert_eq!(runner.count("rollout status deployment -n grafana-system"), 1);

    let scale_down = runner.position("--replicas=0").unwrap();
    let restore_job = runner.position("get job postgresql-restore-").unwrap();
    let scale_up = runner.position("--replicas=2").unwrap();
    assert!(scale_down < restore_job);
    assert!(restore_job < scale_up);
}

#[test]
fn test_no_scale_down_before_confirmation() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(2), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    orchestrator.restore(&prompter).unwrap();

    let confirmed = runner.position("prompt: confirm").unwrap();
    let scale_down = runner.position("--replicas=0").unwrap();
    assert!(confirmed < scale_down);
}

#[test]
fn test_declined_restore_touches_nothing() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(false)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let outcome = orchestrator.restore(&prompter).unwrap();

    assert_eq!(outcome, RestoreOutcome::Cancelled);
    assert_eq!(runner.count("scale deployment"), 0);
    assert!(restore_job_bodies(&runner).is_empty());
}

#[test]
fn test_choosing_zero_cancels() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let prompter = ScriptedPrompter::new(runner.journal(), vec![Answer::Choice(0)]);

    let orchestrator = BackupOrchestrator::new(&runner, &settings);

    assert_eq!(orchestrator.restore(&prompter).unwrap(), RestoreOutcome::Cancelled);
    assert_eq!(runner.count("scale deployment"), 0);
}

#[test]
fn test_empty_volume_reports_no_backups() {
    let (settings, _dir) = test_settings();
    let runner = ScriptedRunner::new();
    runner.on("get pod backup-list-", pod("Succeeded"));
    let prompter = ScriptedPrompter::new(runner.journal(), vec![]);

    let orchestrator = BackupOrchestrator::new(&runner, &settings);

    assert_eq!(orchestrator.restore(&prompter).unwrap(), RestoreOutcome::NoBackups);
    assert!(runner.position("prompt:").is_none());
}

#[test]
fn test_failed_restore_never_scales_up() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Failed"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let err = orchestrator.restore(&prompter).unwrap_err();

    match err {
        ConsoleError::JobFailed { log, .. } => assert_eq!(log, "restore finished\n"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(runner.count("--replicas=0"), 1);
    assert_eq!(runner.count("--replicas=2"), 0);
    assert_eq!(runner.count("rollout status"), 0);
}

#[test]
fn test_timed_out_restore_never_scales_up() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(None);
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let err = orchestrator.restore(&prompter).unwrap_err();

    assert!(matches!(err, ConsoleError::Timeout { .. }));
    assert_eq!(runner.count("--replicas=2"), 0);
    assert!(runner.paused() >= settings.timeouts.restore_job);
}

#[test]
fn test_failed_scale_down_stops_before_restore_job() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    runner.on("--replicas=0", fail("deployments.apps is forbidden"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let err = orchestrator.restore(&prompter).unwrap_err();

    assert!(matches!(err, ConsoleError::ScaleFailed { replicas: 0, .. }));
    assert!(restore_job_bodies(&runner).is_empty());
}

#[test]
fn test_slow_rollout_still_counts_as_restored() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    runner.on("rollout status", fail("timed out waiting for the condition"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let outcome = orchestrator.restore(&prompter).unwrap();

    assert!(matches!(
        outcome,
        RestoreOutcome::Restored {
            rollout_ready: false,
            ..
        }
    ));
    assert_eq!(runner.count("rollout status"), 1);
}

#[test]
fn test_restore_job_passes_archive_as_argument() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    orchestrator.restore(&prompter).unwrap();

    let bodies = restore_job_bodies(&runner);
    assert_eq!(bodies.len(), 1);
    let command = &bodies[0]["spec"]["template"]["spec"]["containers"][0]["command"];
    assert_eq!(command[command.as_array().unwrap().len() - 1], ARCHIVE);
    assert_eq!(bodies[0]["spec"]["ttlSecondsAfterFinished"], 300);
}

#[test]
fn test_interrupt_after_scale_down_leaves_grafana_down() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let runner = runner.cancelling_pauses();
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let err = orchestrator.restore(&prompter).unwrap_err();

    assert!(matches!(err, ConsoleError::Cancelled));
    assert_eq!(runner.count("--replicas=0"), 1);
    assert_eq!(runner.count("--replicas=2"), 0);
    assert!(restore_job_bodies(&runner).is_empty());
}

#[test]
fn test_failed_restore_job_apply_never_scales_up() {
    let (settings, _dir) = test_settings();
    let runner = restore_runner(Some("Complete"));
    let prompter = ScriptedPrompter::new(
        runner.journal(),
        vec![Answer::Choice(1), Answer::Confirm(true)],
    );
    // The listing pod applies first and must succeed
    runner.on_sequence(
        "apply -f -",
        vec![ok(""), fail("admission webhook denied the request")],
    );

    let orchestrator = BackupOrchestrator::new(&runner, &settings);
    let err = orchestrator.restore(&prompter).unwrap_err();

    assert!(matches!(err, ConsoleError::CommandFailed { .. }));
    assert_eq!(runner.count("--replicas=0"), 1);
    assert_eq!(runner.count("--replicas=2"), 0);
}
