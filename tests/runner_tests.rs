//! End-to-end tests for the `Vete` host integration and the `vete` binary.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use vete::store::{retry, JobState, JobStore};
use vete::worker::CommandLauncher;
use vete::{RunConfig, Vete, VeteError};

fn seed(store: &JobStore, jobs: usize) -> vete::Result<()> {
    store.initialize()?;
    for i in 1..=jobs {
        store.enqueue(&i.to_string(), None)?;
    }
    Ok(())
}

fn vete_bin(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vete"));
    cmd.arg("--root").arg(root);
    cmd.env_remove("VETE_WORKER_JOB");
    cmd
}

// ============================================================================
// Vete runner
// ============================================================================

#[test]
fn test_setup_hook_seeds_before_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let summary = Vete::new(RunConfig::new(&root, 2))
        .setup(|store| seed(store, 5))
        .launcher(CommandLauncher::shell("exit 0"))
        .interactive(false)
        .report(false)
        .run()
        .unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 5);
    assert_eq!(JobStore::new(&root).count(JobState::Succeeded).unwrap(), 5);
}

#[test]
fn test_setup_retry_reprocesses_failures() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let first = Vete::new(RunConfig::new(&root, 4))
        .setup(|store| seed(store, 10))
        .launcher(CommandLauncher::shell(
            r#"case "$(basename "$0")" in 3|7) exit 1;; esac"#,
        ))
        .interactive(false)
        .report(false)
        .run()
        .unwrap();
    assert_eq!((first.succeeded, first.failed), (8, 2));

    let second = Vete::new(RunConfig::new(&root, 4))
        .setup(|store| {
            if !retry(store)?.is_requeued() {
                seed(store, 10)?;
            }
            Ok(())
        })
        .launcher(CommandLauncher::shell("exit 0"))
        .interactive(false)
        .report(false)
        .run()
        .unwrap();

    assert_eq!((second.total, second.succeeded, second.failed), (2, 2, 0));
    let store = JobStore::new(&root);
    assert_eq!(store.count(JobState::Succeeded).unwrap(), 10);
    assert_eq!(store.count(JobState::Failed).unwrap(), 0);
}

#[test]
fn test_no_pending_jobs_is_an_empty_run() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let summary = Vete::new(RunConfig::new(&root, 3))
        .setup(|store| store.initialize())
        .perform(|_| Ok(()))
        .interactive(false)
        .run()
        .unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.workers, 3);
}

#[test]
fn test_missing_work_hook_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let result = Vete::new(RunConfig::new(&root, 1))
        .setup(|store| seed(store, 1))
        .interactive(false)
        .run();

    assert!(matches!(result, Err(VeteError::MissingWorkHook)));
}

#[test]
fn test_setup_error_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let result = Vete::new(RunConfig::new(&root, 1))
        .setup(|store| {
            store.initialize()?;
            store.enqueue("../outside", None).map(|_| ())
        })
        .launcher(CommandLauncher::shell("exit 0"))
        .interactive(false)
        .run();

    assert!(matches!(result, Err(VeteError::InvalidJobName(_))));
}

// ============================================================================
// vete binary
// ============================================================================

#[test]
fn test_cli_reset_removes_store_and_dispatches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");
    let store = JobStore::new(&root);
    seed(&store, 3).unwrap();
    let marker = temp_dir.path().join("ran");

    let output = vete_bin(&root)
        .arg("--reset")
        .arg("--")
        .arg("touch")
        .arg(&marker)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(!root.exists());
    assert!(!marker.exists(), "reset must not dispatch any job");
}

#[test]
fn test_cli_seeds_and_runs_command() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let output = vete_bin(&root)
        .args(["-w", "3", "-s", "6", "-o", "json", "--", "sh", "-c", "exit 0"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 6);
    assert_eq!(summary["succeeded"], 6);
    assert_eq!(summary["workers"], 3);
    assert_eq!(JobStore::new(&root).count(JobState::Succeeded).unwrap(), 6);
}

#[test]
fn test_cli_without_command_reexecs_itself_as_worker() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let output = vete_bin(&root)
        .args(["-w", "2", "-s", "4", "-o", "json"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["succeeded"], 4);
    assert_eq!(summary["failed"], 0);
}

#[test]
fn test_cli_retries_failed_jobs_before_seeding() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");
    let store = JobStore::new(&root);
    seed(&store, 3).unwrap();
    store
        .transition("2", JobState::Pending, JobState::Failed)
        .unwrap();
    store
        .transition("1", JobState::Pending, JobState::Succeeded)
        .unwrap();
    store
        .transition("3", JobState::Pending, JobState::Succeeded)
        .unwrap();

    let output = vete_bin(&root)
        .args(["-s", "50", "-o", "json", "--", "true"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 1, "only the failed job should be retried");
    assert_eq!(store.count(JobState::Succeeded).unwrap(), 3);
}

#[test]
fn test_cli_table_output_prints_report() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let output = vete_bin(&root)
        .args(["-s", "5", "--", "true"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("for 5 jobs by 1 workers"), "{stdout}");
}

#[test]
fn test_cli_rejects_invalid_delay() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    for (mode, message) in [
        ("soon", "invalid delay mode 'soon'"),
        ("0", "invalid delay time (0 secs)"),
    ] {
        let output = vete_bin(&root).args(["-d", mode]).output().unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(message), "{stderr}");
    }
    assert!(!root.exists());
}

#[test]
fn test_cli_rejects_zero_workers() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join(".vete");

    let output = vete_bin(&root).args(["-w", "0"]).output().unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_cli_version() {
    for flag in ["-v", "-V", "--version"] {
        let output = Command::new(env!("CARGO_BIN_EXE_vete"))
            .arg(flag)
            .output()
            .unwrap();

        assert!(output.status.success(), "{flag} should succeed");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), format!("vete {}", env!("CARGO_PKG_VERSION")));
    }
}
