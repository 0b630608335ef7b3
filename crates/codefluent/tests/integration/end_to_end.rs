use codefluent::{
    Config, Orchestrator, Stage, SubmissionError, SubmissionFile, ValidationError,
};

use super::{fixture_submission, shell_runner, wait_until_empty};

fn config_for(root: &std::path::Path) -> Config {
    let mut config = Config::empty();
    config.workspace_root = root.to_path_buf();
    config
}

#[tokio::test]
async fn test_passing_clojure_submission() {
    let root = tempfile::tempdir().unwrap();
    let runner = shell_runner(
        r#"cd "$1" && test -f code.clj && test -f unittests.clj && printf '...CF_OK...'"#,
    );
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &runner);

    let verdict = orchestrator
        .run_files(fixture_submission("factorial_clojure"))
        .await
        .expect("submission should run");

    assert!(verdict.did_pass());
    assert_eq!(verdict.stdout(), "...CF_OK...");
    assert_eq!(verdict.stderr(), "");
    assert!(wait_until_empty(root.path()).await);
}

#[tokio::test]
async fn test_failing_submission_is_a_verdict() {
    let root = tempfile::tempdir().unwrap();
    let runner = shell_runner("echo 'FAILED (failures=1)'; echo 'AssertionError' >&2; exit 1");
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &runner);

    let verdict = orchestrator
        .run_files(fixture_submission("stack_in_python"))
        .await
        .expect("a failing runner is not an error");

    assert!(!verdict.did_pass());
    assert_eq!(verdict.stdout(), "FAILED (failures=1)\n");
    assert_eq!(verdict.stderr(), "AssertionError\n");
}

#[tokio::test]
async fn test_sentinel_with_stderr_and_nonzero_exit_passes() {
    let root = tempfile::tempdir().unwrap();
    let runner = shell_runner("echo CF_OK; echo 'deprecation warning' >&2; exit 4");
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &runner);

    let verdict = orchestrator
        .run_files(fixture_submission("stack_in_python"))
        .await
        .unwrap();

    assert!(verdict.did_pass());
    assert_eq!(verdict.stderr(), "deprecation warning\n");
}

#[tokio::test]
async fn test_runner_sees_file_contents() {
    let root = tempfile::tempdir().unwrap();
    let runner = shell_runner(r#"cat "$1/lib/helper.rb""#);
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &runner);

    let verdict = orchestrator
        .run_files(vec![
            SubmissionFile::new("code.rb", "require_relative 'lib/helper'"),
            SubmissionFile::new("lib/helper.rb", "puts 'CF_OK'"),
        ])
        .await
        .unwrap();

    assert_eq!(verdict.stdout(), "puts 'CF_OK'");
    // The sentinel check is a plain substring search, so echoed source passes
    assert!(verdict.did_pass());
}

#[tokio::test]
async fn test_configured_sentinel() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(root.path());
    config.sentinel = "ALL_TESTS_PASSED".to_string();
    let runner = shell_runner("echo CF_OK");
    let orchestrator = Orchestrator::from_config(&config, &runner);

    let verdict = orchestrator
        .run_files(fixture_submission("stack_in_python"))
        .await
        .unwrap();
    assert!(!verdict.did_pass());
}

#[tokio::test]
async fn test_empty_submission_rejected() {
    let root = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &shell_runner("echo CF_OK"));

    let err = orchestrator.run_files(Vec::new()).await.unwrap_err();
    assert!(matches!(
        err,
        SubmissionError::Validation(ValidationError::EmptySubmission)
    ));
}

#[tokio::test]
async fn test_traversal_rejected_and_runner_not_started() {
    let root = tempfile::tempdir().unwrap();
    let marker = root.path().join("runner-started");
    let runner = shell_runner(&format!("touch '{}'", marker.display()));
    let workspaces = root.path().join("workspaces");
    let orchestrator = Orchestrator::from_config(&config_for(&workspaces), &runner);

    let err = orchestrator
        .run_files(vec![
            SubmissionFile::new("code.py", "def f(): pass"),
            SubmissionFile::new("../unittests.py", "import unittest"),
        ])
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Validate);
    assert!(!marker.exists());
    assert!(!workspaces.exists());
}

#[tokio::test]
async fn test_partial_write_does_not_start_runner() {
    let root = tempfile::tempdir().unwrap();
    let marker = root.path().join("runner-started");
    let runner = shell_runner(&format!("touch '{}'", marker.display()));
    let workspaces = root.path().join("workspaces");
    let orchestrator = Orchestrator::from_config(&config_for(&workspaces), &runner);

    let too_long = format!("{}.py", "x".repeat(300));
    let err = orchestrator
        .run_files(vec![
            SubmissionFile::new("code.py", "def f(): pass"),
            SubmissionFile::new("unittests.py", "import unittest"),
            SubmissionFile::new(too_long.clone(), "pass"),
        ])
        .await
        .unwrap_err();

    match err {
        SubmissionError::PartialWrite { failed } => assert_eq!(failed, vec![too_long]),
        other => panic!("expected PartialWrite, got {other:?}"),
    }
    assert!(!marker.exists());
    assert!(wait_until_empty(&workspaces).await);
}

#[tokio::test]
async fn test_missing_runner_binary_is_launch_error() {
    let root = tempfile::tempdir().unwrap();
    let runner = codefluent::RunnerProfile::new(
        "missing",
        vec!["/nonexistent/bin/codefluent-runner".to_string()],
    );
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &runner);

    let err = orchestrator
        .run_files(fixture_submission("stack_in_python"))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Launch(_)));
    assert_eq!(err.stage(), Stage::Execute);
    assert!(wait_until_empty(root.path()).await);
}

#[tokio::test]
async fn test_kept_workspace_holds_submission() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_for(root.path());
    config.keep_workspaces = true;
    let runner = shell_runner(r#"printf '%s' "$1""#);
    let orchestrator = Orchestrator::from_config(&config, &runner);

    let verdict = orchestrator
        .run_files(fixture_submission("factorial_clojure"))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let workspace = std::path::PathBuf::from(verdict.stdout());
    assert!(workspace.starts_with(root.path()));
    assert!(workspace.join("code.clj").is_file());
    assert!(workspace.join("unittests.clj").is_file());
    assert!(workspace.join("Runner").is_file());
}

#[tokio::test]
async fn test_failing_run_cleanup_drains_before_exit() {
    let root = tempfile::tempdir().unwrap();
    let runner = shell_runner("echo FAIL; exit 1");
    let orchestrator = Orchestrator::from_config(&config_for(root.path()), &runner);

    let verdict = orchestrator
        .run_files(fixture_submission("stack_in_python"))
        .await
        .unwrap();
    assert!(!verdict.did_pass());

    orchestrator.wait_for_cleanup().await;
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
