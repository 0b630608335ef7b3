use std::collections::HashSet;

use codefluent::{Config, Orchestrator};
use tokio::task::JoinSet;

use super::{fixture_submission, shell_runner, wait_until_empty};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identical_submissions_run_in_distinct_workspaces() {
    let root = tempfile::tempdir().unwrap();
    let mut config = Config::empty();
    config.workspace_root = root.path().to_path_buf();

    // Each run writes a marker into its own workspace and fails if it finds
    // one already there, then reports the workspace path.
    let runner = shell_runner(
        r#"cd "$1" || exit 1
test -e claimed && { echo shared; exit 1; }
touch claimed
printf 'CF_OK %s' "$1""#,
    );
    let orchestrator = Orchestrator::from_config(&config, &runner);

    let mut runs = JoinSet::new();
    for _ in 0..12 {
        let orchestrator = orchestrator.clone();
        runs.spawn(async move {
            orchestrator
                .run_files(fixture_submission("stack_in_python"))
                .await
        });
    }

    let mut workspaces = HashSet::new();
    while let Some(joined) = runs.join_next().await {
        let verdict = joined.unwrap().unwrap();
        assert!(verdict.did_pass(), "unexpected output: {}", verdict.stdout());
        workspaces.insert(verdict.stdout().to_string());
    }

    assert_eq!(workspaces.len(), 12);
    assert!(wait_until_empty(root.path()).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_results_independent_of_interleaving() {
    let root = tempfile::tempdir().unwrap();
    let mut config = Config::empty();
    config.workspace_root = root.path().to_path_buf();

    // Passes only for submissions that contain pass.txt
    let runner = shell_runner(r#"test -f "$1/pass.txt" && echo CF_OK || echo FAIL"#);
    let orchestrator = Orchestrator::from_config(&config, &runner);

    let mut runs = JoinSet::new();
    for i in 0..10 {
        let orchestrator = orchestrator.clone();
        let name = if i % 2 == 0 { "pass.txt" } else { "fail.txt" };
        runs.spawn(async move {
            let verdict = orchestrator
                .run_files(vec![codefluent::SubmissionFile::new(name, "")])
                .await
                .unwrap();
            (i, verdict.did_pass())
        });
    }

    while let Some(joined) = runs.join_next().await {
        let (i, did_pass) = joined.unwrap();
        assert_eq!(did_pass, i % 2 == 0, "submission {i}");
    }
}
