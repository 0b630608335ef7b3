use codefluent::{Config, ConfigError, Submission};

use super::{FIXTURES_PATH, fixture_submission};

#[test]
fn test_load_valid_config() {
    let path = format!("{FIXTURES_PATH}/configs/valid_full.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    assert!(config.runners.contains_key("python"));
    assert!(config.runners.contains_key("clojure"));
    assert_eq!(config.sentinel, "CF_OK");
    assert_eq!(
        config.workspace_root,
        std::path::PathBuf::from("/var/tmp/codefluent-tests")
    );
}

#[test]
fn test_load_minimal_config() {
    let path = format!("{FIXTURES_PATH}/configs/valid_minimal.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    assert!(config.runners.contains_key("test"));
    assert!(config.default_runner.is_none());
}

#[test]
fn test_load_invalid_empty_name() {
    let path = format!("{FIXTURES_PATH}/configs/invalid_empty_name.toml");
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_load_invalid_unknown_default() {
    let path = format!("{FIXTURES_PATH}/configs/invalid_unknown_default.toml");
    assert!(matches!(
        Config::from_file(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let path = format!("{FIXTURES_PATH}/configs/does_not_exist.toml");
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_runner_file_selects_profile() {
    let path = format!("{FIXTURES_PATH}/configs/valid_full.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    let clojure = Submission::new(fixture_submission("factorial_clojure")).unwrap();
    assert_eq!(
        config.runner_for(&clojure).unwrap().name,
        "Clojure (clojure.test)"
    );

    let python = Submission::new(fixture_submission("stack_in_python")).unwrap();
    assert_eq!(
        config.runner_for(&python).unwrap().name,
        "Python 3 (unittest)"
    );
}
