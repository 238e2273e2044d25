use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Binary isolated from the user's config directory and working tree
fn dox(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("dox");
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path());
    cmd
}

#[test]
fn version_flag_prints_package_version() {
    let dir = tempfile::tempdir().unwrap();
    dox(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    dox(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("info")
                .and(predicate::str::contains("layout"))
                .and(predicate::str::contains("render"))
                .and(predicate::str::contains("page-at"))
                .and(predicate::str::contains("text"))
                .and(predicate::str::contains("links")),
        );
}

#[test]
fn missing_file_fails_with_open_error() {
    let dir = tempfile::tempdir().unwrap();
    dox(&dir)
        .args(["info", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open does-not-exist.pdf"));
}

#[test]
fn page_at_requires_window_bounds() {
    let dir = tempfile::tempdir().unwrap();
    dox(&dir)
        .args(["page-at", "doc.pdf", "--top", "0.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bottom"));
}

#[test]
fn run_writes_log_file_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    dox(&dir)
        .args(["--log-level", "debug", "info", "missing.pdf"])
        .assert()
        .failure();

    let log = std::fs::read_to_string(dir.path().join("dox.log")).unwrap();
    assert!(log.contains("Starting dox"));
}

#[test]
#[cfg(target_os = "linux")]
fn first_run_writes_default_config() {
    let dir = tempfile::tempdir().unwrap();
    dox(&dir).args(["info", "missing.pdf"]).assert().failure();

    let config = std::fs::read_to_string(dir.path().join("dox").join("config.yaml")).unwrap();
    assert!(config.contains("max_password_attempts: 20"));
}

#[test]
#[cfg(target_os = "linux")]
fn malformed_config_is_logged_and_defaults_kept() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("dox");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.yaml"), "max_password_attempts: [oops\n").unwrap();

    dox(&dir).args(["info", "missing.pdf"]).assert().failure();

    let log = std::fs::read_to_string(dir.path().join("dox.log")).unwrap();
    assert!(log.contains("Failed to parse settings file"));
    assert!(log.contains("Starting dox"));
}
