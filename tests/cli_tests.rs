use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn setup_test_env(rc: &str) -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = test_env::home_with_rc(rc);
    (temp_dir, guard)
}

/// Points at a port nothing listens on
fn unreachable_rc() -> String {
    "api.url=http://127.0.0.1:9\napi.timeout=2\n".to_string()
}

fn get_foco_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("foco").unwrap();
    cmd.env("HOME", temp_dir.path())
        .env_remove("FOCO_API_URL")
        .env_remove("FOCO_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_flag() {
    let (temp_dir, _guard) = setup_test_env(&unreachable_rc());
    get_foco_cmd(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    let (temp_dir, _guard) = setup_test_env(&unreachable_rc());
    get_foco_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("sweep"));
}

#[test]
fn test_add_blank_title_is_user_error() {
    let (temp_dir, _guard) = setup_test_env(&unreachable_rc());
    // Validation fails before any connection attempt, so the unreachable
    // service never shows up in the error
    get_foco_cmd(&temp_dir)
        .args(["add", "   "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("Task title cannot be empty"));
}

#[test]
fn test_add_without_title_is_user_error() {
    let (temp_dir, _guard) = setup_test_env(&unreachable_rc());
    get_foco_cmd(&temp_dir)
        .args(["add", "-d", "just a description"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Task title cannot be empty"));
}

#[test]
fn test_invalid_period_is_user_error() {
    let (temp_dir, _guard) = setup_test_env(&unreachable_rc());
    get_foco_cmd(&temp_dir)
        .args(["list", "--period", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Period must be greater than 0"));
}

#[test]
fn test_bad_rollback_placement_is_user_error() {
    let (temp_dir, _guard) = setup_test_env("rollback.placement=sideways\n");
    get_foco_cmd(&temp_dir)
        .arg("list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("rollback.placement"));
}

#[test]
fn test_unreachable_service_is_internal_error() {
    let (temp_dir, _guard) = setup_test_env(&unreachable_rc());
    get_foco_cmd(&temp_dir)
        .args(["list", "--trash"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Internal error:"))
        .stderr(predicate::str::contains("Failed to load trash tasks"));
}

#[test]
fn test_env_overrides_rc_url() {
    let (temp_dir, _guard) = setup_test_env("api.url=not a url\napi.timeout=2\n");
    get_foco_cmd(&temp_dir)
        .env("FOCO_API_URL", "http://127.0.0.1:9")
        .arg("list")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Failed to load active tasks"))
        .stderr(predicate::str::contains("127.0.0.1:9"));
}
