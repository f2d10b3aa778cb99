use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn taskcal(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("taskcal").expect("binary builds");
    cmd.current_dir(dir.path());
    cmd.env("TASKCAL_DATABASE_PATH", dir.path().join("taskcal.db"));
    cmd
}

#[test]
fn adds_and_lists_a_task() {
    let dir = TempDir::new().unwrap();
    taskcal(&dir)
        .args(["add", "Pay rent", "--start", "2024-01-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pay rent"));

    taskcal(&dir)
        .args(["view", "--view", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pay rent"));
}

#[test]
fn recurring_series_shows_up_on_the_month_grid() {
    let dir = TempDir::new().unwrap();
    taskcal(&dir)
        .args([
            "add",
            "Weekly sync",
            "--start",
            "2024-01-01 09:00",
            "--every",
            "weekly",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("series"));

    taskcal(&dir)
        .args(["view", "--view", "month", "--on", "2024-01-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly sync"));
}

#[test]
fn preview_prints_upcoming_dates_without_a_database() {
    let dir = TempDir::new().unwrap();
    taskcal(&dir)
        .args([
            "preview",
            "--start",
            "2024-01-01",
            "--every",
            "weekly",
            "--count",
            "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-15"));
    assert!(!dir.path().join("taskcal.db").exists());
}

#[test]
fn rejects_malformed_dates() {
    let dir = TempDir::new().unwrap();
    taskcal(&dir)
        .args(["add", "Fuzzy", "--start", "next tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn force_delete_skips_the_prompt() {
    let dir = TempDir::new().unwrap();
    let output = taskcal(&dir)
        .args(["add", "Throwaway", "--start", "2024-02-01"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let id = stdout
        .rsplit_once("Id: ")
        .map(|(_, id)| id.trim().to_string())
        .expect("add prints the new id");

    taskcal(&dir)
        .args(["delete", &id, "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1"));
}
