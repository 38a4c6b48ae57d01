//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_companion-cli"))
        .env("COMPANION_HOME", home)
        .env_remove("COMPANION_USER")
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad json from {args:?}: {e}\n{stdout}"))
}

#[test]
fn test_checkin_twice_same_day() {
    let home = tempfile::tempdir().unwrap();
    let args = ["--user", "amy", "--date", "2024-01-01", "checkin", "record", "run"];

    let first = run_json(home.path(), &args);
    assert_eq!(first["outcome"], "recorded");
    assert_eq!(first["state"]["current_streak_length"], 1);
    assert_eq!(first["balance"], 1);

    let second = run_json(home.path(), &args);
    assert_eq!(second["outcome"], "already_done");
    assert_eq!(second["state"]["cumulative_count"], 1);

    let history = run_json(home.path(), &["checkin", "history", "run"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn test_streak_grace_and_break() {
    let home = tempfile::tempdir().unwrap();
    for d in ["2024-01-01", "2024-01-02"] {
        run_json(home.path(), &["--date", d, "checkin", "record", "run"]);
    }

    let next_day = run_json(home.path(), &["--date", "2024-01-03", "checkin", "streak", "run"]);
    assert_eq!(next_day["current_streak_length"], 2);
    assert_eq!(next_day["checked_in_today"], false);

    let too_late = run_json(home.path(), &["--date", "2024-01-04", "checkin", "streak", "run"]);
    assert_eq!(too_late["current_streak_length"], 0);
    assert_eq!(too_late["cumulative_count"], 2);
}

#[test]
fn test_attach_record() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["--date", "2024-01-01", "checkin", "attach", "run", "nothing yet"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    run_json(home.path(), &["--date", "2024-01-01", "checkin", "record", "run"]);
    let record = run_json(
        home.path(),
        &["--date", "2024-01-01", "checkin", "attach", "run", "5k easy", "--image", "run.jpg"],
    );
    assert_eq!(record["record"]["text"], "5k easy");
    assert_eq!(record["record"]["image"], "run.jpg");

    let long = "x".repeat(51);
    let (code, _, _) = run_cli(
        home.path(),
        &["--date", "2024-01-01", "checkin", "attach", "run", long.as_str()],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_points_and_redeem() {
    let home = tempfile::tempdir().unwrap();
    for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
        run_json(home.path(), &["--user", "amy", "--date", d, "checkin", "record", "run"]);
    }

    let balance = run_json(home.path(), &["--user", "amy", "points", "balance"]);
    assert_eq!(balance["balance"], 3);

    let check = run_json(
        home.path(),
        &["--date", "2024-01-03", "reward", "check", "run", "--consecutive", "3"],
    );
    assert_eq!(check["unlocked"], true);

    let redeemed = run_json(
        home.path(),
        &[
            "--user", "amy", "--date", "2024-01-03", "reward", "redeem", "Movie night", "--cost",
            "2", "run", "--consecutive", "3",
        ],
    );
    assert_eq!(redeemed["balance"], 1);

    let (code, _, stderr) = run_cli(
        home.path(),
        &[
            "--user", "amy", "--date", "2024-01-03", "reward", "redeem", "Movie night", "--cost",
            "2", "run", "--consecutive", "3",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let balance = run_json(home.path(), &["--user", "amy", "points", "balance"]);
    assert_eq!(balance["balance"], 1);
}

#[test]
fn test_group_flow() {
    let home = tempfile::tempdir().unwrap();
    let h = home.path();
    let today = "2024-02-01";

    run_json(h, &["group", "create", "early birds"]);
    run_json(h, &["--user", "amy", "group", "join", "early birds", "amy-run"]);
    run_json(h, &["--user", "bo", "group", "join", "early birds", "bo-read"]);

    let reminded = run_json(h, &["--user", "amy", "--date", today, "group", "remind", "early birds", "bo"]);
    assert_eq!(reminded, "reminded");

    let checked = run_json(h, &["--user", "bo", "--date", today, "group", "checkin", "early birds"]);
    assert_eq!(checked["result"]["outcome"], "checked_in");
    assert_eq!(checked["balance"], 1);

    let (code, _, _) = run_cli(h, &["--user", "amy", "--date", today, "group", "remind", "early birds", "bo"]);
    assert_eq!(code, 1);

    let liked = run_json(h, &["--user", "amy", "--date", today, "group", "like", "early birds", "bo"]);
    assert_eq!(liked["outcome"], "liked");
    assert_eq!(liked["likes_today"], 1);

    let shown = run_json(h, &["--date", today, "group", "show", "early birds"]);
    let members = shown["members"].as_array().unwrap();
    let bo = members.iter().find(|m| m["user_id"] == "bo").unwrap();
    assert_eq!(bo["has_checked_in_today"], true);
    assert_eq!(bo["streak"], 1);

    let today_record = run_json(h, &["--date", today, "checkin", "today", "bo-read"]);
    assert_eq!(today_record["likes"][0], "amy");

    let groups = run_json(h, &["group", "list"]);
    assert_eq!(groups[0]["members"], 2);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let h = home.path();

    let (code, stdout, _) = run_cli(h, &["config", "get", "check_in.stars_per_check_in"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1");

    let (code, _, _) = run_cli(h, &["config", "set", "check_in.stars_per_check_in", "5"]);
    assert_eq!(code, 0);
    let first = run_json(h, &["--user", "amy", "--date", "2024-01-01", "checkin", "record", "run"]);
    assert_eq!(first["record"]["stars_earned"], 5);
    assert_eq!(first["balance"], 5);

    let (code, _, _) = run_cli(h, &["config", "set", "encouragement.probability", "2.0"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(h, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_unusable_data_dir_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("occupied");
    std::fs::write(&not_a_dir, "").unwrap();

    let (code, _, stderr) = run_cli(&not_a_dir, &["checkin", "streak", "run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Data directory unavailable"), "{stderr}");
}
