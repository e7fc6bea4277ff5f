use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn script(home: &TempDir, input: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("billsync_cli")
        .unwrap()
        .env("BILLSYNC_HOME", home.path())
        .env("BILLSYNC_CLI_SCRIPT", "1")
        .env("RUST_LOG", "off")
        .write_stdin(input.to_string())
        .assert()
}

#[test]
fn script_mode_reconciles_and_saves() {
    let home = TempDir::new().unwrap();
    let input = "\
# monthly streaming bill
load household
add-bill Netflix 15.49 2024-01-05 monthly netflix
add-txn 2024-02-06 -15.49 NETFLIX.COM t1
reconcile 2024-02
bills 2024-02
save
exit
";
    script(&home, input)
        .success()
        .stdout(contains("Matched 1 transaction(s)."))
        .stdout(contains("t1 -> netflix (2024-02-05) score 107"))
        .stdout(contains("paid 2024-02-06 -15.49"));

    let saved = std::fs::read_to_string(home.path().join("ledgers/household.json")).unwrap();
    assert!(saved.contains("\"matchedToBillId\": \"netflix\""));
    assert!(saved.contains("\"occurrenceDate\": \"2024-02-05\""));
}

#[test]
fn script_mode_reports_amount_mismatch_and_continues() {
    let home = TempDir::new().unwrap();
    let input = "\
load utilities
add-bill Electric 50 2024-01-10 monthly electric
add-txn 2024-02-11 -52 \"CITY POWER\" t1
match t1 electric 2024-02-10 1
match t1 electric 2024-02-10
list all
";
    script(&home, input)
        .success()
        .stdout(contains("Amount mismatch"))
        .stdout(contains("Linked t1 to electric for 2024-02-10."))
        .stdout(contains("-> electric"));
}

#[test]
fn unknown_commands_get_suggestions() {
    let home = TempDir::new().unwrap();
    script(&home, "reconcil 2024-02\nsetings\n")
        .success()
        .stdout(contains("Unknown command `reconcil`"))
        .stdout(contains("Suggestion: `reconcile`?"))
        .stdout(contains("Suggestion: `settings`?"));
}

#[test]
fn settings_persist_between_runs() {
    let home = TempDir::new().unwrap();
    script(&home, "set minimum-score 75\nset manual-match-tolerance 2.5\n")
        .success()
        .stdout(contains("minimum-score = 75"));

    script(&home, "settings\n")
        .success()
        .stdout(contains("minimum-score             75"))
        .stdout(contains("manual-match-tolerance    2.50"))
        .stdout(contains("ERROR").not());
}
