//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("preschool-observations").unwrap();
        cmd.env_remove("DATABASE_URL")
            .env_remove("CHART_DIR")
            .arg("--database-url")
            .arg(format!("sqlite://{}", self.dir.path().join("obs.db").display()))
            .arg("--chart-dir")
            .arg(self.dir.path().join("charts"));
        cmd
    }

    fn record_worst_except_first(&self, student: &str) {
        let worst = [
            "q2=Never waits",
            "q3=Cannot regulate",
            "q4=Never shares",
            "q5=Never respects",
            "q6=Cannot focus",
            "q7=Does not participate",
            "q8=Never asks",
            "q9=Not independent",
            "q10=Does not try",
        ];
        let mut cmd = self.cmd();
        cmd.arg("record").arg("--student").arg(student);
        for answer in worst {
            cmd.arg("--answer").arg(answer);
        }
        cmd.assert()
            .success()
            .stdout(predicate::str::contains(format!("Observation for {student} saved")))
            .stdout(predicate::str::contains("Instructions   100%"))
            .stdout(predicate::str::contains("Turns           20%"));
    }
}

#[test]
fn questions_lists_catalog() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("questions")
        .assert()
        .success()
        .stdout(predicate::str::contains("q1_instructions (Instructions)"))
        .stdout(predicate::str::contains("5 = Immediately"))
        .stdout(predicate::str::contains("1 = Does not try"));
}

#[test]
fn class_view_without_data() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("class")
        .assert()
        .success()
        .stdout(predicate::str::contains("No observations yet"));
}

#[test]
fn record_rejects_blank_student() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["record", "--student", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("please enter a student name"));
    ws.cmd()
        .arg("students")
        .assert()
        .success()
        .stdout(predicate::str::contains("No observations yet"));
}

#[test]
fn record_rejects_label_from_another_question() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["record", "--student", "Rohan", "--answer", "q2=Immediately"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Immediately' is not an answer for q2_turns"));
}

#[test]
fn record_writes_charts() {
    let ws = Workspace::new();
    ws.record_worst_except_first("Rohan Sharma");

    let charts = ws.dir.path().join("charts");
    assert!(charts.join("rohan-sharma-1-radar.svg").exists());
    assert!(charts.join("rohan-sharma-1-bar.svg").exists());
}

#[test]
fn record_edit_delete_cycle() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["record", "--student", "Aanya"])
        .assert()
        .success();
    ws.cmd()
        .args(["record", "--student", "Aanya", "--answer", "q6=Cannot focus"])
        .assert()
        .success();

    ws.cmd()
        .args(["history", "--student", "Aanya"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(ID: 1)"))
        .stdout(predicate::str::contains("(ID: 2)"));

    ws.cmd()
        .args(["edit", "--id", "2", "--answer", "q6_focus=Highly focused"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Record ID 2 updated."))
        .stdout(predicate::str::contains("Focus          100%"));

    ws.cmd()
        .args(["delete", "--id", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Record ID 1 for Aanya deleted."))
        .stdout(predicate::str::contains("(ID: 2)"));

    ws.cmd()
        .args(["delete", "--id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("observation 1 not found"));

    ws.cmd()
        .args(["edit", "--id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("observation 1 not found"));
}

#[test]
fn class_average_of_best_and_worst() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["record", "--student", "Kabir"])
        .assert()
        .success();
    ws.record_worst_except_first("Kabir");

    ws.cmd()
        .arg("class")
        .assert()
        .success()
        .stdout(predicate::str::contains("across 2 observations from 1 students"))
        .stdout(predicate::str::contains("Turns           60%"));

    assert!(ws.dir.path().join("charts/class-radar.svg").exists());
}

#[test]
fn class_view_as_json() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["record", "--student", "Meera"])
        .assert()
        .success();

    ws.cmd()
        .args(["class", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"observation_count\": 1"))
        .stdout(predicate::str::contains("\"unrecognized\": 0"))
        .stdout(predicate::str::contains("\"student_name\": \"Meera\""));
}

#[test]
fn seed_then_report() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 observations"));

    ws.cmd()
        .arg("students")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rohan Sharma"))
        .stdout(predicate::str::contains("Kabir Mehta"));

    let out = ws.dir.path().join("report.md");
    ws.cmd()
        .arg("report")
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let report = std::fs::read_to_string(&out).unwrap();
    assert!(report.contains("4 observations across 3 students"));

    let html = ws.dir.path().join("report.html");
    ws.cmd()
        .args(["report", "--format", "html", "--out"])
        .arg(&html)
        .assert()
        .success();
    assert!(std::fs::read_to_string(&html).unwrap().contains("<svg"));
}

#[test]
fn export_and_import_csv() {
    let source = Workspace::new();
    source.cmd().arg("seed").assert().success();
    let csv = source.dir.path().join("observations.csv");
    source
        .cmd()
        .arg("export")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 observations"));

    let target = Workspace::new();
    target
        .cmd()
        .arg("import")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted 4 observations"));
}
