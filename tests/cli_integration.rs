/// Integration tests for the chemviz binary
///
/// Each test gets its own database and config file in a temporary
/// directory, so nothing touches the user's real data directory.
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "report_dir = \"reports\"\n").unwrap();
        Self { dir }
    }

    // Helper to run chemviz against this sandbox's database
    fn run(&self, owner: &str, args: &[&str]) -> Output {
        let db = self.dir.path().join("chemviz.db");
        let config = self.dir.path().join("config.toml");
        Command::new(env!("CARGO_BIN_EXE_chemviz"))
            .arg("--db")
            .arg(&db)
            .arg("--config")
            .arg(&config)
            .args(["--owner", owner, "--no-color"])
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("CHEMVIZ_DB")
            .env_remove("CHEMVIZ_OWNER")
            .output()
            .unwrap_or_else(|e| panic!("Failed to run chemviz {}: {}", args.join(" "), e))
    }

    fn upload(&self, owner: &str, fixture: &str) -> i64 {
        let path = fixtures_dir().join(fixture);
        let output = self.run(owner, &["upload", path.to_str().unwrap()]);
        assert_success(&output, "upload");
        let ids = list_ids(&self.run(owner, &["list", "--json"]));
        ids[0]
    }
}

// Helper to assert the command succeeded
fn assert_success(output: &Output, context: &str) {
    assert!(
        output.status.success(),
        "{} failed with status: {:?}\nstderr: {}",
        context,
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn list_ids(output: &Output) -> Vec<i64> {
    assert_success(output, "list --json");
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    value.as_array().unwrap().iter().map(|item| item["id"].as_i64().unwrap()).collect()
}

#[test]
fn test_upload_prints_summary() {
    let sandbox = Sandbox::new();
    let path = fixtures_dir().join("reference.csv");
    let output = sandbox.run("alice", &["upload", path.to_str().unwrap()]);
    assert_success(&output, "upload");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total Equipment Count"));
    assert!(stdout.contains("10.33"));

    // distribution rows sit in their own table below the metrics
    let lines: Vec<&str> = stdout.lines().collect();
    let metrics_end = lines.iter().position(|l| l.starts_with('└')).unwrap();
    let type_header = lines.iter().position(|l| l.contains("Equipment Type")).unwrap();
    let pump_row = lines.iter().position(|l| l.contains("Pump")).unwrap();
    assert!(metrics_end < type_header && type_header < pump_row);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Stored dataset"));
}

#[test]
fn test_show_json_and_text() {
    let sandbox = Sandbox::new();
    let id = sandbox.upload("alice", "reference.csv");

    let output = sandbox.run("alice", &["show", &id.to_string(), "--json"]);
    assert_success(&output, "show --json");
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["summary"]["total_count"], 3);
    assert_eq!(value["records"].as_array().unwrap().len(), 3);

    let output = sandbox.run("alice", &["show", &id.to_string()]);
    assert_success(&output, "show");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Chemical Equipment Parameter Report"));
    assert!(text.contains("Equipment Type Distribution"));
}

#[test]
fn test_report_writes_pdf_to_report_dir() {
    let sandbox = Sandbox::new();
    let id = sandbox.upload("alice", "reference.csv");

    let output = sandbox.run("alice", &["report", &id.to_string()]);
    assert_success(&output, "report");

    let pdf = sandbox.dir.path().join("reports").join(format!("report_reference.csv_{}.pdf", id));
    let bytes = std::fs::read(&pdf).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_report_explicit_output() {
    let sandbox = Sandbox::new();
    let id = sandbox.upload("alice", "reference.csv");
    let target = sandbox.dir.path().join("out.pdf");

    let output = sandbox.run("alice", &["report", &id.to_string(), "--output", target.to_str().unwrap()]);
    assert_success(&output, "report --output");
    assert!(target.is_file());
}

#[test]
fn test_other_owner_gets_not_found_exit_code() {
    let sandbox = Sandbox::new();
    let id = sandbox.upload("bob", "reference.csv");

    let output = sandbox.run("alice", &["show", &id.to_string()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));

    let output = sandbox.run("alice", &["delete", &id.to_string()]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_bad_upload_exits_with_error() {
    let sandbox = Sandbox::new();
    let path = fixtures_dir().join("missing_pressure.csv");
    let output = sandbox.run("alice", &["upload", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing required columns: Pressure"));

    assert!(list_ids(&sandbox.run("alice", &["list", "--json"])).is_empty());
}

#[test]
fn test_retention_flag_caps_history() {
    let sandbox = Sandbox::new();
    let path = fixtures_dir().join("reference.csv");
    for _ in 0..4 {
        let output = sandbox.run("alice", &["--retention", "2", "upload", path.to_str().unwrap()]);
        assert_success(&output, "upload");
    }
    assert_eq!(list_ids(&sandbox.run("alice", &["list", "--json"])).len(), 2);
}

#[test]
fn test_delete_then_list() {
    let sandbox = Sandbox::new();
    let id = sandbox.upload("alice", "reference.csv");

    assert_success(&sandbox.run("alice", &["delete", &id.to_string()]), "delete");
    assert!(list_ids(&sandbox.run("alice", &["list", "--json"])).is_empty());
}
