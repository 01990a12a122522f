use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("snifcap"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn fixture(name: &str) -> std::path::PathBuf {
    repo_root().join("tests").join("fixtures").join(name)
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("convert").and(contains("ipsec")));
    cmd().arg("convert").arg("--help").assert().success();
    cmd().arg("ipsec").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.txt");

    cmd()
        .arg("convert")
        .arg(missing)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn convert_writes_capture_and_json_summary() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("out").join("capture.pcapng");

    let assert = cmd()
        .arg("convert")
        .arg(fixture("fortigate_basic.txt"))
        .arg("-o")
        .arg(&output)
        .arg("--json")
        .assert()
        .success()
        .stderr(contains("OK: 3 packets written"));

    let summary = stdout_json(assert.get_output());
    assert_eq!(summary["packets_converted"], 3);
    assert_eq!(summary["packets_received_by_filter"], 3);
    assert_eq!(summary["interfaces"][0]["name"], "port1");
    assert_eq!(summary["interfaces"][1]["name"], "port2");
    assert!(output.is_file());
}

#[test]
fn convert_defaults_output_next_to_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("fw.txt");
    std::fs::copy(fixture("fortigate_basic.txt"), &input).expect("copy fixture");

    cmd().arg("convert").arg(&input).arg("--quiet").assert().success();

    assert!(temp.path().join("fw.txt.pcapng").is_file());
}

#[test]
fn convert_accepts_single_match_glob() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::copy(fixture("fortigate_basic.txt"), temp.path().join("fw.txt"))
        .expect("copy fixture");
    let pattern = temp.path().join("f*.txt");
    let output = temp.path().join("glob.pcapng");

    cmd()
        .arg("convert")
        .arg(pattern)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert!(output.is_file());
}

#[test]
fn convert_rejects_ambiguous_glob() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::copy(fixture("fortigate_basic.txt"), temp.path().join("a.txt")).expect("copy");
    std::fs::copy(fixture("fortigate_basic.txt"), temp.path().join("b.txt")).expect("copy");

    cmd()
        .arg("convert")
        .arg(temp.path().join("*.txt"))
        .assert()
        .failure()
        .stderr(contains("multiple files match").and(contains("hint:")));
}

#[test]
fn no_overwrite_refuses_existing_output() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("capture.pcapng");
    std::fs::write(&output, b"keep me").expect("seed output");

    cmd()
        .arg("convert")
        .arg(fixture("fortigate_basic.txt"))
        .arg("-o")
        .arg(&output)
        .arg("--no-overwrite")
        .assert()
        .failure()
        .stderr(contains("already exists"));
    assert_eq!(std::fs::read(&output).expect("read output"), b"keep me");
}

#[test]
fn exclude_and_split_flags_reach_the_converter() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("capture.pcapng");

    let assert = cmd()
        .arg("convert")
        .arg(fixture("fortigate_basic.txt"))
        .arg("-o")
        .arg(&output)
        .arg("--exclude")
        .arg("port2")
        .arg("--max-packets")
        .arg("1")
        .arg("--json")
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());

    let summary = stdout_json(assert.get_output());
    assert_eq!(summary["packets_converted"], 2);
    assert_eq!(summary["packets_filtered"], 1);
    assert_eq!(summary["output_files"].as_array().expect("files").len(), 2);
    assert!(temp.path().join("capture.part001.pcapng").is_file());
    assert!(temp.path().join("capture.part002.pcapng").is_file());
}

#[test]
fn zero_max_packets_is_rejected() {
    cmd()
        .arg("convert")
        .arg(fixture("fortigate_basic.txt"))
        .arg("--max-packets")
        .arg("0")
        .assert()
        .failure();
}

#[test]
fn ipsec_stdout_prints_rows() {
    let assert = cmd()
        .arg("ipsec")
        .arg(fixture("ipsec_tunnels.txt"))
        .arg("--stdout")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let rows: Vec<_> = stdout.lines().collect();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|row| row.starts_with("\"IPv4\",")));
}

#[test]
fn ipsec_appends_to_given_esp_sa() {
    let temp = TempDir::new().expect("tempdir");
    let esp_sa = temp.path().join("wireshark").join("esp_sa");

    let assert = cmd()
        .arg("ipsec")
        .arg(fixture("ipsec_tunnels.txt"))
        .arg("--esp-sa")
        .arg(&esp_sa)
        .arg("--json")
        .assert()
        .success();

    let summary = stdout_json(assert.get_output());
    assert_eq!(summary["tunnels_found"], 4);
    assert_eq!(summary["rows_written"], 6);
    assert_eq!(summary["directions_skipped"], 2);
    let content = std::fs::read_to_string(&esp_sa).expect("esp_sa written");
    assert_eq!(content.lines().count(), 6);
}

#[test]
fn ipsec_stdout_and_esp_sa_conflict() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg("ipsec")
        .arg(fixture("ipsec_tunnels.txt"))
        .arg("--stdout")
        .arg("--esp-sa")
        .arg(temp.path().join("esp_sa"))
        .assert()
        .failure()
        .stderr(contains("error:"));
}
