//! Testes de ponta a ponta do binário `segeval`.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn segeval(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_segeval"))
        .args(args)
        .output()
        .expect("falha ao executar o binário")
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_eval_prints_report() {
    let dir = TempDir::new().unwrap();
    let gold = write(dir.path(), "gold.txt", "(t (s (w Er) (w kam) (c .)))");
    let pred = write(dir.path(), "pred.txt", "(t (s (w Er) (w kam)) (c .))");

    let out = segeval(&["eval", "--gold", &gold, "--pred", &pred]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("#Ground Truth spans: 3\n"));
    assert!(stdout.contains("#Words and characters (prediction): 3"));
    assert!(stdout.contains("Token | # Ground Truth | # predictions | % precision | % recall"));
}

#[test]
fn test_eval_json_output() {
    let dir = TempDir::new().unwrap();
    let gold = write(dir.path(), "gold.txt", "(t (s (w a) (w b)))");
    let pred = write(dir.path(), "pred.txt", "(t (s (w a) (w b)))");

    let out = segeval(&["eval", "-g", &gold, "-p", &pred, "--format", "json"]);
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["label"], "(t");
    assert_eq!(rows[0]["precision"], 100.0);
}

#[test]
fn test_eval_malformed_stream_fails() {
    let dir = TempDir::new().unwrap();
    let gold = write(dir.path(), "gold.txt", "(t (s (w a) (w b))))");
    let pred = write(dir.path(), "pred.txt", "(t (s (w a) (w b)))");

    let out = segeval(&["eval", "--gold", &gold, "--pred", &pred]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty(), "nenhum relatório parcial");
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("ground truth"), "{}", stderr);
}

#[test]
fn test_eval_with_reference_resolves_placeholders() {
    let dir = TempDir::new().unwrap();
    let gold = write(dir.path(), "gold.txt", "(t (s (w Er) (w kam) (c .)))");
    let pred = write(dir.path(), "pred.txt", "Er kam . (t (s (XX Er) (XX kam) (XX .)))");
    let reference = write(dir.path(), "ref.txt", "(t (w Er) (w kam) (c .))");

    let out = segeval(&["eval", "-g", &gold, "-p", &pred, "-r", &reference, "-f", "json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["prediction"]["content_units"], 3);
}

#[test]
fn test_encode_writes_graminput_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "kafka.txt", "Er kam.");

    let out = segeval(&["encode", &input]);
    assert!(out.status.success());

    let encoded = fs::read_to_string(dir.path().join("kafka_graminput.txt")).unwrap();
    assert_eq!(encoded.trim_end(), "(t (w Er) (w kam) (c .))");
}

#[test]
fn test_normalize_to_stdout() {
    let dir = TempDir::new().unwrap();
    let reference = write(dir.path(), "ref.txt", "(t (w Er) (w kam) (c .))");
    let pred = write(dir.path(), "pred.txt", "eco (t (s (XX Er) (XX kann) (XX .)))");

    let out = segeval(&["normalize", "-r", &reference, "-p", &pred]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap().trim_end(),
        "(t (s (w Er) (w kam) (c .)))"
    );
}

#[test]
fn test_split_one_sentence_per_line() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "gold.txt", "(s (w Er) (c .)) (c ») (s (w Ja))");

    let out = segeval(&["split", &input]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "(s (w Er) (c .))\n(s (w Ja))\n");
}

#[test]
fn test_tei_export() {
    let dir = TempDir::new().unwrap();
    let pred = write(dir.path(), "pred.txt", "(t (s (w Hi) (c !)))");
    let output = dir.path().join("pred.xml");

    let out = segeval(&["tei", "-p", &pred, "-o", &output.display().to_string()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let xml = fs::read_to_string(output).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains(">Hi</w>"));
}

#[test]
fn test_batch_over_directories() {
    let dir = TempDir::new().unwrap();
    let gold_dir = dir.path().join("gold");
    let pred_dir = dir.path().join("pred");
    fs::create_dir_all(&gold_dir).unwrap();
    fs::create_dir_all(&pred_dir).unwrap();
    for name in ["a.txt", "b.txt"] {
        write(&gold_dir, name, "(t (s (w x) (w y)))");
        write(&pred_dir, name, "(t (s (w x)) (s (w y)))");
    }

    let out = segeval(&[
        "batch",
        "--gold-dir",
        &gold_dir.display().to_string(),
        "--pred-dir",
        &pred_dir.display().to_string(),
        "--format",
        "json",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let reports = json.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["source"], "a.txt");
}

#[test]
fn test_demo_runs_all_documents() {
    let out = segeval(&["demo"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.matches("File: ").count(), 3);
}

#[test]
fn test_missing_file_reports_path() {
    let out = segeval(&["eval", "--gold", "/nao/existe.txt", "--pred", "/nao/existe.txt"]);
    assert!(!out.status.success());
    assert!(String::from_utf8(out.stderr).unwrap().contains("/nao/existe.txt"));
}
