use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::{env, fs};

use serde_json::Value;
use tempfile::tempdir;

fn cli_bin_path() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_mailthread") {
        return PathBuf::from(path);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .expect("workspace root");
    let bin_name = if cfg!(windows) {
        "mailthread.exe"
    } else {
        "mailthread"
    };
    let fallback = workspace_root.join("target").join("debug").join(bin_name);
    assert!(
        fallback.exists(),
        "mailthread binary not found at {}",
        fallback.display()
    );
    fallback
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(cli_bin_path())
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("MAILTHREAD_LEGACY_THREADING")
        .output()
        .expect("run mailthread")
}

fn write_message(dir: &Path, name: &str, id: &str, extra: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(
        &path,
        format!("From: a@example.com\nSubject: hi\nMessage-Id: <{id}>\n{extra}\nbody\n"),
    )
    .expect("write message");
    path
}

fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[test]
fn add_walks_directory_and_threads_replies() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("index");
    let mail = temp.path().join("mail");
    fs::create_dir_all(&mail).expect("mail dir");
    write_message(&mail, "1", "a@x", "");
    write_message(&mail, "2", "b@x", "In-Reply-To: <a@x>\n");
    fs::write(mail.join("skip.tmp"), "junk").expect("write junk");

    let output = run(
        &root,
        &["add", mail.to_str().expect("mail path"), "--exclude", "*.tmp"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["status"], "added");
    assert_eq!(lines[0]["message_id"], "a@x");
    assert_eq!(lines[0]["thread_id"], lines[1]["thread_id"]);

    let thread_id = lines[0]["thread_id"].as_str().expect("thread id").to_string();
    let output = run(&root, &["thread", &thread_id]);
    assert!(output.status.success());
    let members: Vec<String> = serde_json::from_slice(&output.stdout).expect("members json");
    assert_eq!(members, vec!["a@x".to_string(), "b@x".to_string()]);
}

#[test]
fn add_reports_failures_and_exits_non_zero() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("index");
    let missing = temp.path().join("missing.eml");

    let output = run(&root, &["add", missing.to_str().expect("path")]);
    assert!(!output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["error"]["code"], "FILE_ERROR");
    assert_eq!(lines[0]["error"]["operation"], "add_message");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 1 messages failed"));
}

#[test]
fn init_legacy_then_status_reports_features() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("index");

    let output = run(&root, &["init", "--legacy"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(root.join("index.sqlite3").exists());

    let output = run(&root, &["status"]);
    assert!(output.status.success());
    let status: Value = serde_json::from_slice(&output.stdout).expect("status json");
    assert_eq!(status["features"]["ghosts"], false);
    assert_eq!(status["document_count"], 0);
    assert_eq!(status["last_thread_id"], Value::Null);
}

#[test]
fn show_on_missing_index_fails() {
    let temp = tempdir().expect("tempdir");
    let output = run(&temp.path().join("absent"), &["show", "a@x"]);
    assert!(!output.status.success());
    assert!(!temp.path().join("absent").join("index.sqlite3").exists());
}
