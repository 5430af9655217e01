use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_chat-filter")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .arg("--color")
        .arg("never")
        .args(args)
        .env_remove("CHAT_FILTER_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run binary")
}

const MESSAGES: &str = r##"{"timestamp":"2026-01-01T12:00:00Z","channel":"forsen","author":{"name":"icelys","color":"#ff0000","badges":[{"name":"moderator"}]},"content":"hello chat"}

{"channel":"forsen","author":{"name":"viewer"},"content":"first time here","flags":["first_message"]}
{"channel":"pajlada","author":{"name":"pajlada","badges":[{"name":"subscriber","info":"80"}]},"content":"Kappa"}
"##;

#[test]
fn test_check_valid_filter() {
    let output = run(&["check", "--debug", "!author.subbed"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("valid filter"));
    assert!(stdout.contains("type:   Bool"));
    assert!(stdout.contains("source: (!author.subbed)"));
    assert!(stdout.contains("UnaryOp[Not](Val(author.subbed) : Bool)"));
}

#[test]
fn test_check_invalid_filter_fails() {
    let output = run(&["check", "author.name - 5"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid filter"));
    assert!(stderr.contains("Can only perform Minus with Ints"));
    assert!(stderr.contains("(author.name - 5)"));
}

#[test]
fn test_eval_lists_matching_messages() {
    let dir = tempdir().expect("temp dir");
    let messages = dir.path().join("messages.jsonl");
    write_file(&messages, MESSAGES);

    let output = run(&[
        "eval",
        r#"channel.name == "forsen""#,
        messages.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("FILTER matched 2 of 3 messages"));
    assert!(stdout.contains("2026-01-01T12:00:00.000Z #forsen icelys: hello chat"));
    assert!(stdout.contains("#forsen viewer: first time here"));
    assert!(!stdout.contains("pajlada"));
}

#[test]
fn test_eval_json_output_is_json() {
    let dir = tempdir().expect("temp dir");
    let messages = dir.path().join("messages.jsonl");
    write_file(&messages, MESSAGES);

    let output = run(&[
        "eval",
        "author.sub_length + 1",
        messages.to_str().expect("utf8 path"),
        "-F",
        "json",
    ]);
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let records = parsed.as_array().expect("array of records");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["line"], 1);
    assert_eq!(records[1]["line"], 3);
    assert_eq!(records[2]["result"], 81);
}

#[test]
fn test_eval_uses_channel_state_from_config() {
    let dir = tempdir().expect("temp dir");
    let messages = dir.path().join("messages.jsonl");
    let config = dir.path().join("filters.toml");
    write_file(&messages, MESSAGES);
    write_file(&config, "[channels]\nlive = [\"pajlada\"]\n");

    let output = run(&[
        "--config",
        config.to_str().expect("utf8 path"),
        "eval",
        "channel.live",
        messages.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("FILTER matched 1 of 3 messages"));
    assert!(stdout.contains("#pajlada pajlada: Kappa"));
}

#[test]
fn test_eval_reports_malformed_message_line() {
    let dir = tempdir().expect("temp dir");
    let messages = dir.path().join("messages.jsonl");
    write_file(&messages, "{\"content\":\"ok\"}\n{broken\n");

    let output = run(&["eval", "flags.reply", messages.to_str().expect("utf8 path")]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"));
}

#[test]
fn test_identifiers_lists_catalogue() {
    let output = run(&["identifiers"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("author.badges"));
    assert!(stdout.contains("flags.hype_chat"));
    assert!(stdout.contains("StringList"));
}
