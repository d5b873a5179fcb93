//! Tests for the wechat-ax binary, replaying recorded trees.

use std::path::PathBuf;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Run the binary against the v40 fixture with default settings.
fn wechat_ax(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wechat-ax"))
        .arg("--snapshot")
        .arg(fixture("wechat_v40.json"))
        .arg("--config")
        .arg(fixture("missing-config.toml"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run wechat-ax")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

#[test]
fn test_list_text() {
    let output = wechat_ax(&["list"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "文件传输助手 : hello 13:09\n\
         Alice : see you 12:30\n\
         项目群 : [图片] 昨天\n\
         Bob : ok 2025/05/01"
    );
}

#[test]
fn test_list_visible_json() {
    let output = wechat_ax(&["list", "--visible", "--format", "json"]);
    assert!(output.status.success());

    let chats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chats = chats.as_array().unwrap();
    assert_eq!(chats.len(), 3);
    assert_eq!(chats[1]["title"], "Alice");
    assert_eq!(chats[1]["unread_count"], 2);
    assert_eq!(chats[2]["is_muted"], true);
    assert!(chats[0].get("element").is_none());
}

#[test]
fn test_show_text() {
    let output = wechat_ax(&["show", "Alice"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "---------- 昨天 18:20 ----------\n\
         Alice > 在吗\n\
         我 > 在\n\
         ---------- 13:01 ----------\n\
         Alice > 发送了一个图片"
    );
}

#[test]
fn test_show_json_groups() {
    let output = wechat_ax(&["--format", "json", "show", "Alice"]);
    assert!(output.status.success());

    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["chat"]["title"], "Alice");
    assert!(shown["chat"].get("messages").is_none());
    let groups = shown["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1]["date_label"], "13:01");
    assert_eq!(groups[1]["messages"][0]["is_previewable"], true);
}

#[test]
fn test_show_unknown_chat_exits_nonzero() {
    let output = wechat_ax(&["show", "Nobody"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nobody"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_send() {
    let output = wechat_ax(&["send", "Alice", "明天见"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Sent to Alice");
}

#[test]
fn test_preview() {
    let output = wechat_ax(&["preview", "Alice", "4"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Alice > 发送了一个图片");

    let missing = wechat_ax(&["preview", "Alice", "9"]);
    assert_eq!(missing.status.code(), Some(1));
}

#[test]
fn test_v38_dialect_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_wechat-ax"))
        .arg("--snapshot")
        .arg(fixture("wechat_v38.json"))
        .arg("--config")
        .arg(fixture("missing-config.toml"))
        .args(["--dialect", "v38", "list", "--visible"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 3);
}

#[test]
fn test_unsupported_dialect_fails() {
    let output = wechat_ax(&["--dialect", "v12", "list"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported dialect"));
}

#[test]
fn test_dump_is_replayable_json() {
    let output = wechat_ax(&["dump", "--depth", "2"]);
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["role"], "AXApplication");
    assert_eq!(tree["children"][1]["title"], "微信 (wxid_test)");
    // depth 2 stops below the window's direct children
    assert!(tree["children"][1]["children"][0].get("children").is_none());
}

#[test]
fn test_monitor_rejects_snapshot() {
    let output = wechat_ax(&["monitor"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_check_permissions_outputs_valid_json() {
    let output = Command::new(env!("CARGO_BIN_EXE_wechat-ax"))
        .arg("check-permissions")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    let enabled = json["enabled"].as_bool().expect("'enabled' should be a boolean");
    assert!(json["message"].is_string());
    assert_eq!(output.status.success(), enabled);
    if !enabled {
        assert!(!output.stderr.is_empty());
    }
}

#[test]
fn test_missing_main_window_is_an_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_wechat-ax"))
        .arg("--snapshot")
        .arg(fixture("no_main_window.json"))
        .arg("--config")
        .arg(fixture("missing-config.toml"))
        .arg("list")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Main window not found"));
}
