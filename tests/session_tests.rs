//! End-to-end session tests over recorded WeChat trees.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use wechat_extractor::render::{self, OutputFormat};
use wechat_extractor::snapshot::{record_tree, JournalEntry};
use wechat_extractor::{
    AccessibleElement, ChatSession, Lookup, SnapshotElement, SnapshotHost, UnreadPolicy, WeChatExtractor,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn open(dialect: &str, policy: UnreadPolicy) -> ChatSession<SnapshotHost> {
    let locator = WeChatExtractor::locator(dialect, 100).unwrap();
    WeChatExtractor::open_snapshot(&fixture(&format!("wechat_{}.json", dialect)), locator, policy).unwrap()
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_all_chats_v40() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    let chats = session.list_chats(false);

    let summary: Vec<(&str, u32, bool, bool)> = chats
        .iter()
        .map(|c| (c.title.as_str(), c.unread_count, c.is_muted, c.is_pinned))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("文件传输助手", 0, false, false),
            ("Alice", 2, false, false),
            ("项目群", 0, true, true),
            ("Bob", 0, false, false),
        ]
    );
    assert_eq!(chats[2].last_message_preview, "[图片]");
    assert_eq!(chats[2].last_message_time_label, "昨天");
}

#[test]
fn test_list_visible_chats_skips_offscreen_rows() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    let titles: Vec<String> = session.list_chats(true).into_iter().map(|c| c.title).collect();
    assert_eq!(titles, vec!["文件传输助手", "Alice", "项目群"]);
}

#[test]
fn test_list_presses_filter_button_once() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    session.list_chats(false);
    session.list_chats(false);

    let presses = session
        .host()
        .app()
        .journal()
        .into_iter()
        .filter(|e| matches!(e, JournalEntry::Pressed { .. }))
        .count();
    assert_eq!(presses, 1);
}

#[test]
fn test_v38_dialect_finds_radio_button_filter() {
    let mut session = open("v38", UnreadPolicy::BudgetGated);
    let chats = session.list_chats(false);
    assert_eq!(chats.len(), 4);
    assert_eq!(chats[1].unread_count, 2);
}

#[test]
fn test_wrong_dialect_lists_with_zero_budget() {
    // the v38 tree has no grouped filter button
    let locator = WeChatExtractor::locator("v40", 100).unwrap();
    let mut session =
        WeChatExtractor::open_snapshot(&fixture("wechat_v38.json"), locator, UnreadPolicy::BudgetGated).unwrap();
    let chats = session.list_chats(false);
    assert_eq!(chats.len(), 4);
    assert!(chats.iter().all(|c| c.unread_count == 0));
    assert!(!session
        .host()
        .app()
        .journal()
        .iter()
        .any(|e| matches!(e, JournalEntry::Pressed { .. })));
}

#[test]
fn test_count_above_one_credits_muted_chats() {
    let mut session = open("v40", UnreadPolicy::CountAboveOne);
    let unread: Vec<u32> = session.list_chats(false).iter().map(|c| c.unread_count).collect();
    assert_eq!(unread, vec![0, 2, 5, 0]);
}

// ============================================================================
// Show, send, preview
// ============================================================================

#[test]
fn test_show_selects_and_groups_messages() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    let chat = session.show("Alice", false).found().unwrap();

    assert_eq!(chat.title, "Alice");
    assert_eq!(chat.messages.len(), 3);
    assert_eq!(chat.messages[0].date_label, "昨天 18:20");
    assert!(chat.messages[1].is_own_message);
    assert!(chat.messages[2].is_previewable);

    let text = render::render_chat_messages(&chat, OutputFormat::Text).unwrap();
    assert_eq!(
        text,
        "---------- 昨天 18:20 ----------\n\
         Alice > 在吗\n\
         我 > 在\n\
         ---------- 13:01 ----------\n\
         Alice > 发送了一个图片"
    );

    let selections: Vec<bool> = session
        .host()
        .app()
        .journal()
        .into_iter()
        .filter_map(|e| match e {
            JournalEntry::Selected { selected, .. } => Some(selected),
            _ => None,
        })
        .collect();
    assert_eq!(selections, vec![true]);
}

#[test]
fn test_show_selected_chat_does_not_reselect() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    session.show("文件传输助手", false).found().unwrap();
    assert!(!session
        .host()
        .app()
        .journal()
        .iter()
        .any(|e| matches!(e, JournalEntry::Selected { .. })));
}

#[test]
fn test_show_unknown_chat() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    assert_eq!(session.show("Nobody", false), Lookup::NotFound);
}

#[test]
fn test_show_falls_back_to_offscreen_rows() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    assert!(session.show("Bob", false).is_found());
}

#[test]
fn test_send_writes_then_submits() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    let chat = session.send("Alice", "明天见").found().unwrap();
    assert_eq!(chat.title, "Alice");

    let writes: Vec<JournalEntry> = session
        .host()
        .app()
        .journal()
        .into_iter()
        .filter(|e| matches!(e, JournalEntry::TextWritten(_) | JournalEntry::Submitted(_)))
        .collect();
    assert_eq!(
        writes,
        vec![
            JournalEntry::TextWritten("明天见".to_string()),
            JournalEntry::Submitted("明天见".to_string()),
        ]
    );
}

#[test]
fn test_send_to_unknown_chat_writes_nothing() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    assert_eq!(session.send("Nobody", "hi"), Lookup::NotFound);
    assert!(!session
        .host()
        .app()
        .journal()
        .iter()
        .any(|e| matches!(e, JournalEntry::TextWritten(_))));
}

#[test]
fn test_preview_presses_message_cell() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    let message = session.preview_message("Alice", 4, false).found().unwrap();
    assert_eq!(message.body, "发送了一个图片");
    assert_eq!(message.element.press_count(), 1);
}

#[test]
fn test_preview_date_row_is_not_a_message() {
    let mut session = open("v40", UnreadPolicy::BudgetGated);
    assert_eq!(session.preview_message("Alice", 3, false), Lookup::NotFound);
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn test_recorded_tree_replays_identically() {
    let original = SnapshotElement::load(&fixture("wechat_v40.json")).unwrap();
    let recorded = record_tree(&original, 100);
    let json = serde_json::to_string(&recorded).unwrap();

    let replayed = SnapshotElement::from_json(&json).unwrap();
    let locator = WeChatExtractor::locator("v40", 100).unwrap();
    let mut session = ChatSession::new(SnapshotHost::new(replayed), locator, UnreadPolicy::BudgetGated);

    let titles: Vec<String> = session.list_chats(true).into_iter().map(|c| c.title).collect();
    assert_eq!(titles, vec!["文件传输助手", "Alice", "项目群"]);
}

#[test]
fn test_recording_respects_depth() {
    let original = SnapshotElement::load(&fixture("wechat_v40.json")).unwrap();
    let recorded = record_tree(&original, 1);
    assert_eq!(recorded.children.len(), 2);
    assert!(recorded.children.iter().all(|window| window.children.is_empty()));
    assert_eq!(original.windows().len(), 2);
}
