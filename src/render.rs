//! Plain-text and JSON rendering of decoded entries.

use serde::{Deserialize, Serialize};

use crate::message::group_messages;
use crate::types::{ChatEntry, MessageEntry, MessageGroup};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// `<title> : <last message> <time>`
pub fn chat_line<E>(chat: &ChatEntry<E>) -> String {
    format!(
        "{} : {} {}",
        chat.title, chat.last_message_preview, chat.last_message_time_label
    )
}

/// `<sender> > <body>`
pub fn message_line<E>(message: &MessageEntry<E>) -> String {
    format!("{} > {}", message.sender, message.body)
}

/// `---------- <date> ----------`
pub fn group_header(date_label: &str) -> String {
    format!("---------- {} ----------", date_label)
}

/// Header followed by one line per message.
pub fn group_text<E>(group: &MessageGroup<E>) -> String {
    let mut lines = Vec::with_capacity(group.messages.len() + 1);
    lines.push(group_header(&group.date_label));
    lines.extend(group.messages.iter().map(message_line));
    lines.join("\n")
}

/// One line per chat.
pub fn chats_text<E>(chats: &[ChatEntry<E>]) -> String {
    chats.iter().map(chat_line).collect::<Vec<_>>().join("\n")
}

/// Messages grouped by consecutive date label.
pub fn messages_text<E: Clone>(messages: &[MessageEntry<E>]) -> String {
    group_messages(messages.to_vec())
        .iter()
        .map(group_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a chat list.
pub fn render_chats<E>(chats: &[ChatEntry<E>], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(chats_text(chats)),
        OutputFormat::Json => serde_json::to_string_pretty(chats),
    }
}

/// Chat fields of a shown chat. Its messages go out once, in `groups`.
#[derive(Serialize)]
struct ChatHeader<'a> {
    display_index: usize,
    title: &'a str,
    is_pinned: bool,
    is_muted: bool,
    unread_count: u32,
    last_message_preview: &'a str,
    last_message_time_label: &'a str,
}

impl<'a> ChatHeader<'a> {
    fn of<E>(chat: &'a ChatEntry<E>) -> Self {
        ChatHeader {
            display_index: chat.display_index,
            title: &chat.title,
            is_pinned: chat.is_pinned,
            is_muted: chat.is_muted,
            unread_count: chat.unread_count,
            last_message_preview: &chat.last_message_preview,
            last_message_time_label: &chat.last_message_time_label,
        }
    }
}

#[derive(Serialize)]
#[serde(bound(serialize = ""))]
struct ShownChat<'a, E> {
    chat: ChatHeader<'a>,
    groups: Vec<MessageGroup<E>>,
}

/// Render a shown chat: its messages as text, or the grouped chat as JSON.
pub fn render_chat_messages<E: Clone>(chat: &ChatEntry<E>, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(messages_text(&chat.messages)),
        OutputFormat::Json => serde_json::to_string_pretty(&ShownChat {
            chat: ChatHeader::of(chat),
            groups: group_messages(chat.messages.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageDecoder;
    use pretty_assertions::assert_eq;

    fn messages(labels: &[&str]) -> Vec<MessageEntry<()>> {
        let mut decoder = MessageDecoder::new();
        labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| decoder.decode_label(l, i, ()))
            .collect()
    }

    #[test]
    fn test_chat_line() {
        let mut chat = ChatEntry::new("user1", 0, ());
        chat.last_message_preview = "hello".to_string();
        chat.last_message_time_label = "13:09".to_string();
        assert_eq!(chat_line(&chat), "user1 : hello 13:09");
    }

    #[test]
    fn test_messages_text_headers_once_per_run() {
        let text = messages_text(&messages(&["14:05", "A: hello", "B: 发送了一个图片", "14:10", "A: bye"]));
        assert_eq!(
            text,
            "---------- 14:05 ----------\nA > hello\nB > 发送了一个图片\n---------- 14:10 ----------\nA > bye"
        );
    }

    #[test]
    fn test_messages_text_round_trip_order() {
        let decoded = messages(&["09:00", "A: 1", "09:00", "B: 2", "10:00", "C: 3", "09:00", "D: 4"]);
        let text = messages_text(&decoded);

        let bodies: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with("----------"))
            .map(|l| l.rsplit(" > ").next().unwrap_or_default())
            .collect();
        assert_eq!(bodies, vec!["1", "2", "3", "4"]);

        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with("----------")).collect();
        assert_eq!(
            headers,
            vec![
                "---------- 09:00 ----------",
                "---------- 10:00 ----------",
                "---------- 09:00 ----------",
            ]
        );
    }

    #[test]
    fn test_render_chats_json() {
        let mut chat = ChatEntry::new("群组1", 3, ());
        chat.unread_count = 2;
        let json = render_chats(&[chat], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "群组1");
        assert_eq!(value[0]["display_index"], 3);
        assert_eq!(value[0]["unread_count"], 2);
    }

    #[test]
    fn test_render_chat_messages_json_groups() {
        let mut chat = ChatEntry::new("A", 0, ());
        chat.messages = messages(&["14:05", "A: hello", "14:10", "A: bye"]);
        let json = render_chat_messages(&chat, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["chat"]["title"], "A");
        assert_eq!(value["groups"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["groups"][1]["messages"][0]["body"], "bye");
    }

    #[test]
    fn test_render_chat_messages_json_lists_each_message_once() {
        let mut chat = ChatEntry::new("A", 1, ());
        chat.is_pinned = true;
        chat.last_message_time_label = "14:10".to_string();
        chat.messages = messages(&["14:05", "A: hello", "B: hi", "14:10", "A: bye"]);

        let json = render_chat_messages(&chat, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["chat"].get("messages").is_none());
        assert_eq!(value["chat"]["is_pinned"], true);
        assert_eq!(value["chat"]["last_message_time_label"], "14:10");
        assert_eq!(json.matches("\"body\"").count(), 3);
    }

    #[test]
    fn test_empty_renders() {
        assert_eq!(chats_text::<()>(&[]), "");
        assert_eq!(messages_text::<()>(&[]), "");
    }
}
