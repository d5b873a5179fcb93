//! Message table decoding.
//!
//! Each message row exposes one content cell whose `AXTitle` is either a
//! date separator ("14:05", "昨天 14:05", "2025/05/10 09:12") or a
//! `sender:body` pair. Separators are only rendered when the date changes,
//! so [`MessageDecoder`] forward-fills the last one onto following rows.

use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::element::AccessibleElement;
use crate::locator::Locator;
use crate::roles::PathTarget;
use crate::types::{Lookup, MessageEntry, MessageGroup};

/// Sender label WeChat uses for the logged-in user
pub const SELF_SENDER: &str = "我";

/// "said" particle WeChat appends to sender names ("张三说")
pub const SAID_SUFFIX: &str = "说";

lazy_static! {
    // Bodies that can be opened with a press (images, videos, files, links)
    static ref PREVIEWABLE: Option<Regex> =
        Regex::new(r"发送了一个(图片|视频|动画表情|文件)|^\[(图片|视频|动画表情|文件|链接)\]|https?://").ok();
}

/// Check if a cell label is a date/time separator row.
///
/// At most two whitespace-separated tokens, the last one a strict `HH:mm`.
///
/// # Example
///
/// ```
/// use wechat_extractor::message::is_date_label;
///
/// assert!(is_date_label("昨天 18:20"));
/// assert!(is_date_label("2025/05/10 09:12"));
/// assert!(!is_date_label("9:05"));
/// assert!(!is_date_label("Alice:在吗"));
/// ```
pub fn is_date_label(label: &str) -> bool {
    let tokens: Vec<&str> = label.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 2 {
        return false;
    }
    tokens
        .last()
        .map(|time| is_strict_time(time))
        .unwrap_or(false)
}

fn is_strict_time(token: &str) -> bool {
    // chrono accepts "9:05" for %H; WeChat always zero-pads
    let bytes = token.as_bytes();
    bytes.len() == 5 && bytes[2] == b':' && NaiveTime::parse_from_str(token, "%H:%M").is_ok()
}

/// Check if a message body looks like a previewable payload.
pub fn is_previewable(body: &str) -> bool {
    PREVIEWABLE
        .as_ref()
        .map(|pattern| pattern.is_match(body))
        .unwrap_or(false)
}

/// Split a `sender:body` label.
///
/// Returns `(sender, body)`. The sender loses a trailing "说" and
/// surrounding whitespace; the body is what follows the first colon,
/// trimmed. A label with no colon is all sender.
///
/// # Example
///
/// ```
/// use wechat_extractor::message::split_message_label;
///
/// assert_eq!(
///     split_message_label("张三说: 发送了一个图片"),
///     ("张三".to_string(), "发送了一个图片".to_string())
/// );
/// assert_eq!(split_message_label("系统消息"), ("系统消息".to_string(), String::new()));
/// ```
pub fn split_message_label(label: &str) -> (String, String) {
    let (sender, body) = label.split_once(':').unwrap_or((label, ""));
    let sender = sender.strip_suffix(SAID_SUFFIX).unwrap_or(sender).trim();
    (sender.to_string(), body.trim().to_string())
}

/// Forward-fill state for one decode pass.
///
/// A decoder is created per call and dropped afterwards; the carried date
/// never crosses chats.
#[derive(Debug, Default)]
pub struct MessageDecoder {
    current_date: String,
}

impl MessageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_date(&self) -> &str {
        &self.current_date
    }

    /// Feed one cell label.
    ///
    /// Date separators update the carried date and yield `None`, as do
    /// empty labels.
    ///
    /// # Example
    ///
    /// ```
    /// use wechat_extractor::message::MessageDecoder;
    ///
    /// let mut decoder = MessageDecoder::new();
    /// assert!(decoder.decode_label("昨天 18:20", 0, ()).is_none());
    ///
    /// let message = decoder.decode_label("我:在", 1, ()).unwrap();
    /// assert!(message.is_own_message);
    /// assert_eq!(message.date_label, "昨天 18:20");
    /// ```
    pub fn decode_label<E>(&mut self, label: &str, sequence_index: usize, element: E) -> Option<MessageEntry<E>> {
        if label.trim().is_empty() {
            return None;
        }
        if is_date_label(label) {
            self.current_date = label.to_string();
            return None;
        }

        let (sender, body) = split_message_label(label);
        Some(MessageEntry {
            sequence_index,
            is_own_message: sender == SELF_SENDER,
            is_previewable: is_previewable(&body),
            sender,
            body,
            date_label: self.current_date.clone(),
            element,
        })
    }
}

/// Position index of a row: its `AXIndex`, else its enumeration position.
pub fn row_index<E: AccessibleElement>(row: &E, position: usize) -> usize {
    match row.index() {
        Lookup::Found(index) => index,
        other => {
            if let Lookup::PlatformError(failure) = other {
                log::debug!("[WX-CHAT] {}", failure);
            }
            position
        }
    }
}

/// Decode an ordered sequence of message rows.
///
/// Rows without a content cell or a readable label are skipped; they
/// neither emit a message nor touch the carried date.
///
/// # Arguments
///
/// * `locator` - Resolves [`PathTarget::MessageInRow`] inside each row
/// * `rows` - Message table rows, top to bottom
///
/// # Returns
///
/// The messages in row order, each carrying the last date seen above it.
/// Positions come from `AXIndex` when the row reports one.
///
/// # Example
///
/// ```
/// use wechat_extractor::message::decode_messages;
/// use wechat_extractor::snapshot::{NodeSpec, SnapshotElement};
/// use wechat_extractor::{AccessibleElement, Locator};
///
/// let row = |label: &str| {
///     NodeSpec::new("AXRow").with_children(vec![NodeSpec::new("AXCell")
///         .with_children(vec![NodeSpec::new("AXUnknown").with_title(label)])])
/// };
/// let table = SnapshotElement::build(NodeSpec::new("AXTable").with_children(vec![
///     row("13:01"),
///     row("Alice:发送了一个图片"),
/// ]));
///
/// let messages = decode_messages(&Locator::new("v40"), &table.children());
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].sequence_index, 1);
/// assert_eq!(messages[0].date_label, "13:01");
/// assert!(messages[0].is_previewable);
/// ```
pub fn decode_messages<E: AccessibleElement>(locator: &Locator, rows: &[E]) -> Vec<MessageEntry<E>> {
    let mut decoder = MessageDecoder::new();
    let mut messages = Vec::new();

    for (position, row) in rows.iter().enumerate() {
        let Some(cell) = locator.find_element(row, PathTarget::MessageInRow) else {
            continue;
        };
        let Some(label) = cell.title().found_or_log() else {
            continue;
        };
        let index = row_index(row, position);
        if let Some(message) = decoder.decode_label(&label, index, cell) {
            messages.push(message);
        }
    }

    log::debug!("[WX-CHAT] Decoded {} messages from {} rows", messages.len(), rows.len());
    messages
}

/// Fold messages into runs sharing a date label, keeping order.
///
/// A label that reappears after a different one starts a new group.
///
/// # Example
///
/// ```
/// use wechat_extractor::message::{group_messages, MessageDecoder};
///
/// let mut decoder = MessageDecoder::new();
/// let messages: Vec<_> = ["10:00", "a:1", "b:2", "11:00", "a:3"]
///     .iter()
///     .enumerate()
///     .filter_map(|(i, label)| decoder.decode_label(label, i, ()))
///     .collect();
///
/// let groups = group_messages(messages);
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].messages.len(), 2);
/// assert_eq!(groups[1].date_label, "11:00");
/// ```
pub fn group_messages<E>(messages: Vec<MessageEntry<E>>) -> Vec<MessageGroup<E>> {
    let mut groups: Vec<MessageGroup<E>> = Vec::new();
    for message in messages {
        match groups.last_mut() {
            Some(group) if group.date_label == message.date_label => group.messages.push(message),
            _ => groups.push(MessageGroup {
                date_label: message.date_label.clone(),
                messages: vec![message],
            }),
        }
    }
    groups
}
