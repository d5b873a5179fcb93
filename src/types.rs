//! Core data types for the wechat-extractor crate.
//!
//! This module defines the fundamental types used throughout the crate:
//! - `ChatEntry`: one decoded row of the chat list
//! - `MessageEntry`: one decoded row of the message table
//! - `MessageGroup`: messages sharing a carried-forward date label
//! - `Lookup`: the per-operation outcome of anything that touches the UI tree
//! - `PlatformFailure` / `WeChatError`: error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A chat list entry decoded from one row of the chat list table.
///
/// Entries are snapshots: they are created fresh on every listing or
/// search and never cached, because the live tree can reorder or change
/// between calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct ChatEntry<E> {
    /// Row position inside the chat list (stable within one listing pass)
    pub display_index: usize,

    /// Chat name (first fragment of the row label)
    pub title: String,

    /// Whether the chat is pinned to the top ("置顶")
    pub is_pinned: bool,

    /// Whether notifications are muted ("消息免打扰")
    pub is_muted: bool,

    /// Unread count credited to this chat by the reconciliation policy
    pub unread_count: u32,

    /// Preview of the last message
    pub last_message_preview: String,

    /// Time label of the last message ("13:09", "2025/05/10", ...)
    pub last_message_time_label: String,

    /// Messages, only populated by a "show" operation
    pub messages: Vec<MessageEntry<E>>,

    /// The row's title element.
    ///
    /// Non-owning in spirit: it is only valid until the next call that
    /// mutates the tree (selection, typing, app updates), and it is never
    /// serialized or used as an identifier.
    #[serde(skip)]
    pub element: E,
}

impl<E> ChatEntry<E> {
    /// Creates an entry with only the title set; every other field keeps
    /// its default value.
    pub fn new(title: impl Into<String>, display_index: usize, element: E) -> Self {
        ChatEntry {
            display_index,
            title: title.into(),
            is_pinned: false,
            is_muted: false,
            unread_count: 0,
            last_message_preview: String::new(),
            last_message_time_label: String::new(),
            messages: Vec::new(),
            element,
        }
    }
}

/// A message decoded from one row of the message table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct MessageEntry<E> {
    /// Position index of the row inside the message table.
    ///
    /// Used to re-identify the message in a later action (preview).
    pub sequence_index: usize,

    /// Sender name, with the "说" suffix stripped
    pub sender: String,

    /// Message body
    pub body: String,

    /// The date separator most recently seen before this row
    pub date_label: String,

    /// Whether the body looks like an image/link/file payload
    pub is_previewable: bool,

    /// Whether the sender is the logged-in user ("我")
    pub is_own_message: bool,

    /// The row's content cell; same validity rules as [`ChatEntry::element`].
    #[serde(skip)]
    pub element: E,
}

/// Messages sharing one date label, in their original order.
///
/// Derived purely for rendering; see [`crate::message::group_messages`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct MessageGroup<E> {
    pub date_label: String,
    pub messages: Vec<MessageEntry<E>>,
}

/// Bounding rectangle of an element in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A failed platform call: which attribute (or action) and the raw code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to get attribute {attribute}: (Code: {code})")]
pub struct PlatformFailure {
    pub attribute: String,
    pub code: i32,
}

impl PlatformFailure {
    pub fn new(attribute: impl Into<String>, code: i32) -> Self {
        PlatformFailure {
            attribute: attribute.into(),
            code,
        }
    }
}

/// Outcome of a read against the live UI tree.
///
/// Absence is an expected result (UI not ready, wrong dialect, app not
/// focused), so it is a variant rather than an error; call sites match on
/// it instead of relying on null propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    PlatformError(PlatformFailure),
}

impl<T> Lookup<T> {
    /// Returns `true` for [`Lookup::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Collapses the outcome into an `Option`, dropping the failure detail.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::PlatformError(_) => None,
        }
    }

    /// Like [`Lookup::found`], but logs a platform failure at debug level first.
    pub fn found_or_log(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
            Lookup::PlatformError(failure) => {
                log::debug!("[WX-AX] {}", failure);
                None
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::PlatformError(failure) => Lookup::PlatformError(failure),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Lookup<U>) -> Lookup<U> {
        match self {
            Lookup::Found(value) => f(value),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::PlatformError(failure) => Lookup::PlatformError(failure),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.found().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

/// Process-level errors.
///
/// Nothing inside a decode pass produces these; they cover the setup
/// around it (permissions, finding the app, loading files).
#[derive(Debug, Error)]
pub enum WeChatError {
    /// Accessibility permission not granted
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// WeChat is not running
    #[error("Application not found: {0}")]
    AppNotFound(String),

    /// WeChat is running but its main window could not be found
    #[error("Main window not found: {0}")]
    WindowNotFound(String),

    /// The requested dialect has no role-path table
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// A recorded UI snapshot could not be read or parsed
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Platform-specific error (macOS API error)
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformFailure),

    /// Change notifications could not be registered
    #[error("Observer error: {0}")]
    Observer(String),

    /// The current platform has no live accessibility backend
    #[error("Platform not supported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
