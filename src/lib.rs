//! WeChat Extractor - read and drive the WeChat desktop client through the
//! macOS Accessibility API.
//!
//! # Overview
//!
//! WeChat exposes no automation API, but its window is a regular
//! accessibility tree. This crate finds the interesting parts of that tree
//! (chat list, message table, input box) by role paths that differ between
//! client versions, and decodes the flattened labels WeChat puts on them
//! into chats and messages.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use wechat_extractor::{UnreadPolicy, WeChatExtractor};
//!
//! let locator = WeChatExtractor::locator("v40", 100)?;
//! let mut session = WeChatExtractor::open_snapshot(
//!     Path::new("wechat.json"),
//!     locator,
//!     UnreadPolicy::default(),
//! )?;
//! for chat in session.list_chats(false) {
//!     println!("{} ({} unread)", chat.title, chat.unread_count);
//! }
//! # Ok::<(), wechat_extractor::WeChatError>(())
//! ```
//!
//! # Modules
//!
//! - [`types`]: Entries, [`Lookup`] and the error type
//! - [`element`]: The [`AccessibleElement`] abstraction over UI elements
//! - [`roles`]: Role constants and per-dialect role paths
//! - [`locator`]: Breadth-first role-path search
//! - [`chat`]: Chat-list label decoding and unread accounting
//! - [`message`]: Message label decoding and date grouping
//! - [`session`]: List, show, send and preview operations
//! - [`render`]: Text and JSON output
//! - [`snapshot`]: Recorded UI trees for replay and tests
//! - [`monitor`]: Notification debouncing
//! - [`config`]: TOML configuration
//! - [`extractor`]: Cross-platform entry points
//! - `platform`: The live macOS backend (macOS only)

pub mod chat;
pub mod config;
pub mod element;
pub mod extractor;
pub mod locator;
pub mod message;
pub mod monitor;
pub mod render;
pub mod roles;
pub mod session;
pub mod snapshot;
pub mod types;

pub mod platform;

pub use chat::{UnreadBudget, UnreadPolicy};
pub use config::Config;
pub use element::AccessibleElement;
pub use extractor::WeChatExtractor;
pub use locator::Locator;
pub use render::OutputFormat;
pub use roles::{PathTarget, RolePathTable, RoleStep};
pub use session::{ChatSession, FilterPriming, Host};
pub use snapshot::{NodeSpec, SnapshotElement, SnapshotHost};
pub use types::{ChatEntry, Frame, Lookup, MessageEntry, MessageGroup, PlatformFailure, WeChatError};
