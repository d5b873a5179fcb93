//! Role constants and the per-dialect role-path table.
//!
//! WeChat exposes no stable identifiers, so every widget the crate needs is
//! reached by descending through a fixed sequence of structural roles. The
//! sequences differ between client versions ("dialects"); they live here as
//! data so that supporting another dialect means adding a table, not code.

use std::fmt;

pub const SPLIT_GROUP: &str = "AXSplitGroup";
pub const SCROLL_AREA: &str = "AXScrollArea";
pub const TABLE: &str = "AXTable";
pub const ROW: &str = "AXRow";
pub const CELL: &str = "AXCell";
pub const GROUP: &str = "AXGroup";
pub const BUTTON: &str = "AXButton";
pub const RADIO_BUTTON: &str = "AXRadioButton";
pub const TEXT_AREA: &str = "AXTextArea";
pub const IMAGE: &str = "AXImage";
pub const WINDOW: &str = "AXWindow";
/// Role WeChat reports for the content view inside a message cell.
pub const UNKNOWN: &str = "AXUnknown";

/// Action name for activating buttons and cells.
pub const PRESS_ACTION: &str = "AXPress";

/// One step of a role path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleStep {
    /// Only children with exactly this role
    Role(&'static str),
    /// Any child, whatever its role
    Any,
}

impl RoleStep {
    /// Check if a child with `role` satisfies this step (case-sensitive).
    pub fn matches(&self, role: &str) -> bool {
        match self {
            RoleStep::Role(expected) => *expected == role,
            RoleStep::Any => true,
        }
    }
}

impl fmt::Display for RoleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleStep::Role(role) => f.write_str(role),
            RoleStep::Any => f.write_str("*"),
        }
    }
}

/// Named widgets the crate needs to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathTarget {
    /// The chat list table, from the main window
    ChatListTable,
    /// The title element inside a chat list row
    ChatTitleInRow,
    /// The title element of the selected row (same path as `ChatTitleInRow`)
    ChatTitle,
    /// The sidebar "chats" filter button, from the main window
    ChatButton,
    /// The message input box, from the main window
    ChatInput,
    /// The message table, from the main window
    ChatViewTable,
    /// The content cell inside a message row
    MessageInRow,
    /// The logged-in user's avatar button, from the main window
    AvatarButton,
}

impl PathTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathTarget::ChatListTable => "chatListTable",
            PathTarget::ChatTitleInRow => "chatTitleInRow",
            PathTarget::ChatTitle => "chatTitle",
            PathTarget::ChatButton => "chatButton",
            PathTarget::ChatInput => "chatInput",
            PathTarget::ChatViewTable => "chatViewTable",
            PathTarget::MessageInRow => "messageInRow",
            PathTarget::AvatarButton => "avatarButton",
        }
    }
}

impl fmt::Display for PathTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role sequence: immutable, non-empty for every defined target.
pub type RoleSequence = &'static [RoleStep];

type DialectTable = &'static [(PathTarget, RoleSequence)];

use self::RoleStep::Role;

const V38: DialectTable = &[
    (PathTarget::ChatListTable, &[Role(SPLIT_GROUP), Role(SCROLL_AREA), Role(TABLE)]),
    (PathTarget::ChatTitleInRow, &[Role(CELL), Role(ROW)]),
    (PathTarget::ChatTitle, &[Role(CELL), Role(ROW)]),
    (PathTarget::ChatButton, &[Role(RADIO_BUTTON)]),
    (PathTarget::ChatInput, &[Role(SPLIT_GROUP), Role(SPLIT_GROUP), Role(SCROLL_AREA), Role(TEXT_AREA)]),
    (PathTarget::ChatViewTable, &[Role(SPLIT_GROUP), Role(SPLIT_GROUP), Role(SCROLL_AREA), Role(TABLE)]),
    (PathTarget::MessageInRow, &[Role(CELL), Role(UNKNOWN)]),
    (PathTarget::AvatarButton, &[Role(BUTTON)]),
];

// v40 moved the filter button into a group.
const V40: DialectTable = &[
    (PathTarget::ChatListTable, &[Role(SPLIT_GROUP), Role(SCROLL_AREA), Role(TABLE)]),
    (PathTarget::ChatTitleInRow, &[Role(CELL), Role(ROW)]),
    (PathTarget::ChatTitle, &[Role(CELL), Role(ROW)]),
    (PathTarget::ChatButton, &[Role(GROUP), Role(BUTTON)]),
    (PathTarget::ChatInput, &[Role(SPLIT_GROUP), Role(SPLIT_GROUP), Role(SCROLL_AREA), Role(TEXT_AREA)]),
    (PathTarget::ChatViewTable, &[Role(SPLIT_GROUP), Role(SPLIT_GROUP), Role(SCROLL_AREA), Role(TABLE)]),
    (PathTarget::MessageInRow, &[Role(CELL), Role(UNKNOWN)]),
    (PathTarget::AvatarButton, &[Role(BUTTON)]),
];

const DIALECTS: &[(&str, DialectTable)] = &[("v38", V38), ("v40", V40)];

/// Dialect used when nothing else is configured.
pub const DEFAULT_DIALECT: &str = "v40";

/// Per-dialect lookup of role sequences.
pub struct RolePathTable;

impl RolePathTable {
    /// Look up the role sequence for `target` in dialect `version`.
    ///
    /// Unknown versions and targets return an empty sequence. Callers treat
    /// that exactly like a locator miss ("not supported in this dialect").
    ///
    /// # Examples
    ///
    /// ```
    /// use wechat_extractor::roles::{PathTarget, RolePathTable, RoleStep};
    ///
    /// let path = RolePathTable::role_sequence("v38", PathTarget::ChatButton);
    /// assert_eq!(path, &[RoleStep::Role("AXRadioButton")]);
    ///
    /// assert!(RolePathTable::role_sequence("v12", PathTarget::ChatButton).is_empty());
    /// ```
    pub fn role_sequence(version: &str, target: PathTarget) -> RoleSequence {
        DIALECTS
            .iter()
            .find(|(name, _)| *name == version)
            .and_then(|(_, table)| table.iter().find(|(t, _)| *t == target))
            .map(|(_, sequence)| *sequence)
            .unwrap_or(&[])
    }

    /// Check if `version` has a table.
    pub fn is_supported(version: &str) -> bool {
        DIALECTS.iter().any(|(name, _)| *name == version)
    }

    /// Names of all dialects with a table.
    pub fn supported_versions() -> Vec<&'static str> {
        DIALECTS.iter().map(|(name, _)| *name).collect()
    }
}
