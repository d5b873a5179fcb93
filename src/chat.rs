//! Chat list row decoding.
//!
//! WeChat flattens a chat list row into one comma-joined `AXTitle`:
//!
//! ```text
//! name[,消息免打扰][,置顶][,<N>条未读消息][,preview][,time]
//! ```
//!
//! The three tags are optional and may appear anywhere after the name; the
//! two content fields keep their relative order. Unread counts are
//! reconciled against a budget read from the sidebar filter button, see
//! [`UnreadBudget`] and [`UnreadPolicy`].

use lazy_static::lazy_static;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::element::AccessibleElement;
use crate::types::{ChatEntry, Lookup};

/// Fragment separator inside a row label
pub const FIELD_SEPARATOR: char = ',';

/// Tag present on chats with notifications turned off
pub const MUTED_TAG: &str = "消息免打扰";

/// Tag present on chats pinned to the top
pub const PINNED_TAG: &str = "置顶";

/// Suffix of the unread fragment ("3条未读消息")
pub const UNREAD_SUFFIX: &str = "条未读消息";

lazy_static! {
    // First "<N>条未读消息" run anywhere in the filter button's description
    static ref UNREAD_SUMMARY: Option<Regex> = Regex::new(r"(\d+)条未读消息").ok();

    // A whole row fragment that is only an unread count
    static ref UNREAD_FRAGMENT: Option<Regex> = Regex::new(r"^(\d+)条未读消息$").ok();
}

/// Running unread counter for one listing pass.
///
/// Seeded from the filter button's description and decremented as rows
/// are credited. It is a plain value: each decode pass takes its own copy,
/// so nothing leaks between passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadBudget {
    pub remaining: i64,
    /// Whether the filter button reported any unread messages at all
    pub any_unread: bool,
}

impl UnreadBudget {
    pub fn new(remaining: i64) -> Self {
        UnreadBudget {
            remaining,
            any_unread: remaining > 0,
        }
    }

    /// A budget that credits nothing under [`UnreadPolicy::BudgetGated`].
    pub fn empty() -> Self {
        UnreadBudget::default()
    }
}

/// Parse the filter button's description ("微信, 5条未读消息") into a budget.
///
/// # Returns
///
/// A budget seeded from the first `<digits>条未读消息` run; no match means
/// zero. `any_unread` is set whenever the suffix appears at all.
///
/// # Example
///
/// ```
/// use wechat_extractor::chat::parse_unread_summary;
///
/// let budget = parse_unread_summary("微信, 5条未读消息");
/// assert_eq!(budget.remaining, 5);
/// assert!(budget.any_unread);
///
/// assert_eq!(parse_unread_summary("微信").remaining, 0);
/// ```
pub fn parse_unread_summary(description: &str) -> UnreadBudget {
    let any_unread = description.contains(UNREAD_SUFFIX);
    let remaining = UNREAD_SUMMARY
        .as_ref()
        .and_then(|pattern| pattern.captures(description))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0);

    UnreadBudget { remaining, any_unread }
}

/// How a parsed unread count is credited to a chat.
///
/// WeChat builds disagree on this, so it is configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreadPolicy {
    /// Credit while the budget is positive and the chat is not muted, then
    /// subtract the credited count.
    #[default]
    BudgetGated,
    /// Credit any count greater than one; the budget is ignored.
    CountAboveOne,
    /// Like `CountAboveOne`, and also credit a count of exactly one when
    /// the filter button reported unread messages.
    CountAboveOneOrFlagged,
}

impl UnreadPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnreadPolicy::BudgetGated => "budget_gated",
            UnreadPolicy::CountAboveOne => "count_above_one",
            UnreadPolicy::CountAboveOneOrFlagged => "count_above_one_or_flagged",
        }
    }

    /// Decide the credited unread count for one row.
    fn credit(&self, count: u32, is_muted: bool, budget: &mut UnreadBudget) -> u32 {
        let accepted = match self {
            UnreadPolicy::BudgetGated => budget.remaining > 0 && !is_muted,
            UnreadPolicy::CountAboveOne => count > 1,
            UnreadPolicy::CountAboveOneOrFlagged => count > 1 || (count == 1 && budget.any_unread),
        };
        if !accepted {
            return 0;
        }
        if *self == UnreadPolicy::BudgetGated {
            budget.remaining -= i64::from(count);
        }
        count
    }
}

impl std::str::FromStr for UnreadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget_gated" => Ok(UnreadPolicy::BudgetGated),
            "count_above_one" => Ok(UnreadPolicy::CountAboveOne),
            "count_above_one_or_flagged" => Ok(UnreadPolicy::CountAboveOneOrFlagged),
            other => Err(format!("unknown unread policy: {}", other)),
        }
    }
}

/// Parse an unread fragment ("3条未读消息") into its count.
fn parse_unread_fragment(fragment: &str) -> Option<u32> {
    let caps = UNREAD_FRAGMENT.as_ref()?.captures(fragment.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

/// Decode one flattened row label into a chat entry.
///
/// Never fails: missing fields stay at their defaults. Only `budget` is
/// mutated, and only when a count is credited.
///
/// # Arguments
///
/// * `label` - The row's comma-joined `AXTitle`
/// * `display_index` - Row position, copied into the entry
/// * `budget` - Running unread budget of the current pass
/// * `policy` - How a parsed unread count is credited
/// * `element` - Handle stored in [`ChatEntry::element`]
///
/// # Returns
///
/// An entry whose title is the first fragment. The tags are stripped from
/// the remaining fragments, then preview and time are the first two left.
///
/// # Example
///
/// ```
/// use wechat_extractor::chat::{decode_chat_label, UnreadBudget, UnreadPolicy};
///
/// let mut budget = UnreadBudget::new(3);
/// let chat = decode_chat_label("Alice,2条未读消息,see you,12:30", 1, &mut budget, UnreadPolicy::BudgetGated, ());
///
/// assert_eq!(chat.title, "Alice");
/// assert_eq!(chat.unread_count, 2);
/// assert_eq!(chat.last_message_preview, "see you");
/// assert_eq!(chat.last_message_time_label, "12:30");
/// assert_eq!(budget.remaining, 1);
/// ```
pub fn decode_chat_label<E>(
    label: &str,
    display_index: usize,
    budget: &mut UnreadBudget,
    policy: UnreadPolicy,
    element: E,
) -> ChatEntry<E> {
    let mut fragments: Vec<&str> = label
        .split(FIELD_SEPARATOR)
        .filter(|fragment| !fragment.is_empty())
        .collect();

    let title = fragments.first().copied().unwrap_or_default();
    let mut entry = ChatEntry::new(title, display_index, element);
    if fragments.len() <= 1 {
        return entry;
    }

    let mut fields = fragments.split_off(1);

    if let Some(pos) = fields.iter().position(|f| *f == MUTED_TAG) {
        fields.remove(pos);
        entry.is_muted = true;
    }
    if let Some(pos) = fields.iter().position(|f| *f == PINNED_TAG) {
        fields.remove(pos);
        entry.is_pinned = true;
    }
    if let Some((pos, count)) = fields
        .iter()
        .enumerate()
        .find_map(|(pos, f)| parse_unread_fragment(f).map(|count| (pos, count)))
    {
        fields.remove(pos);
        entry.unread_count = policy.credit(count, entry.is_muted, budget);
        log::trace!(
            "[WX-CHAT] {} reports {} unread, credited {} (budget left {})",
            entry.title,
            count,
            entry.unread_count,
            budget.remaining
        );
    }

    let mut content = fields.into_iter();
    if let Some(preview) = content.next() {
        entry.last_message_preview = preview.to_string();
    }
    if let Some(time) = content.next() {
        entry.last_message_time_label = time.to_string();
    }

    entry
}

/// Decode the chat entry behind a row's title element.
///
/// # Returns
///
/// `None` only when the title itself cannot be read; see
/// [`decode_chat_label`] for the rest.
///
/// # Example
///
/// ```
/// use wechat_extractor::chat::{decode_chat_entry, UnreadBudget, UnreadPolicy};
/// use wechat_extractor::snapshot::{NodeSpec, SnapshotElement};
///
/// let title = SnapshotElement::build(NodeSpec::new("AXRow").with_title("项目群,消息免打扰,置顶,[图片],昨天"));
/// let chat = decode_chat_entry(title, 0, &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated).unwrap();
/// assert!(chat.is_muted && chat.is_pinned);
/// assert_eq!(chat.last_message_time_label, "昨天");
///
/// let untitled = SnapshotElement::build(NodeSpec::new("AXRow"));
/// assert!(decode_chat_entry(untitled, 1, &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated).is_none());
/// ```
pub fn decode_chat_entry<E: AccessibleElement>(
    title_element: E,
    display_index: usize,
    budget: &mut UnreadBudget,
    policy: UnreadPolicy,
) -> Option<ChatEntry<E>> {
    let label = match title_element.title() {
        Lookup::Found(label) => label,
        Lookup::NotFound => {
            log::debug!("[WX-CHAT] Row {} has no title", display_index);
            return None;
        }
        Lookup::PlatformError(failure) => {
            log::debug!("[WX-CHAT] Row {}: {}", display_index, failure);
            return None;
        }
    };
    Some(decode_chat_label(&label, display_index, budget, policy, title_element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn decode(label: &str, budget: &mut UnreadBudget, policy: UnreadPolicy) -> ChatEntry<()> {
        decode_chat_label(label, 0, budget, policy, ())
    }

    // ============================================================================
    // Budget priming
    // ============================================================================

    #[test]
    fn test_parse_unread_summary() {
        assert_eq!(
            parse_unread_summary("微信, 12条未读消息"),
            UnreadBudget { remaining: 12, any_unread: true }
        );
        assert_eq!(parse_unread_summary("微信"), UnreadBudget::empty());
    }

    #[test]
    fn test_unread_patterns_compile() {
        assert!(UNREAD_SUMMARY.is_some());
        assert!(UNREAD_FRAGMENT.is_some());
    }

    #[test]
    fn test_parse_unread_summary_takes_first_number() {
        assert_eq!(parse_unread_summary("3条未读消息 7条未读消息").remaining, 3);
    }

    // ============================================================================
    // Field splitting
    // ============================================================================

    #[test]
    fn test_title_only() {
        let entry = decode("文件传输助手", &mut UnreadBudget::new(5), UnreadPolicy::BudgetGated);
        assert_eq!(entry.title, "文件传输助手");
        assert!(entry.last_message_preview.is_empty());
        assert!(entry.last_message_time_label.is_empty());
    }

    #[test]
    fn test_empty_label() {
        let entry = decode("", &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated);
        assert_eq!(entry.title, "");
        assert_eq!(entry.unread_count, 0);
    }

    #[test]
    fn test_preview_and_time() {
        let entry = decode("user1,[链接] hello,13:09", &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated);
        assert_eq!(entry.title, "user1");
        assert_eq!(entry.last_message_preview, "[链接] hello");
        assert_eq!(entry.last_message_time_label, "13:09");
    }

    #[test]
    fn test_preview_without_time() {
        let entry = decode("群组1,置顶,hi", &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated);
        assert!(entry.is_pinned);
        assert_eq!(entry.last_message_preview, "hi");
        assert_eq!(entry.last_message_time_label, "");
    }

    #[test]
    fn test_empty_fragments_are_dropped() {
        let entry = decode("user1,,hello,,昨天", &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated);
        assert_eq!(entry.last_message_preview, "hello");
        assert_eq!(entry.last_message_time_label, "昨天");
    }

    #[test]
    fn test_tag_in_title_position_is_title() {
        let entry = decode("置顶,hello", &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated);
        assert_eq!(entry.title, "置顶");
        assert!(!entry.is_pinned);
        assert_eq!(entry.last_message_preview, "hello");
    }

    // ============================================================================
    // Unread reconciliation
    // ============================================================================

    #[test]
    fn test_budget_gated_credits_and_consumes() {
        let mut budget = UnreadBudget::new(5);
        let first = decode("a,3条未读消息,hi,13:00", &mut budget, UnreadPolicy::BudgetGated);
        assert_eq!(first.unread_count, 3);
        assert_eq!(budget.remaining, 2);

        let second = decode("b,2条未读消息,yo,12:00", &mut budget, UnreadPolicy::BudgetGated);
        assert_eq!(second.unread_count, 2);
        assert_eq!(budget.remaining, 0);

        let third = decode("c,4条未读消息,old,11:00", &mut budget, UnreadPolicy::BudgetGated);
        assert_eq!(third.unread_count, 0);
        assert_eq!(third.last_message_preview, "old");
        assert_eq!(budget.remaining, 0);
    }

    #[test]
    fn test_budget_gated_skips_muted() {
        let mut budget = UnreadBudget::new(5);
        let entry = decode("a,消息免打扰,3条未读消息,hi,13:00", &mut budget, UnreadPolicy::BudgetGated);
        assert!(entry.is_muted);
        assert_eq!(entry.unread_count, 0);
        assert_eq!(budget.remaining, 5);
    }

    #[test]
    fn test_count_above_one_ignores_budget_and_mute() {
        let mut budget = UnreadBudget::empty();
        let muted = decode("a,消息免打扰,3条未读消息,hi,13:00", &mut budget, UnreadPolicy::CountAboveOne);
        assert_eq!(muted.unread_count, 3);
        let single = decode("b,1条未读消息,hi,13:00", &mut budget, UnreadPolicy::CountAboveOne);
        assert_eq!(single.unread_count, 0);
        assert_eq!(budget, UnreadBudget::empty());
    }

    #[test]
    fn test_count_above_one_or_flagged() {
        let flagged = &mut parse_unread_summary("微信, 1条未读消息");
        let entry = decode("b,1条未读消息,hi,13:00", flagged, UnreadPolicy::CountAboveOneOrFlagged);
        assert_eq!(entry.unread_count, 1);

        let unflagged = &mut UnreadBudget::empty();
        let entry = decode("b,1条未读消息,hi,13:00", unflagged, UnreadPolicy::CountAboveOneOrFlagged);
        assert_eq!(entry.unread_count, 0);
    }

    #[test]
    fn test_rejected_unread_fragment_is_still_stripped() {
        let entry = decode("a,2条未读消息,hi,13:00", &mut UnreadBudget::empty(), UnreadPolicy::BudgetGated);
        assert_eq!(entry.unread_count, 0);
        assert_eq!(entry.last_message_preview, "hi");
        assert_eq!(entry.last_message_time_label, "13:00");
    }

    #[test]
    fn test_policy_from_str() {
        for policy in [
            UnreadPolicy::BudgetGated,
            UnreadPolicy::CountAboveOne,
            UnreadPolicy::CountAboveOneOrFlagged,
        ] {
            assert_eq!(policy.as_str().parse::<UnreadPolicy>(), Ok(policy));
        }
        assert!("strict".parse::<UnreadPolicy>().is_err());
    }

    // ============================================================================
    // Property tests
    // ============================================================================

    fn tag_orderings() -> impl Strategy<Value = Vec<&'static str>> {
        Just(vec![MUTED_TAG, PINNED_TAG, "3条未读消息"]).prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_title_only_label(name in "[a-zA-Z0-9\u{4e00}-\u{9fa5}]{1,12}") {
            let entry = decode(&name, &mut UnreadBudget::new(10), UnreadPolicy::BudgetGated);
            prop_assert_eq!(&entry.title, &name);
            prop_assert_eq!(entry.last_message_preview.as_str(), "");
            prop_assert_eq!(entry.last_message_time_label.as_str(), "");
            prop_assert_eq!(entry.unread_count, 0);
            prop_assert!(!entry.is_muted);
            prop_assert!(!entry.is_pinned);
        }

        #[test]
        fn prop_tags_in_any_order(tags in tag_orderings(), budget in 3i64..50) {
            let label = format!("name,{},preview,time", tags.join(","));

            let gated_budget = &mut UnreadBudget::new(budget);
            let gated = decode(&label, gated_budget, UnreadPolicy::BudgetGated);
            prop_assert_eq!(gated.title.as_str(), "name");
            prop_assert!(gated.is_muted);
            prop_assert!(gated.is_pinned);
            prop_assert_eq!(gated.last_message_preview.as_str(), "preview");
            prop_assert_eq!(gated.last_message_time_label.as_str(), "time");
            // muted chats are never credited under the budget policy
            prop_assert_eq!(gated.unread_count, 0);
            prop_assert_eq!(gated_budget.remaining, budget);

            let loose = decode(&label, &mut UnreadBudget::new(budget), UnreadPolicy::CountAboveOne);
            prop_assert_eq!(loose.unread_count, 3);
            prop_assert_eq!(loose.last_message_preview.as_str(), "preview");
            prop_assert_eq!(loose.last_message_time_label.as_str(), "time");
        }

        #[test]
        fn prop_unmuted_budget_gated_credit(budget in 3i64..50, count in 1u32..3) {
            let label = format!("name,置顶,{}条未读消息,preview,time", count);
            let running = &mut UnreadBudget::new(budget);
            let entry = decode(&label, running, UnreadPolicy::BudgetGated);
            prop_assert_eq!(entry.unread_count, count);
            prop_assert_eq!(running.remaining, budget - i64::from(count));
        }
    }
}
