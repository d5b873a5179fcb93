//! Chat session orchestration.
//!
//! [`ChatSession`] strings the locator and the decoders together into the
//! four user-facing operations (list, show, send, preview). Everything that
//! is not tree walking (finding the app, activating a window, injecting
//! the submit key) is delegated to a [`Host`].
//!
//! Every operation starts the same way: find the main window, prime the
//! chat filter (which also seeds the unread budget), find the chat list
//! table. A missing window or table ends the operation with an empty
//! result. A missing filter button only zeroes the budget, but more than
//! one matching button ends the operation too.

use crate::chat::{decode_chat_entry, parse_unread_summary, UnreadBudget, UnreadPolicy};
use crate::element::AccessibleElement;
use crate::locator::Locator;
use crate::message::{decode_messages, row_index};
use crate::roles::PathTarget;
use crate::types::{ChatEntry, Lookup, MessageEntry};

/// Title prefix of WeChat's main window ("微信 (<account>)")
pub const MAIN_WINDOW_PREFIX: &str = "微信 (";

/// Help text of the sidebar button that shows the chat list
pub const CHAT_BUTTON_HELP: &str = "微信";

/// Levels between a chat row's title element and the row itself
const TITLE_TO_ROW: usize = 2;

/// Outcome of priming the chat filter button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPriming {
    /// Exactly one button; its unread summary seeds the budget
    Primed(UnreadBudget),
    /// No button. Listing goes on with an empty budget.
    Missing,
    /// This many buttons matched. The operation is abandoned.
    Ambiguous(usize),
}

/// Platform services the session needs beyond the element tree.
pub trait Host {
    type Element: AccessibleElement;

    /// The application element whose windows are searched.
    fn application(&self) -> Lookup<Self::Element>;

    /// Bring `window` to the front.
    fn activate(&self, window: &Self::Element);

    /// Submit whatever was typed into `input`.
    fn submit(&self, input: &Self::Element);
}

/// One caller, one client: list, show, send and preview chats.
pub struct ChatSession<H: Host> {
    host: H,
    locator: Locator,
    policy: UnreadPolicy,
    window: Option<H::Element>,
}

impl<H: Host> ChatSession<H> {
    pub fn new(host: H, locator: Locator, policy: UnreadPolicy) -> Self {
        ChatSession {
            host,
            locator,
            policy,
            window: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The main window, found once and then reused.
    pub fn main_window(&mut self) -> Lookup<H::Element> {
        if let Some(window) = &self.window {
            return Lookup::Found(window.clone());
        }

        let app = match self.host.application() {
            Lookup::Found(app) => app,
            other => return other,
        };

        let window = app.windows().into_iter().find(|window| {
            window
                .title()
                .found()
                .map(|title| title.starts_with(MAIN_WINDOW_PREFIX))
                .unwrap_or(false)
        });

        match window {
            Some(window) => {
                log::debug!("[WX-SESSION] Main window found");
                self.host.activate(&window);
                self.window = Some(window.clone());
                Lookup::Found(window)
            }
            None => {
                log::warn!("[WX-SESSION] No window titled '{}...'", MAIN_WINDOW_PREFIX);
                Lookup::NotFound
            }
        }
    }

    /// Activate the chat filter button and read the unread budget off it.
    ///
    /// The button is the one [`PathTarget::ChatButton`] element whose help
    /// text is "微信". It is pressed when it reports itself inactive
    /// (`AXValue == 0`).
    ///
    /// # Returns
    ///
    /// - [`FilterPriming::Primed`] with the budget parsed from the button's
    ///   description
    /// - [`FilterPriming::Missing`] when no such button exists
    /// - [`FilterPriming::Ambiguous`] when more than one does; nothing is
    ///   pressed
    pub fn prime_filter(&self, window: &H::Element) -> FilterPriming {
        let buttons: Vec<H::Element> = self
            .locator
            .find_elements(window, PathTarget::ChatButton)
            .into_iter()
            .filter(|button| button.help().found().as_deref() == Some(CHAT_BUTTON_HELP))
            .collect();

        let button = match buttons.as_slice() {
            [button] => button,
            [] => {
                log::warn!("[WX-SESSION] Chat filter button not found");
                return FilterPriming::Missing;
            }
            _ => {
                log::error!(
                    "[WX-SESSION] There are multiple buttons labeled {} chats ({} found)",
                    CHAT_BUTTON_HELP,
                    buttons.len()
                );
                return FilterPriming::Ambiguous(buttons.len());
            }
        };

        let budget = button
            .description()
            .found_or_log()
            .map(|description| parse_unread_summary(&description))
            .unwrap_or_default();

        if let Lookup::Found(0) = button.numeric_value() {
            log::debug!("[WX-SESSION] Chat filter inactive, pressing it");
            button.press();
        }

        log::debug!(
            "[WX-SESSION] Unread budget {} (any unread: {})",
            budget.remaining,
            budget.any_unread
        );
        FilterPriming::Primed(budget)
    }

    /// Window, primed budget and chat list table, or the reason for absence.
    fn open_chat_list(&mut self) -> Lookup<(H::Element, H::Element, UnreadBudget)> {
        let window = match self.main_window() {
            Lookup::Found(window) => window,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::PlatformError(failure) => return Lookup::PlatformError(failure),
        };

        let budget = match self.prime_filter(&window) {
            FilterPriming::Primed(budget) => budget,
            FilterPriming::Missing => UnreadBudget::empty(),
            FilterPriming::Ambiguous(_) => return Lookup::NotFound,
        };

        match self.locator.find_element(&window, PathTarget::ChatListTable) {
            Some(table) => Lookup::Found((window, table, budget)),
            None => {
                log::warn!("[WX-SESSION] Chat list table not found");
                Lookup::NotFound
            }
        }
    }

    /// Decode a row set with its own copy of the budget.
    pub fn decode_rows(&self, rows: &[H::Element], budget: UnreadBudget) -> Vec<ChatEntry<H::Element>> {
        let mut budget = budget;
        rows.iter()
            .enumerate()
            .filter_map(|(position, row)| {
                let title = self.locator.find_element(row, PathTarget::ChatTitleInRow)?;
                decode_chat_entry(title, row_index(row, position), &mut budget, self.policy)
            })
            .collect()
    }

    /// The chat of the currently selected row, if any.
    pub fn selected_chat(&self, rows: &[H::Element], budget: UnreadBudget) -> Option<ChatEntry<H::Element>> {
        let (position, row) = rows.iter().enumerate().find(|(_, row)| row.is_selected())?;
        let title = self.locator.find_element(row, PathTarget::ChatTitle)?;
        let mut budget = budget;
        decode_chat_entry(title, row_index(row, position), &mut budget, self.policy)
    }

    /// Resolve the chat named `title`, selecting it if needed.
    ///
    /// An already-selected row wins only if its title matches; otherwise
    /// the visible rows and then all rows are searched, and the match is
    /// selected.
    pub fn locate_chat(
        &self,
        title: &str,
        visible_rows: &[H::Element],
        all_rows: &[H::Element],
        budget: UnreadBudget,
    ) -> Option<ChatEntry<H::Element>> {
        let selected = self
            .selected_chat(visible_rows, budget)
            .or_else(|| self.selected_chat(all_rows, budget));

        if let Some(chat) = selected {
            if chat.title == title {
                log::debug!("[WX-SESSION] '{}' is already selected", title);
                return Some(chat);
            }
            log::debug!("[WX-SESSION] Selected chat is '{}', searching for '{}'", chat.title, title);
        }

        let chat = self
            .decode_rows(visible_rows, budget)
            .into_iter()
            .find(|chat| chat.title == title)
            .or_else(|| {
                self.decode_rows(all_rows, budget)
                    .into_iter()
                    .find(|chat| chat.title == title)
            });

        match chat {
            Some(chat) => {
                self.select(&chat);
                Some(chat)
            }
            None => {
                log::info!("[WX-SESSION] Chat '{}' not found", title);
                None
            }
        }
    }

    fn select(&self, chat: &ChatEntry<H::Element>) {
        let row = match chat.element.ancestor(TITLE_TO_ROW) {
            Lookup::Found(row) => row,
            Lookup::NotFound => {
                log::warn!("[WX-SESSION] Row of '{}' not found", chat.title);
                return;
            }
            Lookup::PlatformError(failure) => {
                log::warn!("[WX-SESSION] Row of '{}': {}", chat.title, failure);
                return;
            }
        };
        if row.is_selected() {
            return;
        }
        if let Err(failure) = row.set_selected(true) {
            log::warn!("[WX-SESSION] Selecting '{}' failed: {}", chat.title, failure);
        }
    }

    fn table_rows(table: &H::Element, only_visible: bool) -> Vec<H::Element> {
        if only_visible {
            table.visible_rows()
        } else {
            table.rows()
        }
    }

    /// Resolve a chat inside an opened chat list.
    fn resolve(&mut self, title: &str) -> Lookup<(H::Element, ChatEntry<H::Element>)> {
        let (window, table, budget) = match self.open_chat_list() {
            Lookup::Found(opened) => opened,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::PlatformError(failure) => return Lookup::PlatformError(failure),
        };
        let visible_rows = table.visible_rows();
        let all_rows = table.rows();

        self.locate_chat(title, &visible_rows, &all_rows, budget)
            .map(|chat| (window, chat))
            .into()
    }

    /// Every chat in the list (or only the visible ones).
    ///
    /// # Returns
    ///
    /// Entries in row order, decoded against one budget copy. Empty when
    /// the window, the chat list or an unambiguous filter button is absent.
    ///
    /// # Example
    ///
    /// ```
    /// use wechat_extractor::snapshot::{NodeSpec, SnapshotElement, SnapshotHost};
    /// use wechat_extractor::{ChatSession, Locator, UnreadPolicy};
    ///
    /// let row = NodeSpec::new("AXRow").with_children(vec![NodeSpec::new("AXCell")
    ///     .with_children(vec![NodeSpec::new("AXRow").with_title("Alice,1条未读消息,hi,13:09")])]);
    /// let filter = NodeSpec::new("AXButton")
    ///     .with_help("微信")
    ///     .with_description("微信, 1条未读消息")
    ///     .with_value(1);
    /// let app = SnapshotElement::build(NodeSpec::new("AXApplication").with_children(vec![
    ///     NodeSpec::new("AXWindow").with_title("微信 (wxid)").with_children(vec![
    ///         NodeSpec::new("AXGroup").with_children(vec![filter]),
    ///         NodeSpec::new("AXSplitGroup").with_children(vec![NodeSpec::new("AXScrollArea")
    ///             .with_children(vec![NodeSpec::new("AXTable").with_children(vec![row])])]),
    ///     ]),
    /// ]));
    ///
    /// let mut session = ChatSession::new(SnapshotHost::new(app), Locator::new("v40"), UnreadPolicy::BudgetGated);
    /// let chats = session.list_chats(false);
    /// assert_eq!(chats.len(), 1);
    /// assert_eq!(chats[0].title, "Alice");
    /// assert_eq!(chats[0].unread_count, 1);
    /// ```
    pub fn list_chats(&mut self, only_visible: bool) -> Vec<ChatEntry<H::Element>> {
        let (_, table, budget) = match self.open_chat_list() {
            Lookup::Found(opened) => opened,
            Lookup::NotFound | Lookup::PlatformError(_) => return Vec::new(),
        };

        let rows = Self::table_rows(&table, only_visible);
        let chats = self.decode_rows(&rows, budget);
        log::info!("[WX-SESSION] Listed {} chats from {} rows", chats.len(), rows.len());
        chats
    }

    /// Resolve a chat and decode its messages.
    ///
    /// A chat whose message table cannot be found is returned without
    /// messages.
    ///
    /// # Arguments
    ///
    /// * `title` - Exact chat title to resolve
    /// * `only_visible` - Decode only the message rows on screen
    ///
    /// # Returns
    ///
    /// The selected chat with its messages, or `NotFound` when no row
    /// carries `title`.
    pub fn show(&mut self, title: &str, only_visible: bool) -> Lookup<ChatEntry<H::Element>> {
        let (window, mut chat) = match self.resolve(title) {
            Lookup::Found(resolved) => resolved,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::PlatformError(failure) => return Lookup::PlatformError(failure),
        };

        match self.locator.find_element(&window, PathTarget::ChatViewTable) {
            Some(table) => {
                let rows = Self::table_rows(&table, only_visible);
                chat.messages = decode_messages(&self.locator, &rows);
            }
            None => log::warn!("[WX-SESSION] Message table not found for '{}'", title),
        }
        Lookup::Found(chat)
    }

    /// Resolve a chat, type `text` into its input box and submit it.
    ///
    /// # Returns
    ///
    /// - `Found` with the chat the text was sent to
    /// - `NotFound` when the chat or its input box is missing; nothing is typed
    /// - `PlatformError` when writing the text failed; nothing is submitted
    pub fn send(&mut self, title: &str, text: &str) -> Lookup<ChatEntry<H::Element>> {
        let (window, chat) = match self.resolve(title) {
            Lookup::Found(resolved) => resolved,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::PlatformError(failure) => return Lookup::PlatformError(failure),
        };

        let Some(input) = self.locator.find_element(&window, PathTarget::ChatInput) else {
            log::warn!("[WX-SESSION] Input box not found for '{}'", title);
            return Lookup::NotFound;
        };
        if let Err(failure) = input.set_text_value(text) {
            log::warn!("[WX-SESSION] Writing message failed: {}", failure);
            return Lookup::PlatformError(failure);
        }
        self.host.submit(&input);
        log::info!("[WX-SESSION] Sent {} chars to '{}'", text.chars().count(), title);
        Lookup::Found(chat)
    }

    /// Resolve a chat and press the message with position index `index`.
    ///
    /// # Returns
    ///
    /// The pressed message, or `NotFound` when the chat is missing or has
    /// no message at `index` (date separators are not messages).
    pub fn preview_message(
        &mut self,
        title: &str,
        index: usize,
        only_visible: bool,
    ) -> Lookup<MessageEntry<H::Element>> {
        let chat = match self.show(title, only_visible) {
            Lookup::Found(chat) => chat,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::PlatformError(failure) => return Lookup::PlatformError(failure),
        };

        let Some(message) = chat.messages.into_iter().find(|m| m.sequence_index == index) else {
            log::info!("[WX-SESSION] No message {} in '{}'", index, title);
            return Lookup::NotFound;
        };
        if !message.element.press() {
            log::warn!("[WX-SESSION] Message {} in '{}' could not be pressed", index, title);
        }
        Lookup::Found(message)
    }
}
