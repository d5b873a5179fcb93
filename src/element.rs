//! The accessible-element capability interface.
//!
//! Everything above the platform layer (locator, decoders, session) talks
//! to the UI tree only through [`AccessibleElement`]. The live macOS backend
//! wraps `AXUIElement`; [`crate::snapshot::SnapshotElement`] replays a
//! recorded tree in memory.
//!
//! Handles carry no identity beyond the platform handle itself and are
//! never kept past one logical operation.

use crate::roles::{RoleStep, PRESS_ACTION};
use crate::types::{Frame, Lookup, PlatformFailure};

/// A node of a hierarchical, attributed UI tree.
///
/// Reads return [`Lookup`] so that "attribute missing" and "platform call
/// failed" stay distinguishable; writes return the failure and callers log
/// it and carry on.
pub trait AccessibleElement: Clone {
    /// `AXRole`
    fn role(&self) -> Lookup<String>;

    /// `AXTitle`, the flattened label WeChat packs row metadata into
    fn title(&self) -> Lookup<String>;

    /// `AXDescription`
    fn description(&self) -> Lookup<String>;

    /// `AXHelp`
    fn help(&self) -> Lookup<String>;

    /// `AXValue` read as an integer (buttons report 0/1)
    fn numeric_value(&self) -> Lookup<i64>;

    /// `AXIndex`, the row position inside its table
    fn index(&self) -> Lookup<usize>;

    /// Direct children, in platform order. Empty on failure.
    fn children(&self) -> Vec<Self>;

    /// `AXParent`
    fn parent(&self) -> Lookup<Self>;

    /// `AXRows` of a table. Empty on failure.
    fn rows(&self) -> Vec<Self>;

    /// `AXVisibleRows` of a table. Empty on failure.
    fn visible_rows(&self) -> Vec<Self>;

    /// `AXWindows` of an application element. Empty on failure.
    fn windows(&self) -> Vec<Self>;

    /// `AXSelected`; unreadable counts as not selected.
    fn is_selected(&self) -> bool;

    /// Write `AXSelected`.
    fn set_selected(&self, selected: bool) -> Result<(), PlatformFailure>;

    /// Write `AXValue` as a string (text areas).
    fn set_text_value(&self, text: &str) -> Result<(), PlatformFailure>;

    /// Names of the actions the element supports. Empty on failure.
    fn action_names(&self) -> Vec<String>;

    /// Perform the named action.
    fn perform_action(&self, action: &str) -> Result<(), PlatformFailure>;

    /// `AXFrame`
    fn frame(&self) -> Lookup<Frame>;

    /// Direct children whose role satisfies `step`.
    ///
    /// Children whose role cannot be read are skipped.
    fn children_matching(&self, step: RoleStep) -> Vec<Self> {
        self.children()
            .into_iter()
            .filter(|child| match child.role() {
                Lookup::Found(role) => step.matches(&role),
                Lookup::NotFound | Lookup::PlatformError(_) => false,
            })
            .collect()
    }

    /// Press the element if it advertises `AXPress`.
    ///
    /// Returns `true` if the action was performed.
    fn press(&self) -> bool {
        if !self.action_names().iter().any(|a| a == PRESS_ACTION) {
            log::debug!("[WX-AX] Element does not support {}", PRESS_ACTION);
            return false;
        }
        match self.perform_action(PRESS_ACTION) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[WX-AX] Press failed: {}", e);
                false
            }
        }
    }

    /// Walk `levels` parents up.
    fn ancestor(&self, levels: usize) -> Lookup<Self> {
        let mut current = self.clone();
        for _ in 0..levels {
            current = match current.parent() {
                Lookup::Found(parent) => parent,
                other => return other,
            };
        }
        Lookup::Found(current)
    }
}
