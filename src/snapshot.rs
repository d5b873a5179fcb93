//! Recorded UI trees.
//!
//! A snapshot is a JSON tree of [`NodeSpec`] nodes, typically captured from
//! the live client with `wechat-ax dump`. [`SnapshotElement`] serves such a
//! tree through [`AccessibleElement`], so every session operation can run
//! offline: against fixtures in tests, or with `--snapshot` when
//! diagnosing a dialect mismatch.
//!
//! Writes (selection, text, presses, submits) mutate the in-memory tree and
//! are appended to a shared [`Journal`].

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::element::AccessibleElement;
use crate::roles::{PRESS_ACTION, ROW, WINDOW};
use crate::session::Host;
use crate::types::{Frame, Lookup, PlatformFailure, WeChatError};

fn default_visible() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Serialized form of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    /// Rows only: whether the row is in the table's visible set
    #[serde(default = "default_visible", skip_serializing_if = "is_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(role: impl Into<String>) -> Self {
        NodeSpec {
            role: role.into(),
            title: None,
            description: None,
            help: None,
            value: None,
            index: None,
            selected: false,
            visible: true,
            frame: None,
            actions: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_actions(mut self, actions: &[&str]) -> Self {
        self.actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSpec>) -> Self {
        self.children = children;
        self
    }
}

/// A write performed against a snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Pressed { role: String, title: Option<String> },
    Selected { title: Option<String>, selected: bool },
    TextWritten(String),
    Submitted(String),
    Activated,
}

/// Shared record of everything done to one tree.
#[derive(Debug, Default)]
pub struct Journal {
    entries: RefCell<Vec<JournalEntry>>,
    children_reads: Cell<usize>,
}

impl Journal {
    fn push(&self, entry: JournalEntry) {
        self.entries.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.borrow().clone()
    }
}

struct Node {
    role: String,
    title: Option<String>,
    description: Option<String>,
    help: Option<String>,
    value: Cell<Option<i64>>,
    index: Option<usize>,
    selected: Cell<bool>,
    visible: bool,
    frame: Option<Frame>,
    actions: Vec<String>,
    text: RefCell<Option<String>>,
    presses: Cell<usize>,
    parent: Weak<Node>,
    children: RefCell<Vec<Rc<Node>>>,
    journal: Rc<Journal>,
}

impl Node {
    fn build(spec: NodeSpec, parent: Weak<Node>, journal: &Rc<Journal>) -> Rc<Node> {
        let node = Rc::new(Node {
            role: spec.role,
            title: spec.title,
            description: spec.description,
            help: spec.help,
            value: Cell::new(spec.value),
            index: spec.index,
            selected: Cell::new(spec.selected),
            visible: spec.visible,
            frame: spec.frame,
            actions: spec.actions,
            text: RefCell::new(None),
            presses: Cell::new(0),
            parent,
            children: RefCell::new(Vec::new()),
            journal: Rc::clone(journal),
        });
        let children: Vec<Rc<Node>> = spec
            .children
            .into_iter()
            .map(|child| Node::build(child, Rc::downgrade(&node), journal))
            .collect();
        *node.children.borrow_mut() = children;
        node
    }
}

/// In-memory [`AccessibleElement`] over a recorded tree.
#[derive(Clone)]
pub struct SnapshotElement(Rc<Node>);

impl SnapshotElement {
    /// Build a tree and return its root.
    pub fn build(spec: NodeSpec) -> Self {
        let journal = Rc::new(Journal::default());
        SnapshotElement(Node::build(spec, Weak::new(), &journal))
    }

    pub fn from_json(json: &str) -> Result<Self, WeChatError> {
        let spec: NodeSpec =
            serde_json::from_str(json).map_err(|e| WeChatError::Snapshot(e.to_string()))?;
        Ok(Self::build(spec))
    }

    pub fn load(path: &Path) -> Result<Self, WeChatError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| WeChatError::Snapshot(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Every write made to this tree so far, oldest first.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.0.journal.entries()
    }

    /// How many times this element was pressed.
    pub fn press_count(&self) -> usize {
        self.0.presses.get()
    }

    /// Text last written with [`AccessibleElement::set_text_value`].
    pub fn written_text(&self) -> Option<String> {
        self.0.text.borrow().clone()
    }

    /// Total `children()` calls made anywhere in the tree.
    pub fn children_reads(&self) -> usize {
        self.0.journal.children_reads.get()
    }

    fn child_elements(&self) -> Vec<SnapshotElement> {
        self.0
            .children
            .borrow()
            .iter()
            .map(|child| SnapshotElement(Rc::clone(child)))
            .collect()
    }

    fn children_with_role(&self, role: &str) -> Vec<SnapshotElement> {
        self.child_elements()
            .into_iter()
            .filter(|child| child.0.role == role)
            .collect()
    }

    fn record(&self, entry: JournalEntry) {
        self.0.journal.push(entry);
    }
}

impl PartialEq for SnapshotElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SnapshotElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotElement")
            .field("role", &self.0.role)
            .field("title", &self.0.title)
            .finish()
    }
}

fn lookup_string(value: &Option<String>) -> Lookup<String> {
    value.clone().into()
}

impl AccessibleElement for SnapshotElement {
    fn role(&self) -> Lookup<String> {
        Lookup::Found(self.0.role.clone())
    }

    fn title(&self) -> Lookup<String> {
        lookup_string(&self.0.title)
    }

    fn description(&self) -> Lookup<String> {
        lookup_string(&self.0.description)
    }

    fn help(&self) -> Lookup<String> {
        lookup_string(&self.0.help)
    }

    fn numeric_value(&self) -> Lookup<i64> {
        self.0.value.get().into()
    }

    fn index(&self) -> Lookup<usize> {
        self.0.index.into()
    }

    fn children(&self) -> Vec<Self> {
        let reads = &self.0.journal.children_reads;
        reads.set(reads.get() + 1);
        self.child_elements()
    }

    fn parent(&self) -> Lookup<Self> {
        self.0.parent.upgrade().map(SnapshotElement).into()
    }

    fn rows(&self) -> Vec<Self> {
        self.children_with_role(ROW)
    }

    fn visible_rows(&self) -> Vec<Self> {
        self.children_with_role(ROW)
            .into_iter()
            .filter(|row| row.0.visible)
            .collect()
    }

    fn windows(&self) -> Vec<Self> {
        self.children_with_role(WINDOW)
    }

    fn is_selected(&self) -> bool {
        self.0.selected.get()
    }

    fn set_selected(&self, selected: bool) -> Result<(), PlatformFailure> {
        // single-selection tables: selecting a row clears its siblings
        if selected {
            if let Some(parent) = self.0.parent.upgrade() {
                for sibling in parent.children.borrow().iter() {
                    sibling.selected.set(false);
                }
            }
        }
        self.0.selected.set(selected);
        self.record(JournalEntry::Selected {
            title: self.0.title.clone(),
            selected,
        });
        Ok(())
    }

    fn set_text_value(&self, text: &str) -> Result<(), PlatformFailure> {
        *self.0.text.borrow_mut() = Some(text.to_string());
        self.record(JournalEntry::TextWritten(text.to_string()));
        Ok(())
    }

    fn action_names(&self) -> Vec<String> {
        self.0.actions.clone()
    }

    fn perform_action(&self, action: &str) -> Result<(), PlatformFailure> {
        if !self.0.actions.iter().any(|a| a == action) {
            // kAXErrorActionUnsupported
            return Err(PlatformFailure::new(action, -25206));
        }
        if action == PRESS_ACTION {
            self.0.presses.set(self.0.presses.get() + 1);
            // toggle-style buttons report 1 once activated
            if self.0.value.get() == Some(0) {
                self.0.value.set(Some(1));
            }
            self.record(JournalEntry::Pressed {
                role: self.0.role.clone(),
                title: self.0.title.clone(),
            });
        }
        Ok(())
    }

    fn frame(&self) -> Lookup<Frame> {
        self.0.frame.into()
    }
}

/// Record a live (or any) tree into a [`NodeSpec`], down to `max_depth`.
///
/// Rows missing from their table's visible set are marked invisible,
/// matched by their `AXIndex`.
pub fn record_tree<E: AccessibleElement>(root: &E, max_depth: usize) -> NodeSpec {
    record_node(root, 0, max_depth, true)
}

fn record_node<E: AccessibleElement>(element: &E, depth: usize, max_depth: usize, visible: bool) -> NodeSpec {
    let mut spec = NodeSpec::new(element.role().found_or_log().unwrap_or_default());
    spec.title = element.title().found();
    spec.description = element.description().found();
    spec.help = element.help().found();
    spec.value = element.numeric_value().found();
    spec.index = element.index().found();
    spec.selected = element.is_selected();
    spec.visible = visible;
    spec.frame = element.frame().found();
    spec.actions = element.action_names();

    if depth >= max_depth {
        return spec;
    }

    let visible_indices: Option<HashSet<usize>> = if spec.role == crate::roles::TABLE {
        Some(element.visible_rows().iter().filter_map(|row| row.index().found()).collect())
    } else {
        None
    };

    spec.children = element
        .children()
        .iter()
        .map(|child| {
            let child_visible = match (&visible_indices, child.index().found()) {
                (Some(indices), Some(index)) if child.role().found().as_deref() == Some(ROW) => {
                    indices.contains(&index)
                }
                _ => true,
            };
            record_node(child, depth + 1, max_depth, child_visible)
        })
        .collect();
    spec
}

/// [`Host`] over a recorded application tree.
///
/// The snapshot root is the application element; its `AXWindow` children
/// are the windows.
pub struct SnapshotHost {
    app: SnapshotElement,
}

impl SnapshotHost {
    pub fn new(app: SnapshotElement) -> Self {
        SnapshotHost { app }
    }

    pub fn load(path: &Path) -> Result<Self, WeChatError> {
        Ok(Self::new(SnapshotElement::load(path)?))
    }

    pub fn app(&self) -> &SnapshotElement {
        &self.app
    }
}

impl Host for SnapshotHost {
    type Element = SnapshotElement;

    fn application(&self) -> Lookup<SnapshotElement> {
        Lookup::Found(self.app.clone())
    }

    fn activate(&self, window: &SnapshotElement) {
        window.record(JournalEntry::Activated);
    }

    fn submit(&self, input: &SnapshotElement) {
        let text = input.written_text().unwrap_or_default();
        input.record(JournalEntry::Submitted(text));
    }
}
