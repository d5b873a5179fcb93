//! Role-path element search.
//!
//! Descends from a root element one role step per tree level, keeping every
//! child that matches (breadth-first frontier). The locator never throws:
//! an empty result means "not here in this dialect" and callers degrade.

use crate::element::AccessibleElement;
use crate::roles::{PathTarget, RolePathTable, RoleStep};

/// Maximum recursion depth to prevent stack overflow on deeply nested UIs
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Find every element reached from `root` by following `sequence`.
///
/// Level `k` keeps the children of level `k - 1` whose role satisfies
/// `sequence[k]`. Search stops when the roles are exhausted, the frontier
/// empties or `max_depth` levels have been expanded; in the last case the
/// current frontier is returned.
///
/// # Arguments
///
/// * `root` - Element the search starts from (level 0)
/// * `sequence` - One role step per level below `root`
/// * `max_depth` - Number of levels that may be expanded
///
/// # Returns
///
/// The final frontier in tree order. An empty `sequence` leaves the
/// frontier at `[root]`.
///
/// # Example
///
/// ```
/// use wechat_extractor::locator::locate;
/// use wechat_extractor::snapshot::{NodeSpec, SnapshotElement};
/// use wechat_extractor::{AccessibleElement, Lookup, RoleStep};
///
/// let window = SnapshotElement::build(NodeSpec::new("AXWindow").with_children(vec![
///     NodeSpec::new("AXGroup").with_children(vec![NodeSpec::new("AXButton").with_title("微信")]),
/// ]));
///
/// let buttons = locate(&window, &[RoleStep::Role("AXGroup"), RoleStep::Role("AXButton")], 100);
/// assert_eq!(buttons.len(), 1);
/// assert_eq!(buttons[0].title(), Lookup::Found("微信".to_string()));
///
/// assert!(locate(&window, &[RoleStep::Role("AXTable")], 100).is_empty());
/// ```
pub fn locate<E: AccessibleElement>(root: &E, sequence: &[RoleStep], max_depth: usize) -> Vec<E> {
    let mut frontier = vec![root.clone()];
    for (depth, step) in sequence.iter().enumerate() {
        if depth >= max_depth {
            log::warn!(
                "[WX-LOCATOR] Max depth {} reached, stopping at {} of {} roles",
                max_depth,
                depth,
                sequence.len()
            );
            break;
        }

        frontier = frontier
            .iter()
            .flat_map(|element| element.children_matching(*step))
            .collect();

        if frontier.is_empty() {
            log::trace!("[WX-LOCATOR] No children match {} at depth {}", step, depth);
            break;
        }
    }
    frontier
}

/// The first element `locate` would return.
///
/// # Returns
///
/// `None` when the path matches nothing; callers propagate that as absence.
pub fn locate_first<E: AccessibleElement>(root: &E, sequence: &[RoleStep], max_depth: usize) -> Option<E> {
    locate(root, sequence, max_depth).into_iter().next()
}

/// Dialect-aware lookup of named targets.
#[derive(Debug, Clone)]
pub struct Locator {
    version: String,
    max_depth: usize,
}

impl Locator {
    pub fn new(version: impl Into<String>) -> Self {
        Locator {
            version: version.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// All elements of `target` under `root`.
    ///
    /// A target undefined for this dialect returns empty without touching
    /// the tree.
    ///
    /// # Example
    ///
    /// ```
    /// use wechat_extractor::snapshot::{NodeSpec, SnapshotElement};
    /// use wechat_extractor::{Locator, PathTarget};
    ///
    /// let window = SnapshotElement::build(NodeSpec::new("AXWindow").with_children(vec![
    ///     NodeSpec::new("AXGroup").with_children(vec![
    ///         NodeSpec::new("AXButton").with_help("微信"),
    ///         NodeSpec::new("AXButton").with_help("通讯录"),
    ///     ]),
    /// ]));
    ///
    /// assert_eq!(Locator::new("v40").find_elements(&window, PathTarget::ChatButton).len(), 2);
    /// assert!(Locator::new("v12").find_elements(&window, PathTarget::ChatButton).is_empty());
    /// ```
    pub fn find_elements<E: AccessibleElement>(&self, root: &E, target: PathTarget) -> Vec<E> {
        let sequence = RolePathTable::role_sequence(&self.version, target);
        if sequence.is_empty() {
            log::debug!("[WX-LOCATOR] {} is not defined for dialect {}", target, self.version);
            return Vec::new();
        }

        let found = locate(root, sequence, self.max_depth);
        if found.is_empty() {
            log::debug!("[WX-LOCATOR] {} not found ({} roles)", target, sequence.len());
        }
        found
    }

    /// First element of `target` under `root`.
    pub fn find_element<E: AccessibleElement>(&self, root: &E, target: PathTarget) -> Option<E> {
        self.find_elements(root, target).into_iter().next()
    }
}
