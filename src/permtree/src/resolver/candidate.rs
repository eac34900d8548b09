//! Candidate descents and their ranking

use crate::permission::Permission;

/// How one query segment was consumed
///
/// Ordered so that `Literal > Wildcard`: comparing two routes of equal
/// length with `Ord` yields the more specific one as the greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Consumed by a wildcard edge
    Wildcard,
    /// Consumed by a literal edge equal to the segment
    Literal,
}

/// Deepest node carrying a permission along a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Inherited {
    pub depth: usize,
    pub permission: Permission,
}

/// One maximal descent through the rule tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    /// Literal/wildcard choice per consumed segment
    pub route: Vec<Step>,
    /// Whether the whole query path was consumed
    pub full: bool,
    /// Permission on the node the descent ended at
    pub terminal: Option<Permission>,
    /// Deepest permission along the route, terminal and root included
    pub inherited: Option<Inherited>,
}

impl Candidate {
    pub fn depth(&self) -> usize {
        self.route.len()
    }

    /// Ranking key: depth reached, then leftmost-divergence-literal-wins
    fn rank(&self) -> (usize, &[Step]) {
        (self.depth(), &self.route)
    }

    /// Returns `true` if this candidate ranks strictly above `other`
    pub fn outranks(&self, other: &Candidate) -> bool {
        self.rank() > other.rank()
    }
}
