//! Specificity-ranked permission resolution
//!
//! Every descent through the rule tree that is consistent with the query path
//! is a candidate: at each depth the literal child equal to the segment and
//! the wildcard child are both followed. Candidates are ranked by
//!
//! 1. depth reached (consuming the whole path beats stopping early), then
//! 2. specificity: the first position where two routes differ decides, and
//!    the literal edge wins.
//!
//! If the winning candidate consumed the whole path and ends on a rule, that
//! rule governs. Otherwise the deepest rule along the winning route is
//! inherited, unless the query is explicit, in which case it fails.
//!
//! # Examples
//!
//! ```
//! use permtree::{Permission, RuleTree};
//!
//! let tree = RuleTree::compile([
//!     ("e.h.g", Permission::DENY),
//!     ("e.*.g", Permission::WRITE),
//! ]).unwrap();
//!
//! assert!(!tree.check("e.h.g", Permission::READ).unwrap());
//! assert!(tree.check("e.j.g", Permission::WRITE).unwrap());
//! ```

mod candidate;
mod search;


pub use candidate::Step;

use tracing::debug;

use crate::error::Result;
use crate::path::ResourcePath;
use crate::permission::Permission;
use crate::tree::RuleTree;
use search::Search;

/// How the governing permission was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A rule matches the whole path
    Exact,
    /// Inherited from the rule at `depth` along the winning route
    Inherited { depth: usize },
    /// No rule along the winning route
    Unmatched,
    /// Explicit query without a rule matching the whole path
    Rejected,
}

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    permission: Permission,
    kind: MatchKind,
    route: Vec<Step>,
}

impl Resolution {
    /// Governing permission; empty when nothing applies
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// How the permission was found
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    /// Literal/wildcard steps of the winning candidate
    pub fn route(&self) -> &[Step] {
        &self.route
    }

    /// Returns `true` if a rule matched the whole path
    pub fn is_exact(&self) -> bool {
        self.kind == MatchKind::Exact
    }

    /// Returns `true` if every bit of `required` is granted
    ///
    /// A rejected explicit query grants nothing, not even an empty mask.
    pub fn grants(&self, required: Permission) -> bool {
        self.kind != MatchKind::Rejected && self.permission.grants(required)
    }
}

/// Resolves a parsed path against a tree
pub fn resolve_path(tree: &RuleTree, path: &ResourcePath, explicit: bool) -> Resolution {
    resolve_segments(tree, path.segments(), explicit)
}

/// Resolves already-validated segments
pub(crate) fn resolve_segments(tree: &RuleTree, segments: &[String], explicit: bool) -> Resolution {
    let best = Search::new(segments).run(tree.root());

    let resolution = match best {
        Some(candidate) => {
            let exact = if candidate.full { candidate.terminal } else { None };
            let (permission, kind) = match (exact, candidate.inherited) {
                (Some(permission), _) => (permission, MatchKind::Exact),
                (None, _) if explicit => (Permission::DENY, MatchKind::Rejected),
                (None, Some(inherited)) => (
                    inherited.permission,
                    MatchKind::Inherited {
                        depth: inherited.depth,
                    },
                ),
                (None, None) => (Permission::DENY, MatchKind::Unmatched),
            };
            Resolution {
                permission,
                kind,
                route: candidate.route,
            }
        }
        None => Resolution {
            permission: Permission::DENY,
            kind: if explicit { MatchKind::Rejected } else { MatchKind::Unmatched },
            route: Vec::new(),
        },
    };

    debug!(
        "Resolved {:?} (explicit={}): {} via {:?}",
        segments, explicit, resolution.permission, resolution.kind
    );

    resolution
}

/// Resolves a path string against a tree
pub fn resolve(tree: &RuleTree, path: &str, explicit: bool) -> Result<Resolution> {
    let path = ResourcePath::parse(path, tree.syntax())?;
    Ok(resolve_path(tree, &path, explicit))
}

/// Returns the governing permission for a path
pub fn permissions(tree: &RuleTree, path: &str, explicit: bool) -> Result<Permission> {
    Ok(resolve(tree, path, explicit)?.permission())
}

/// Checks whether `path` is granted every bit of `required`
///
/// With `explicit` set, only a rule matching the whole path can grant
/// access; inherited permissions are ignored.
pub fn check(tree: &RuleTree, path: &str, required: Permission, explicit: bool) -> Result<bool> {
    Ok(resolve(tree, path, explicit)?.grants(required))
}

impl RuleTree {
    /// Checks `path` for `required`, inheriting from ancestor rules
    pub fn check(&self, path: &str, required: Permission) -> Result<bool> {
        check(self, path, required, false)
    }

    /// Checks `path` for `required`, accepting only a rule matching the whole path
    pub fn check_explicit(&self, path: &str, required: Permission) -> Result<bool> {
        check(self, path, required, true)
    }

    /// Checks a parsed path
    pub fn check_path(&self, path: &ResourcePath, required: Permission, explicit: bool) -> bool {
        resolve_path(self, path, explicit).grants(required)
    }

    /// Resolves `path` and reports how the permission was found
    pub fn resolve(&self, path: &str, explicit: bool) -> Result<Resolution> {
        resolve(self, path, explicit)
    }

    /// Returns the governing permission for `path`
    pub fn permissions(&self, path: &str, explicit: bool) -> Result<Permission> {
        permissions(self, path, explicit)
    }
}
