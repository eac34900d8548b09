//! Rule tree compiled from a flat rule table
//!
//! Every edge of the tree is one pattern segment. A node carries a
//! permission only when some rule's pattern ends exactly there, so "no rule"
//! (`None`) and "rule that denies" (`Some(Permission::DENY)`) stay distinct.

use std::collections::HashMap;
use tracing::debug;

use crate::config::Syntax;
use crate::error::Result;
use crate::path::{Pattern, Segment};
use crate::permission::Permission;

/// Node of the rule tree
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    literals: HashMap<String, Node>,
    wildcard: Option<Box<Node>>,
    permission: Option<Permission>,
}

impl Node {
    fn child_mut(&mut self, segment: &Segment) -> &mut Node {
        match segment {
            Segment::Literal(token) => self.literals.entry(token.clone()).or_default(),
            Segment::Wildcard => self.wildcard.get_or_insert_with(Box::default),
        }
    }

    fn child(&self, segment: &Segment) -> Option<&Node> {
        match segment {
            Segment::Literal(token) => self.literal(token),
            Segment::Wildcard => self.wildcard(),
        }
    }

    /// Child reached through the literal `token`
    pub(crate) fn literal(&self, token: &str) -> Option<&Node> {
        self.literals.get(token)
    }

    /// Tokens of every literal child
    pub(crate) fn literal_keys(&self) -> impl Iterator<Item = &str> {
        self.literals.keys().map(String::as_str)
    }

    /// Child reached through the wildcard
    pub(crate) fn wildcard(&self) -> Option<&Node> {
        self.wildcard.as_deref()
    }

    /// Permission of the rule ending here, if any
    pub(crate) fn permission(&self) -> Option<Permission> {
        self.permission
    }
}

/// Immutable tree of permission rules
///
/// Built once from a rule table; replacing the table means compiling a new
/// tree. Lookups never mutate it, so a tree can be shared freely between
/// threads.
///
/// # Examples
///
/// ```
/// use permtree::{Permission, RuleTree};
///
/// let tree = RuleTree::compile([
///     ("a", Permission::READ),
///     ("a.b.*.d", Permission::DENY),
/// ]).unwrap();
///
/// assert_eq!(tree.rule_count(), 2);
/// assert_eq!(tree.depth(), 4);
/// assert_eq!(tree.rule("a.b.*.d").unwrap(), Some(Permission::DENY));
/// assert_eq!(tree.rule("a.b").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleTree {
    root: Node,
    syntax: Syntax,
    rule_count: usize,
    depth: usize,
}

impl RuleTree {
    /// Creates a tree with no rules and the default syntax
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles a rule table using the default syntax (`.` and `*`)
    ///
    /// When two rules share the same pattern, the later one wins.
    pub fn compile<I, K, P>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<Permission>,
    {
        Self::compile_with(Syntax::default(), rules)
    }

    /// Compiles a rule table under a custom syntax
    pub fn compile_with<I, K, P>(syntax: Syntax, rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<Permission>,
    {
        syntax.validate()?;

        let mut tree = Self {
            root: Node::default(),
            syntax,
            rule_count: 0,
            depth: 0,
        };

        for (key, permission) in rules {
            let pattern = Pattern::parse(key.as_ref(), &tree.syntax)?;
            tree.insert(&pattern, permission.into());
        }

        debug!(
            "Compiled rule tree: {} rules, depth {}",
            tree.rule_count, tree.depth
        );

        Ok(tree)
    }

    fn insert(&mut self, pattern: &Pattern, permission: Permission) {
        let mut node = &mut self.root;
        for segment in pattern.segments() {
            node = node.child_mut(segment);
        }

        if node.permission.replace(permission).is_none() {
            self.rule_count += 1;
        }
        self.depth = self.depth.max(pattern.len());
    }

    /// Returns the syntax patterns and paths are parsed with
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Number of distinct patterns in the tree
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// Length of the longest pattern
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if the tree holds no rules
    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// Returns the permission stored for exactly this pattern
    ///
    /// This is a structural lookup: wildcards in `pattern` only match
    /// wildcard rules, and no inheritance is applied.
    pub fn rule(&self, pattern: &str) -> Result<Option<Permission>> {
        let pattern = Pattern::parse(pattern, &self.syntax)?;
        let mut node = &self.root;
        for segment in pattern.segments() {
            match node.child(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(node.permission())
    }

    /// Returns `true` if a rule exists for exactly this pattern
    pub fn contains_rule(&self, pattern: &str) -> Result<bool> {
        Ok(self.rule(pattern)?.is_some())
    }

    pub(crate) fn root(&self) -> &Node {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_compile_builds_shared_prefixes() {
        let tree = RuleTree::compile([
            ("a", Permission::READ),
            ("a.b.c", Permission::RW),
            ("a.b.*.d", Permission::DENY),
        ])
        .unwrap();

        let a = tree.root().literal("a").unwrap();
        assert_eq!(a.permission(), Some(Permission::READ));

        let b = a.literal("b").unwrap();
        assert_eq!(b.permission(), None);
        assert_eq!(b.literal("c").unwrap().permission(), Some(Permission::RW));

        let star = b.wildcard().unwrap();
        assert_eq!(star.permission(), None);
        assert_eq!(star.literal("d").unwrap().permission(), Some(Permission::DENY));

        assert_eq!(tree.rule_count(), 3);
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_deny_is_distinct_from_absent() {
        let tree = RuleTree::compile([("a.b", Permission::DENY)]).unwrap();
        assert_eq!(tree.rule("a.b").unwrap(), Some(Permission::DENY));
        assert_eq!(tree.rule("a").unwrap(), None);
        assert!(tree.contains_rule("a.b").unwrap());
        assert!(!tree.contains_rule("a").unwrap());
    }

    #[test]
    fn test_duplicate_pattern_last_write_wins() {
        let tree = RuleTree::compile(vec![
            ("a.b", Permission::READ),
            ("a.c", Permission::READ),
            ("a.b", Permission::WRITE),
        ])
        .unwrap();

        assert_eq!(tree.rule("a.b").unwrap(), Some(Permission::WRITE));
        assert_eq!(tree.rule_count(), 2);
    }

    #[test]
    fn test_empty_pattern_sets_root() {
        let tree = RuleTree::compile([("", Permission::READ)]).unwrap();
        assert_eq!(tree.root().permission(), Some(Permission::READ));
        assert_eq!(tree.rule("").unwrap(), Some(Permission::READ));
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.rule_count(), 1);
    }

    #[test]
    fn test_wildcard_only_pattern() {
        let tree = RuleTree::compile([("*", Permission::from_mask(15))]).unwrap();
        assert_eq!(
            tree.root().wildcard().unwrap().permission(),
            Some(Permission::from_mask(15))
        );
        assert!(tree.root().literal("*").is_none());
    }

    #[test]
    fn test_raw_masks_accepted() {
        let tree = RuleTree::compile([("a", 5u32), ("b", 0u32)]).unwrap();
        assert_eq!(tree.rule("a").unwrap(), Some(Permission::READ | Permission::CREATE));
        assert_eq!(tree.rule("b").unwrap(), Some(Permission::DENY));
    }

    #[test]
    fn test_malformed_pattern_fails_compile() {
        let result = RuleTree::compile([("a", Permission::READ), ("a..b", Permission::READ)]);
        assert_eq!(
            result.unwrap_err(),
            Error::MalformedPattern {
                pattern: "a..b".to_string(),
                position: 1,
            }
        );
    }

    #[test]
    fn test_invalid_syntax_fails_compile() {
        let result = RuleTree::compile_with(Syntax::new('.', ""), [("a", Permission::READ)]);
        assert!(matches!(result, Err(Error::InvalidSyntax(_))));
    }

    #[test]
    fn test_empty_tree() {
        let tree = RuleTree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.rule("a").unwrap(), None);
    }
}
