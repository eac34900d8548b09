//! Expansion queries: "is any path of this shape granted?"
//!
//! An expansion query is a pattern that may use the any-token (`?` by
//! default). Expanding it against a rule tree replaces every any-token with
//! each literal key the rules name at that position, plus the wildcard,
//! which stands for every key no rule names. The resulting patterns cover
//! every distinct way a concrete path of that shape can resolve.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::Syntax;
use crate::error::{Error, QueryError, Result};
use crate::path::{Pattern, Segment};
use crate::permission::Permission;
use crate::resolver::resolve_segments;
use crate::tree::{Node, RuleTree};

/// One segment of an expansion query
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Literal(String),
    Wildcard,
    Any,
}

fn parse_selectors(s: &str, syntax: &Syntax) -> Result<Vec<Selector>> {
    if s.is_empty() {
        return Err(Error::query(s, QueryError::EmptyPath));
    }

    s.split(syntax.separator)
        .enumerate()
        .map(|(position, token)| {
            if token.is_empty() {
                Err(Error::query(s, QueryError::EmptySegment { position }))
            } else if syntax.is_wildcard(token) {
                Ok(Selector::Wildcard)
            } else if syntax.is_any(token) {
                Ok(Selector::Any)
            } else {
                Ok(Selector::Literal(token.to_string()))
            }
        })
        .collect()
}

/// Segments chosen so far and every node a path with that prefix can reach
struct Branch<'t> {
    segments: Vec<Segment>,
    nodes: Vec<&'t Node>,
}

impl<'t> Branch<'t> {
    /// Extends by one segment; `literal` is followed alongside wildcard edges
    fn extend(&self, segment: Segment, literal: Option<&str>) -> Self {
        let nodes = self
            .nodes
            .iter()
            .flat_map(|&node| {
                literal
                    .and_then(|token| node.literal(token))
                    .into_iter()
                    .chain(node.wildcard())
            })
            .collect();

        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments, nodes }
    }
}

impl RuleTree {
    /// Expands the any-tokens in `pattern` against the rules
    ///
    /// Literal segments stay as they are and wildcard segments only follow
    /// wildcard rules. Each any-token becomes every literal key the rules
    /// name at that position, in sorted order, followed by the wildcard.
    ///
    /// # Examples
    ///
    /// ```
    /// use permtree::{Permission, RuleTree};
    ///
    /// let tree = RuleTree::compile([
    ///     ("org.acme.billing", Permission::READ),
    ///     ("org.beta", Permission::RW),
    /// ]).unwrap();
    ///
    /// let expanded: Vec<String> = tree
    ///     .expand("org.?.billing")
    ///     .unwrap()
    ///     .iter()
    ///     .map(|p| p.to_string())
    ///     .collect();
    /// assert_eq!(expanded, ["org.acme.billing", "org.beta.billing", "org.*.billing"]);
    /// ```
    pub fn expand(&self, pattern: &str) -> Result<Vec<Pattern>> {
        let selectors = parse_selectors(pattern, self.syntax())?;

        let mut branches = vec![Branch {
            segments: Vec::with_capacity(selectors.len()),
            nodes: vec![self.root()],
        }];

        for selector in &selectors {
            let mut next = Vec::with_capacity(branches.len());
            for branch in &branches {
                match selector {
                    Selector::Literal(token) => {
                        let segment = Segment::Literal(token.clone());
                        next.push(branch.extend(segment, Some(token.as_str())));
                    }
                    Selector::Wildcard => next.push(branch.extend(Segment::Wildcard, None)),
                    Selector::Any => {
                        let keys: BTreeSet<&str> = branch
                            .nodes
                            .iter()
                            .flat_map(|&node| node.literal_keys())
                            .collect();
                        for key in keys {
                            next.push(branch.extend(Segment::Literal(key.to_string()), Some(key)));
                        }
                        next.push(branch.extend(Segment::Wildcard, None));
                    }
                }
            }
            branches = next;
        }

        let patterns: Vec<Pattern> = branches
            .into_iter()
            .map(|branch| Pattern::from_segments(branch.segments, self.syntax()))
            .collect();

        debug!("Expanded '{}' into {} patterns", pattern, patterns.len());

        Ok(patterns)
    }

    /// Checks whether any path matching `pattern` is granted `required`
    ///
    /// A wildcard in an expansion resolves like a key no rule names.
    pub fn check_any(&self, pattern: &str, required: Permission, explicit: bool) -> Result<bool> {
        let wildcard = &self.syntax().wildcard;

        Ok(self.expand(pattern)?.iter().any(|expanded| {
            let segments: Vec<String> = expanded
                .segments()
                .iter()
                .map(|segment| match segment {
                    Segment::Literal(token) => token.clone(),
                    Segment::Wildcard => wildcard.clone(),
                })
                .collect();
            resolve_segments(self, &segments, explicit).grants(required)
        }))
    }
}
