//! Permission-aware filtering of JSON documents
//!
//! [`DataFilter`] treats the position of every value in a document as its
//! resource path and drops whatever the rule tree does not grant.
//! [`TaggedFilter`] instead reads the path from a tag field carried by each
//! record.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;
use crate::path::{Pattern, ResourcePath};
use crate::permission::Permission;
use crate::resolver::resolve_segments;
use crate::tree::RuleTree;

/// Computes the path segment of a list element from the element and its index
pub type KeyFn = Arc<dyn Fn(&Value, usize) -> String + Send + Sync>;

/// Per-path behaviour registered on a filter
#[derive(Clone, Default)]
pub struct Handler {
    key: Option<KeyFn>,
    explicit: bool,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries at this path survive only with a rule matching them exactly
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Keys the elements of a list at this path with `key`
    pub fn key<F>(mut self, key: F) -> Self
    where
        F: Fn(&Value, usize) -> String + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(key));
        self
    }

    /// Keys the elements of a list at this path by one of their fields
    ///
    /// Elements lacking the field fall back to their index.
    pub fn key_field(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.key(move |element, index| {
            element
                .get(&field)
                .and_then(key_text)
                .unwrap_or_else(|| index.to_string())
        })
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("key", &self.key.as_ref().map(|_| "<fn>"))
            .field("explicit", &self.explicit)
            .finish()
    }
}

/// Handlers by pattern, first registration wins on overlap
#[derive(Debug, Clone, Default)]
struct Handlers {
    entries: Vec<(Pattern, Handler)>,
}

impl Handlers {
    fn register(&mut self, pattern: Pattern, handler: Handler) {
        match self.entries.iter_mut().find(|(p, _)| p.as_str() == pattern.as_str()) {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((pattern, handler)),
        }
    }

    fn find(&self, segments: &[String]) -> Option<&Handler> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches_segments(segments))
            .map(|(_, handler)| handler)
    }

    fn is_explicit(&self, segments: &[String]) -> bool {
        self.find(segments).map_or(false, Handler::is_explicit)
    }
}

/// Text of a scalar usable as a key
fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Key of a list element without a handler: `id`, then `name`, then index
fn default_key(element: &Value, index: usize) -> String {
    ["id", "name"]
        .iter()
        .find_map(|field| element.get(field).and_then(key_text))
        .unwrap_or_else(|| index.to_string())
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Filters a document by the path of each value within it
///
/// # Examples
///
/// ```
/// use permtree::{DataFilter, Permission, RuleTree};
/// use serde_json::json;
///
/// let tree = RuleTree::compile([
///     ("users", Permission::READ),
///     ("users.*.password", Permission::DENY),
/// ]).unwrap();
///
/// let data = json!({
///     "users": { "alice": { "email": "a@example.com", "password": "x" } },
///     "billing": { "card": "4111" },
/// });
///
/// let filtered = DataFilter::new(&tree).apply(data);
/// assert_eq!(filtered, json!({ "users": { "alice": { "email": "a@example.com" } } }));
/// ```
#[derive(Debug, Clone)]
pub struct DataFilter<'t> {
    tree: &'t RuleTree,
    handlers: Handlers,
    required: Permission,
}

impl<'t> DataFilter<'t> {
    /// Creates a filter that keeps readable values
    pub fn new(tree: &'t RuleTree) -> Self {
        Self {
            tree,
            handlers: Handlers::default(),
            required: Permission::READ,
        }
    }

    /// Sets the permission a value needs to survive
    pub fn require(mut self, required: Permission) -> Self {
        self.required = required;
        self
    }

    /// Registers `handler` for entries whose path matches `pattern`
    pub fn handler(mut self, pattern: &str, handler: Handler) -> Result<Self> {
        let pattern = Pattern::parse(pattern, self.tree.syntax())?;
        self.handlers.register(pattern, handler);
        Ok(self)
    }

    /// Returns `data` with every value the tree does not grant removed
    ///
    /// The top-level value is never dropped itself: a container comes back
    /// filtered (possibly empty) and a scalar comes back unchanged.
    pub fn apply(&self, data: Value) -> Value {
        let mut path = Vec::new();
        self.filter_children(data, &mut path)
    }

    fn filter_children(&self, value: Value, path: &mut Vec<String>) -> Value {
        match value {
            Value::Object(map) => {
                let mut kept = Map::new();
                for (key, child) in map {
                    if let Some(child) = self.filter_entry(&key, child, path) {
                        kept.insert(key, child);
                    }
                }
                Value::Object(kept)
            }
            Value::Array(items) => {
                let key_fn = self.handlers.find(path).and_then(|h| h.key.clone());
                let mut kept = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    let key = match &key_fn {
                        Some(key_fn) => key_fn(&item, index),
                        None => default_key(&item, index),
                    };
                    if let Some(item) = self.filter_entry(&key, item, path) {
                        kept.push(item);
                    }
                }
                Value::Array(kept)
            }
            scalar => scalar,
        }
    }

    fn filter_entry(&self, key: &str, value: Value, path: &mut Vec<String>) -> Option<Value> {
        if let Some(reason) = ResourcePath::segment_error(key, path.len(), self.tree.syntax()) {
            warn!("Dropping entry {:?} under {:?}: {}", key, path, reason);
            return None;
        }

        path.push(key.to_string());
        let kept = self.filter_value(value, path);
        path.pop();
        kept
    }

    fn filter_value(&self, value: Value, path: &mut Vec<String>) -> Option<Value> {
        let explicit = self.handlers.is_explicit(path);
        if explicit && !self.granted(path, true) {
            return None;
        }

        match value {
            Value::Object(_) | Value::Array(_) => {
                let was_empty = is_empty_container(&value);
                let filtered = self.filter_children(value, path);
                if !is_empty_container(&filtered) || (was_empty && self.granted(path, explicit)) {
                    Some(filtered)
                } else {
                    None
                }
            }
            scalar => self.granted(path, explicit).then_some(scalar),
        }
    }

    fn granted(&self, path: &[String], explicit: bool) -> bool {
        resolve_segments(self.tree, path, explicit).grants(self.required)
    }
}

/// Default field carrying a record's path
pub const DEFAULT_TAG: &str = "_path";

/// Filters records that carry their own path in a tag field
///
/// Untagged values pass through; their contents are still filtered.
///
/// # Examples
///
/// ```
/// use permtree::{Permission, RuleTree, TaggedFilter};
/// use serde_json::json;
///
/// let tree = RuleTree::compile([("docs.public", Permission::READ)]).unwrap();
/// let data = json!([
///     { "_path": "docs.public.1", "title": "Hello" },
///     { "_path": "docs.secret.1", "title": "Hidden" },
/// ]);
///
/// let filtered = TaggedFilter::new(&tree).apply(data).unwrap();
/// assert_eq!(filtered, Some(json!([{ "title": "Hello" }])));
/// ```
#[derive(Debug, Clone)]
pub struct TaggedFilter<'t> {
    tree: &'t RuleTree,
    handlers: Handlers,
    required: Permission,
    tag: String,
    strip_tag: bool,
}

impl<'t> TaggedFilter<'t> {
    pub fn new(tree: &'t RuleTree) -> Self {
        Self {
            tree,
            handlers: Handlers::default(),
            required: Permission::READ,
            tag: DEFAULT_TAG.to_string(),
            strip_tag: true,
        }
    }

    /// Sets the permission a record needs to survive
    pub fn require(mut self, required: Permission) -> Self {
        self.required = required;
        self
    }

    /// Reads record paths from `tag` instead of `_path`
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Leaves the tag field on surviving records
    pub fn keep_tag(mut self) -> Self {
        self.strip_tag = false;
        self
    }

    /// Registers `handler` for records whose tag matches `pattern`
    pub fn handler(mut self, pattern: &str, handler: Handler) -> Result<Self> {
        let pattern = Pattern::parse(pattern, self.tree.syntax())?;
        self.handlers.register(pattern, handler);
        Ok(self)
    }

    /// Filters `data`, returning `None` if the top-level record is denied
    pub fn apply(&self, data: Value) -> Result<Option<Value>> {
        self.filter(data)
    }

    fn filter(&self, value: Value) -> Result<Option<Value>> {
        match value {
            Value::Array(items) => {
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(item) = self.filter(item)? {
                        kept.push(item);
                    }
                }
                Ok(Some(Value::Array(kept)))
            }
            Value::Object(mut map) => {
                let tag = match map.get(&self.tag) {
                    Some(Value::String(tag)) => Some(tag.clone()),
                    _ => None,
                };

                if let Some(tag) = tag {
                    let path = ResourcePath::parse(&tag, self.tree.syntax())?;
                    let explicit = self.handlers.is_explicit(path.segments());
                    if !self.tree.check_path(&path, self.required, explicit) {
                        return Ok(None);
                    }
                    if self.strip_tag {
                        map.remove(&self.tag);
                    }
                }

                let mut kept = Map::new();
                for (key, child) in map {
                    if let Some(child) = self.filter(child)? {
                        kept.insert(key, child);
                    }
                }
                Ok(Some(Value::Object(kept)))
            }
            scalar => Ok(Some(scalar)),
        }
    }
}
