//! # permtree
//!
//! Hierarchical, wildcard-aware permission resolution.
//!
//! ## Features
//!
//! - **Rule trees** compiled once from a flat table of dotted patterns
//! - **Specificity ranking**: literal segments beat wildcards, full-length
//!   matches beat inherited ancestors, with backtracking out of dead ends
//! - **Explicit checks** that ignore inherited grants
//! - **Expansion queries** (`org.?.billing`) asking whether any matching path is granted
//! - **Atomic rebuilds** through [`RuleStore`], with a per-snapshot decision cache
//! - **Document filtering** of `serde_json` values by the path of each value
//!
//! ## Example
//!
//! ```rust
//! use permtree::{Permission, RuleTree};
//!
//! let tree = RuleTree::compile([
//!     ("a", Permission::READ),
//!     ("a.b.c", Permission::RW),
//!     ("a.b.*.d", Permission::DENY),
//! ]).unwrap();
//!
//! // Inherited from "a"
//! assert!(tree.check("a.b", Permission::READ).unwrap());
//! assert!(!tree.check("a.b", Permission::WRITE).unwrap());
//!
//! // Exact rule
//! assert!(tree.check("a.b.c", Permission::WRITE).unwrap());
//!
//! // Wildcard rule matching the whole path
//! assert!(!tree.check("a.b.x.d", Permission::READ).unwrap());
//!
//! // Explicit checks need a rule for the path itself
//! assert!(!tree.check_explicit("a.b", Permission::READ).unwrap());
//! ```

pub mod config;
pub mod error;
mod expand;
pub mod filter;
pub mod path;
pub mod permission;
pub mod resolver;
pub mod store;
pub mod tree;

// Re-export commonly used types
pub use config::{CacheConfig, StoreConfig, Syntax};
pub use error::{Error, QueryError, Result};
pub use filter::{DataFilter, Handler, TaggedFilter};
pub use path::{Pattern, ResourcePath, Segment};
pub use permission::Permission;
pub use resolver::{check, permissions, resolve, MatchKind, Resolution, Step};
pub use store::{CacheStats, RuleStore};
pub use tree::RuleTree;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiles a rule table with the default syntax
///
/// See [`RuleTree::compile`].
pub fn compile<I, K, P>(rules: I) -> Result<RuleTree>
where
    I: IntoIterator<Item = (K, P)>,
    K: AsRef<str>,
    P: Into<Permission>,
{
    RuleTree::compile(rules)
}
