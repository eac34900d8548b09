//! Configuration for path syntax and the rule store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::permission::Permission;

/// Path syntax: the hierarchy separator and the wildcard token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syntax {
    /// Character separating path segments
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Segment value matching exactly one arbitrary segment in a pattern
    #[serde(default = "default_wildcard")]
    pub wildcard: String,

    /// Segment value standing for "any segment" in expansion queries
    #[serde(default = "default_any")]
    pub any: String,
}

fn default_separator() -> char {
    '.'
}

fn default_wildcard() -> String {
    "*".to_string()
}

fn default_any() -> String {
    "?".to_string()
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            wildcard: default_wildcard(),
            any: default_any(),
        }
    }
}

impl Syntax {
    /// Create a syntax with a custom separator and wildcard token
    ///
    /// The any-token keeps its default `?`; see [`Syntax::with_any`].
    pub fn new(separator: char, wildcard: impl Into<String>) -> Self {
        Self {
            separator,
            wildcard: wildcard.into(),
            any: default_any(),
        }
    }

    /// Replace the any-token used by expansion queries
    pub fn with_any(mut self, any: impl Into<String>) -> Self {
        self.any = any.into();
        self
    }

    /// Validate that patterns can be split unambiguously under this syntax
    pub fn validate(&self) -> Result<()> {
        if self.wildcard.is_empty() {
            return Err(Error::InvalidSyntax("wildcard token cannot be empty".to_string()));
        }

        if self.wildcard.contains(self.separator) {
            return Err(Error::InvalidSyntax(format!(
                "wildcard token '{}' contains the separator '{}'",
                self.wildcard, self.separator
            )));
        }

        if self.any.is_empty() || self.any.contains(self.separator) {
            return Err(Error::InvalidSyntax(format!(
                "any-token '{}' must be a non-empty segment without the separator '{}'",
                self.any, self.separator
            )));
        }

        if self.any == self.wildcard {
            return Err(Error::InvalidSyntax(format!(
                "any-token and wildcard are both '{}'",
                self.any
            )));
        }

        Ok(())
    }

    /// Returns `true` if `segment` is the wildcard token
    pub fn is_wildcard(&self, segment: &str) -> bool {
        segment == self.wildcard
    }

    /// Returns `true` if `segment` is the any-token
    pub fn is_any(&self, segment: &str) -> bool {
        segment == self.any
    }
}

/// Decision cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache resolutions per tree snapshot
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached resolutions per snapshot
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            capacity: default_capacity(),
        }
    }
}

/// Rule store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Syntax every installed tree must use
    #[serde(default)]
    pub syntax: Syntax,

    /// Decision cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Initial rule table, keyed by pattern
    ///
    /// Permissions are written as flag names, e.g. `"READ | WRITE"`; an empty
    /// string denies.
    #[serde(default)]
    pub rules: BTreeMap<String, Permission>,
}
