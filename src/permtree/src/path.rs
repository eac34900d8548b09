//! Rule patterns and concrete query paths
//!
//! A [`Pattern`] is the key of a rule and may contain wildcard segments.
//! A [`ResourcePath`] is what gets checked: every segment is a literal.

use std::fmt;
use std::str::FromStr;

use crate::config::Syntax;
use crate::error::{Error, QueryError, Result};

/// One segment of a rule pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches exactly this token
    Literal(String),
    /// Matches any single segment
    Wildcard,
}

/// Hierarchical rule pattern such as `org.*.billing`
///
/// The empty string is a valid pattern with zero segments; it addresses the
/// root of the rule tree.
///
/// # Examples
///
/// ```
/// use permtree::{Pattern, ResourcePath};
///
/// let pattern: Pattern = "org.*.billing".parse().unwrap();
/// assert_eq!(pattern.len(), 3);
/// assert!(pattern.has_wildcards());
///
/// let path: ResourcePath = "org.acme.billing".parse().unwrap();
/// assert!(pattern.matches(&path));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses a pattern under the given syntax
    ///
    /// Fails with [`Error::MalformedPattern`] if any segment is empty.
    pub fn parse(s: &str, syntax: &Syntax) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self {
                raw: String::new(),
                segments: Vec::new(),
            });
        }

        let mut segments = Vec::new();
        for (position, token) in s.split(syntax.separator).enumerate() {
            if token.is_empty() {
                return Err(Error::MalformedPattern {
                    pattern: s.to_string(),
                    position,
                });
            }

            if syntax.is_wildcard(token) {
                segments.push(Segment::Wildcard);
            } else {
                segments.push(Segment::Literal(token.to_string()));
            }
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }

    /// Builds a pattern from segments that are already known to be valid
    pub(crate) fn from_segments(segments: Vec<Segment>, syntax: &Syntax) -> Self {
        let mut sep = [0u8; 4];
        let sep: &str = syntax.separator.encode_utf8(&mut sep);
        let raw = segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(token) => token.as_str(),
                Segment::Wildcard => syntax.wildcard.as_str(),
            })
            .collect::<Vec<_>>()
            .join(sep);
        Self { raw, segments }
    }

    /// Returns the segments of this pattern
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the raw pattern string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root pattern
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns whether this pattern contains wildcards
    pub fn has_wildcards(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Wildcard))
    }

    /// Checks if this pattern matches `path` segment for segment
    ///
    /// Lengths must be equal; a wildcard matches any one segment.
    pub fn matches(&self, path: &ResourcePath) -> bool {
        self.matches_segments(path.segments())
    }

    pub(crate) fn matches_segments(&self, segments: &[String]) -> bool {
        if self.segments.len() != segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(segments)
            .all(|(pattern_seg, seg)| match pattern_seg {
                Segment::Wildcard => true,
                Segment::Literal(token) => token == seg,
            })
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &Syntax::default())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Concrete path being checked, such as `org.acme.billing`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
    separator: char,
}

impl ResourcePath {
    /// Parses a query path under the given syntax
    ///
    /// Fails with [`Error::InvalidQuery`] if the path is empty, has an empty
    /// segment, or uses the wildcard token as a segment.
    pub fn parse(s: &str, syntax: &Syntax) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::query(s, QueryError::EmptyPath));
        }

        let mut segments = Vec::new();
        for (position, token) in s.split(syntax.separator).enumerate() {
            if token.is_empty() {
                return Err(Error::query(s, QueryError::EmptySegment { position }));
            }
            if syntax.is_wildcard(token) {
                return Err(Error::query(s, QueryError::Wildcard { position }));
            }
            segments.push(token.to_string());
        }

        Ok(Self {
            segments,
            separator: syntax.separator,
        })
    }

    /// Builds a path from individual segments
    ///
    /// Each segment is validated on its own, so a segment containing the
    /// separator is rejected instead of being split.
    pub fn from_segments<I, S>(segments: I, syntax: &Syntax) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let path = Self {
            segments,
            separator: syntax.separator,
        };

        if path.segments.is_empty() {
            return Err(Error::query("", QueryError::EmptyPath));
        }
        for (position, segment) in path.segments.iter().enumerate() {
            if let Some(reason) = Self::segment_error(segment, position, syntax) {
                return Err(Error::query(path.to_string(), reason));
            }
        }

        Ok(path)
    }

    /// Checks a single segment without building a path
    pub(crate) fn segment_error(segment: &str, position: usize, syntax: &Syntax) -> Option<QueryError> {
        if segment.is_empty() {
            Some(QueryError::EmptySegment { position })
        } else if segment.contains(syntax.separator) {
            Some(QueryError::Separator { position })
        } else if syntax.is_wildcard(segment) {
            Some(QueryError::Wildcard { position })
        } else {
            None
        }
    }

    /// Returns the segments of this path
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl FromStr for ResourcePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &Syntax::default())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = [0u8; 4];
        let sep: &str = self.separator.encode_utf8(&mut sep);
        write!(f, "{}", self.segments.join(sep))
    }
}
