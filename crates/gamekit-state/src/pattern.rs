//! Path patterns with single-level wildcards.
//!
//! A pattern is matched positionally against a concrete [`Path`]: segment
//! counts must be equal and every non-wildcard segment must be equal. Each
//! `*` matches exactly one key or index at its depth, never more.

use crate::path::{Path, Seg};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single pattern segment: a literal path segment or a wildcard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternSeg {
    /// Matches exactly this key or index.
    Seg(Seg),
    /// Matches any single key or index at this depth.
    Any,
}

impl fmt::Display for PatternSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSeg::Seg(seg) => write!(f, "{seg}"),
            PatternSeg::Any => write!(f, "*"),
        }
    }
}

/// A path pattern, exact or wildcard.
///
/// # Examples
///
/// ```
/// use gamekit_state::{Path, Pattern};
///
/// let pattern = Pattern::parse("party.*.hp");
/// assert!(pattern.matches(&Path::parse("party.0.hp")));
/// assert!(pattern.matches(&Path::parse("party.1.hp")));
/// assert!(!pattern.matches(&Path::parse("party.0.mp")));
/// assert!(!pattern.matches(&Path::parse("party.0")));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern(Vec<PatternSeg>);

impl Pattern {
    /// Parse a dot-separated pattern string.
    ///
    /// A `*` segment becomes a wildcard; all-digit segments become index
    /// literals; everything else is a key literal.
    pub fn parse(pattern: &str) -> Self {
        if pattern.is_empty() {
            return Self(Vec::new());
        }
        Self(
            pattern
                .split('.')
                .map(|raw| {
                    if raw == "*" {
                        PatternSeg::Any
                    } else {
                        PatternSeg::Seg(Seg::parse(raw))
                    }
                })
                .collect(),
        )
    }

    /// Get the segments of this pattern.
    #[inline]
    pub fn segments(&self) -> &[PatternSeg] {
        &self.0
    }

    /// True if the pattern contains at least one wildcard segment.
    pub fn has_wildcard(&self) -> bool {
        self.0.iter().any(|s| matches!(s, PatternSeg::Any))
    }

    /// Check whether this pattern matches a concrete path.
    ///
    /// A path with a different segment count never matches.
    pub fn matches(&self, path: &Path) -> bool {
        if self.0.len() != path.len() {
            return false;
        }
        self.0
            .iter()
            .zip(path.iter())
            .all(|(pat, seg)| match pat {
                PatternSeg::Any => true,
                PatternSeg::Seg(lit) => lit == seg,
            })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern_matches_identical_path_only() {
        let pattern = Pattern::parse("party.0.hp");
        assert!(pattern.matches(&Path::parse("party.0.hp")));
        assert!(!pattern.matches(&Path::parse("party.1.hp")));
        assert!(!pattern.matches(&Path::parse("party.0.hp.max")));
    }

    #[test]
    fn test_wildcard_matches_any_single_segment() {
        let pattern = Pattern::parse("party.*.hp");
        assert!(pattern.matches(&Path::parse("party.0.hp")));
        assert!(pattern.matches(&Path::parse("party.17.hp")));
        assert!(pattern.matches(&Path::parse("party.leader.hp")));
    }

    #[test]
    fn test_wildcard_never_spans_segments() {
        let pattern = Pattern::parse("party.*");
        assert!(pattern.matches(&Path::parse("party.0")));
        assert!(!pattern.matches(&Path::parse("party.0.hp")));
        assert!(!pattern.matches(&Path::parse("party")));
    }

    #[test]
    fn test_multiple_wildcards() {
        let pattern = Pattern::parse("*.*.pos");
        assert!(pattern.matches(&Path::parse("enemies.3.pos")));
        assert!(pattern.matches(&Path::parse("party.0.pos")));
        assert!(!pattern.matches(&Path::parse("enemies.3.hp")));
    }

    #[test]
    fn test_numeric_literal_is_index() {
        let pattern = Pattern::parse("party.0.hp");
        assert_eq!(
            pattern.segments()[1],
            PatternSeg::Seg(Seg::Index(0))
        );
    }

    #[test]
    fn test_has_wildcard() {
        assert!(Pattern::parse("a.*").has_wildcard());
        assert!(!Pattern::parse("a.b").has_wildcard());
    }

    #[test]
    fn test_display_roundtrip() {
        let pattern = Pattern::parse("party.*.hp");
        assert_eq!(pattern.to_string(), "party.*.hp");
    }
}
