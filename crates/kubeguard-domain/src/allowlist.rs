//! Allowlist matching.
//!
//! Entries are supplied per control and compiled once at config resolution time.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexSet};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllowMode {
    /// Identifier must equal an entry verbatim.
    Exact,
    /// Each entry is a regular expression; any unanchored match exempts the identifier.
    Pattern,
    /// Each entry is a glob matched against the whole identifier.
    Glob,
}

impl AllowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllowMode::Exact => "exact",
            AllowMode::Pattern => "pattern",
            AllowMode::Glob => "glob",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid regular expression {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid glob {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("line pattern {pattern:?} must capture an identifier and a value")]
    MissingGroups { pattern: String },
}

#[derive(Clone, Debug, Default)]
pub enum AllowMatcher {
    #[default]
    Empty,
    Exact(BTreeSet<String>),
    Pattern(RegexSet),
    Glob(GlobSet),
}

impl AllowMatcher {
    pub fn compile(mode: AllowMode, entries: &[String]) -> Result<Self, PatternError> {
        if entries.is_empty() {
            return Ok(AllowMatcher::Empty);
        }

        match mode {
            AllowMode::Exact => Ok(AllowMatcher::Exact(entries.iter().cloned().collect())),
            AllowMode::Pattern => {
                // Compile individually first so the error names the offending entry.
                for pattern in entries {
                    Regex::new(pattern).map_err(|source| PatternError::Regex {
                        pattern: pattern.clone(),
                        source,
                    })?;
                }
                let set = RegexSet::new(entries).map_err(|source| PatternError::Regex {
                    pattern: entries.join(", "),
                    source,
                })?;
                Ok(AllowMatcher::Pattern(set))
            }
            AllowMode::Glob => {
                let mut builder = GlobSetBuilder::new();
                for pattern in entries {
                    let glob = Glob::new(pattern).map_err(|source| PatternError::Glob {
                        pattern: pattern.clone(),
                        source,
                    })?;
                    builder.add(glob);
                }
                let set = builder.build().map_err(|source| PatternError::Glob {
                    pattern: entries.join(", "),
                    source,
                })?;
                Ok(AllowMatcher::Glob(set))
            }
        }
    }

    pub fn is_allowed(&self, identifier: &str) -> bool {
        match self {
            AllowMatcher::Empty => false,
            AllowMatcher::Exact(set) => set.contains(identifier),
            AllowMatcher::Pattern(set) => set.is_match(identifier),
            AllowMatcher::Glob(set) => set.is_match(identifier),
        }
    }

    pub fn mode(&self) -> Option<AllowMode> {
        match self {
            AllowMatcher::Empty => None,
            AllowMatcher::Exact(_) => Some(AllowMode::Exact),
            AllowMatcher::Pattern(_) => Some(AllowMode::Pattern),
            AllowMatcher::Glob(_) => Some(AllowMode::Glob),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AllowMatcher::Empty => 0,
            AllowMatcher::Exact(set) => set.len(),
            AllowMatcher::Pattern(set) => set.len(),
            AllowMatcher::Glob(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
