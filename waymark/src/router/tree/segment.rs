//! Defines `SegmentType` and the path splitting rules for `Tree`.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static VARIABLE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\w+\}$").expect("variable segment pattern is valid"));

/// Mapping of path variable names to the request segment captured for them.
pub type SegmentMapping = HashMap<String, String>;

/// Indicates the type of segment which is being represented by a `Node`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SegmentType {
    /// Captures any single request segment under the name declared between the braces, for
    /// example `{id}`.
    Variable,

    /// Is matched exactly (string equality) to the segment for incoming request paths.
    Static,
}

impl SegmentType {
    /// Classifies a declared segment.
    pub fn of(segment: &str) -> SegmentType {
        if VARIABLE_SEGMENT.is_match(segment) {
            SegmentType::Variable
        } else {
            SegmentType::Static
        }
    }
}

/// Returns the variable name of a declared `{name}` segment.
pub fn variable_name(segment: &str) -> Option<&str> {
    match SegmentType::of(segment) {
        SegmentType::Variable => Some(&segment[1..segment.len() - 1]),
        SegmentType::Static => None,
    }
}

/// Splits a declared path into segments.
///
/// Surrounding spaces and slashes are insignificant. An empty path yields the single root marker
/// segment `""`.
pub fn split_path(path: &str) -> Vec<String> {
    path.trim_matches(|c| c == ' ' || c == '/')
        .split('/')
        .map(str::to_owned)
        .collect()
}

/// Records, per consumed request segment, whether a literal or a variable segment matched it.
///
/// Ordering is lexicographic with literal matches ranking above variable matches, so the greatest
/// `Specificity` among several hits identifies the most literal one.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(Vec<SegmentType>);

impl Specificity {
    pub(crate) fn push(&mut self, segment_type: SegmentType) {
        self.0.push(segment_type);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    pub(crate) fn extend(&mut self, other: &Specificity) {
        self.0.extend_from_slice(&other.0);
    }

    /// Number of literal segments in the match.
    pub fn literals(&self) -> usize {
        self.0.iter().filter(|t| **t == SegmentType::Static).count()
    }
}
