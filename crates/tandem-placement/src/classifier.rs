//! Group membership from path structure.
//!
//! A path is managed when it contains the managed segment, then one segment
//! naming the group, then at least one non-empty segment:
//!
//! ```text
//! /warehouse/managed/orders/part-00000
//!            ^^^^^^^ ^^^^^^ ^^^^^^^^^^
//!            marker  group  member
//! ```
//!
//! Classification is syntactic. The filesystem is never consulted.

use crate::config::DEFAULT_MANAGED_SEGMENT;
use crate::{PlacementError, Result};

/// Recognizes managed paths and extracts their group root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathClassifier {
    segment: String,
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MANAGED_SEGMENT)
    }
}

impl PathClassifier {
    /// Classifier for groups introduced by `segment`.
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
        }
    }

    /// Whether `path` lies inside a group.
    pub fn is_managed(&self, path: &str) -> bool {
        self.find_group_root(path).is_some()
    }

    /// Prefix of `path` up to and including the group segment, with its
    /// trailing `/`.
    pub fn group_root<'a>(&self, path: &'a str) -> Result<&'a str> {
        self.find_group_root(path)
            .ok_or_else(|| PlacementError::NotManaged(path.to_string()))
    }

    /// The last marker occurrence that still has a group segment and a
    /// non-empty member segment after it wins.
    fn find_group_root<'a>(&self, path: &'a str) -> Option<&'a str> {
        let mut segments = Vec::new();
        let mut start = 0;
        for segment in path.split('/') {
            segments.push((start, segment));
            start += segment.len() + 1;
        }

        let mut root = None;
        for (i, &(_, segment)) in segments.iter().enumerate() {
            if segment != self.segment || i + 2 >= segments.len() {
                continue;
            }
            let (group_start, group) = segments[i + 1];
            let has_member = segments[i + 2..].iter().any(|&(_, s)| !s.is_empty());
            if !group.is_empty() && has_member {
                root = Some(&path[..group_start + group.len() + 1]);
            }
        }
        root
    }
}
