//! Overlap conflicts between lessons on the same day.
//!
//! The detector produces raw [`Conflict`] records per dimension and the
//! classifier folds them into a [`ConflictSummary`] split by scope.

pub mod classifier;
pub mod clustering;
pub mod detector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::lesson::Lesson;
use crate::resource::ScheduleId;

pub use classifier::{ConflictGroup, ConflictSummary, classify};
pub use clustering::overlap_clusters;
pub use detector::detect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    Room,
    Professor,
    Group,
}

impl ConflictType {
    /// Pass order used by the detector and the classifier.
    pub const ALL: [ConflictType; 3] = [ConflictType::Room, ConflictType::Professor, ConflictType::Group];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Room => "room",
            ConflictType::Professor => "professor",
            ConflictType::Group => "group",
        }
    }

    /// Parses a comma separated list such as `room,group`. Blank input means
    /// no restriction.
    pub fn parse_list(input: &str) -> Result<Vec<ConflictType>, String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" => Ok(ConflictType::Room),
            "professor" | "instructor" => Ok(ConflictType::Professor),
            "group" => Ok(ConflictType::Group),
            other => Err(format!("unknown conflict type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictScope {
    /// Every lesson belongs to the same schedule.
    Single,
    /// Lessons span more than one schedule.
    Shared,
}

/// How same-day overlapping lessons are grouped into one conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStrategy {
    /// Connected components of the pairwise-overlap graph. Independent of
    /// input order.
    #[default]
    Connected,
    /// Groups built around the earliest unvisited lesson in scan order. A
    /// chain A-B-C where A and C do not overlap may split depending on order.
    Star,
}

impl ClusterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStrategy::Connected => "connected",
            ClusterStrategy::Star => "star",
        }
    }
}

impl fmt::Display for ClusterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connected" | "components" => Ok(ClusterStrategy::Connected),
            "star" => Ok(ClusterStrategy::Star),
            other => Err(format!("unknown clustering strategy '{other}'")),
        }
    }
}

/// One raw conflict: two or more same-day lessons that overlap on a shared
/// room, instructor or group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub message: String,
    pub lessons: Vec<Lesson>,
}

impl Conflict {
    pub fn schedule_ids(&self) -> BTreeSet<ScheduleId> {
        self.lessons.iter().map(|lesson| lesson.schedule_id).collect()
    }

    pub fn scope(&self) -> ConflictScope {
        if self.schedule_ids().len() > 1 {
            ConflictScope::Shared
        } else {
            ConflictScope::Single
        }
    }

    pub fn lesson_ids(&self) -> Vec<i32> {
        self.lessons.iter().map(|lesson| lesson.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_type_list_parsing() {
        assert_eq!(
            ConflictType::parse_list("room, group").unwrap(),
            vec![ConflictType::Room, ConflictType::Group]
        );
        assert!(ConflictType::parse_list("").unwrap().is_empty());
        assert!(ConflictType::parse_list("room,building").is_err());
    }

    #[test]
    fn serde_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&ConflictType::Professor).unwrap(), "\"professor\"");
        assert_eq!(serde_json::to_string(&ConflictScope::Shared).unwrap(), "\"shared\"");
        assert_eq!(serde_json::to_string(&ClusterStrategy::default()).unwrap(), "\"connected\"");
    }
}
