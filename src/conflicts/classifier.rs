use serde::{Deserialize, Serialize};

use super::{Conflict, ConflictScope, ConflictType};
use crate::resource::ScheduleId;

/// Conflicts of one type within one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictGroup {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub conflict_scope: ConflictScope,
    pub conflicts: Vec<Conflict>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub single: Vec<ConflictGroup>,
    pub shared: Vec<ConflictGroup>,
    pub total_single: usize,
    pub total_shared: usize,
    pub total_conflicts: usize,
}

impl ConflictSummary {
    pub fn is_empty(&self) -> bool {
        self.total_conflicts == 0
    }

    pub fn groups(&self) -> impl Iterator<Item = &ConflictGroup> {
        self.single.iter().chain(self.shared.iter())
    }

    pub fn to_cli_summary(&self) -> String {
        let mut lines = vec![format!(
            "{} conflicts ({} single, {} shared)",
            self.total_conflicts, self.total_single, self.total_shared
        )];
        for group in self.groups() {
            for conflict in &group.conflicts {
                let ids = conflict
                    .lesson_ids()
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                lines.push(format!(
                    "  [{:?}/{}] {} (lessons {ids})",
                    group.conflict_scope, conflict.conflict_type, conflict.message
                ));
            }
        }
        lines.join("\n")
    }
}

/// Splits raw conflicts into single- and shared-scope groups.
///
/// With a `schedule_id` scope, conflicts that do not involve that schedule
/// are dropped before counting. Groups are ordered room, professor, group
/// and empty groups are omitted.
pub fn classify(conflicts: Vec<Conflict>, schedule_id: Option<ScheduleId>) -> ConflictSummary {
    let mut single: Vec<Conflict> = Vec::new();
    let mut shared: Vec<Conflict> = Vec::new();
    for conflict in conflicts {
        if let Some(scope) = schedule_id {
            if !conflict.schedule_ids().contains(&scope) {
                continue;
            }
        }
        match conflict.scope() {
            ConflictScope::Shared => shared.push(conflict),
            ConflictScope::Single => single.push(conflict),
        }
    }

    let total_single = single.len();
    let total_shared = shared.len();
    ConflictSummary {
        single: group_by_type(single, ConflictScope::Single),
        shared: group_by_type(shared, ConflictScope::Shared),
        total_single,
        total_shared,
        total_conflicts: total_single + total_shared,
    }
}

fn group_by_type(conflicts: Vec<Conflict>, scope: ConflictScope) -> Vec<ConflictGroup> {
    let mut buckets: [Vec<Conflict>; 3] = Default::default();
    for conflict in conflicts {
        let slot = ConflictType::ALL
            .iter()
            .position(|t| *t == conflict.conflict_type)
            .unwrap_or_default();
        buckets[slot].push(conflict);
    }
    ConflictType::ALL
        .into_iter()
        .zip(buckets)
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(conflict_type, bucket)| ConflictGroup {
            conflict_type,
            conflict_scope: scope,
            count: bucket.len(),
            conflicts: bucket,
        })
        .collect()
}
