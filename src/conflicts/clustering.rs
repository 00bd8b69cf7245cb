use petgraph::unionfind::UnionFind;
use std::collections::HashMap;

use super::ClusterStrategy;
use crate::interval::lessons_overlap;
use crate::lesson::Lesson;

/// Groups same-day lessons that share one dimension key into overlap
/// clusters. Singletons are dropped.
///
/// Members keep input order and clusters are ordered by their first member.
pub fn overlap_clusters<'a>(lessons: &[&'a Lesson], strategy: ClusterStrategy) -> Vec<Vec<&'a Lesson>> {
    if lessons.len() < 2 {
        return Vec::new();
    }
    match strategy {
        ClusterStrategy::Connected => connected_clusters(lessons),
        ClusterStrategy::Star => star_clusters(lessons),
    }
}

fn star_clusters<'a>(lessons: &[&'a Lesson]) -> Vec<Vec<&'a Lesson>> {
    let mut visited = vec![false; lessons.len()];
    let mut clusters = Vec::new();
    for (i, &anchor) in lessons.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let mut cluster = vec![anchor];
        for (j, &other) in lessons.iter().enumerate().skip(i + 1) {
            // Membership is decided against the anchor only.
            if !visited[j] && lessons_overlap(anchor, other) {
                visited[j] = true;
                cluster.push(other);
            }
        }
        if cluster.len() > 1 {
            clusters.push(cluster);
        }
    }
    clusters
}

fn connected_clusters<'a>(lessons: &[&'a Lesson]) -> Vec<Vec<&'a Lesson>> {
    let mut components = UnionFind::<usize>::new(lessons.len());
    for i in 0..lessons.len() {
        for j in (i + 1)..lessons.len() {
            if lessons_overlap(lessons[i], lessons[j]) {
                components.union(i, j);
            }
        }
    }

    let mut slot_by_root: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<Vec<&'a Lesson>> = Vec::new();
    for (i, &lesson) in lessons.iter().enumerate() {
        let root = components.find(i);
        let slot = *slot_by_root.entry(root).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[slot].push(lesson);
    }
    clusters.retain(|cluster| cluster.len() > 1);
    clusters
}
