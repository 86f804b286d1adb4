//! Split consolidation
//!
//! Two splits wrapped for exactly the same KAS set add nothing: whoever can
//! unwrap one can unwrap the other. The optimizer collapses them into one.

use crate::planner::SplitAssignment;
use std::collections::HashMap;
use tracing::debug;

/// Merge assignments that share a KAS URL set
///
/// Groups keep first-seen order; the result is sorted by split ID.
pub fn optimize_split_assignments(assignments: Vec<SplitAssignment>) -> Vec<SplitAssignment> {
    if assignments.len() <= 1 {
        return assignments;
    }

    let before = assignments.len();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<SplitAssignment>> = Vec::new();

    for assignment in assignments {
        let key = create_kas_set_key(&assignment.kas_urls);
        match index.get(&key) {
            Some(&slot) => groups[slot].push(assignment),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![assignment]);
            }
        }
    }

    let mut optimized: Vec<SplitAssignment> = groups.iter().map(|g| merge_assignments(g)).collect();
    optimized.sort_by(|a, b| a.split_id.cmp(&b.split_id));

    debug!(before, after = optimized.len(), "optimized split assignments");
    optimized
}

/// Order-insensitive identity of a KAS URL list, e.g. `[a b c]`
pub fn create_kas_set_key(urls: &[String]) -> String {
    let mut sorted = urls.to_vec();
    sorted.sort();
    format!("[{}]", sorted.join(" "))
}

/// Fold a group into its first member, adding keys it lacks
pub fn merge_assignments(assignments: &[SplitAssignment]) -> SplitAssignment {
    let Some((first, rest)) = assignments.split_first() else {
        return SplitAssignment::default();
    };

    let mut merged = first.clone();
    for other in rest {
        for (url, key) in &other.keys {
            merged.keys.entry(url.clone()).or_insert_with(|| key.clone());
        }
    }
    merged
}
