use std::collections::VecDeque;

use crate::models::{
    Feature,
    FeatureId,
    LinkReason,
    PeakLink,
};

/// Records `a <-> b` with `reason` on both features.
///
/// Self links are ignored and an existing (other, reason) pair is never
/// inserted twice. Returns whether anything was added.
pub fn register_link(features: &mut [Feature], a: FeatureId, b: FeatureId, reason: LinkReason) -> bool {
    if a == b || a >= features.len() || b >= features.len() {
        return false;
    }
    let mut added = false;
    for (from, to) in [(a, b), (b, a)] {
        let link = PeakLink {
            linked_id: to,
            reason,
        };
        let links = &mut features[from].character.links;
        if !links.contains(&link) {
            links.push(link);
            added = true;
        }
    }
    added
}

/// Assigns connected-component ids over the link graph.
///
/// Features are visited in id order; each unvisited one opens a new group
/// that is flooded breadth-first. Returns the number of groups.
pub fn assign_group_ids(features: &mut [Feature]) -> u32 {
    let n = features.len();
    let mut visited = vec![false; n];
    let mut queue: VecDeque<FeatureId> = VecDeque::new();
    let mut next_group = 0u32;

    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            features[current].character.group_id = Some(next_group);
            for link in features[current].character.links.iter() {
                let other = link.linked_id;
                if other < n && !visited[other] {
                    visited[other] = true;
                    queue.push_back(other);
                }
            }
        }
        next_group += 1;
    }
    next_group
}
