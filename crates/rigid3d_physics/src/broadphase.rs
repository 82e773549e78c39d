//! Brute-force AABB broadphase

use slotmap::SlotMap;

use crate::body::{BodyKey, RigidBody};

/// Candidate pairs whose bounding boxes overlap
///
/// Scans every unordered pair once, in arena order. Pairs are skipped when
/// both bodies are static, both are asleep, either lacks a collider, or their
/// collision filters reject each other.
#[derive(Clone, Debug, Default)]
pub struct AabbBroadphase {
    pairs: Vec<(BodyKey, BodyKey)>,
}

impl AabbBroadphase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute candidate pairs for the current body poses
    pub fn update(&mut self, bodies: &SlotMap<BodyKey, RigidBody>) -> &[(BodyKey, BodyKey)] {
        self.pairs.clear();

        let entries: Vec<_> = bodies
            .iter()
            .filter_map(|(key, body)| {
                let collider = body.collider()?;
                Some((key, body, collider, collider.aabb(body.position, body.rotation)))
            })
            .collect();

        for (i, (key_a, a, collider_a, aabb_a)) in entries.iter().enumerate() {
            for (key_b, b, collider_b, aabb_b) in &entries[i + 1..] {
                if a.is_static() && b.is_static() {
                    continue;
                }
                if a.is_sleeping() && b.is_sleeping() {
                    continue;
                }
                if !collider_a.filter.collides_with(&collider_b.filter) {
                    continue;
                }
                if aabb_a.overlaps(aabb_b) {
                    self.pairs.push((*key_a, *key_b));
                }
            }
        }

        &self.pairs
    }

    /// Pairs found by the last update
    pub fn pairs(&self) -> &[(BodyKey, BodyKey)] {
        &self.pairs
    }
}
