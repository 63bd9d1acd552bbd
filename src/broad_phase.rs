// src/broad_phase.rs
//! Candidate pair enumeration.
//!
//! Pairing lives behind [`BroadPhase`] so a spatial hash or sweep-and-prune
//! can replace [`AllPairs`] without touching detection or resolution.

use crate::collision::BoxShape;
use crate::math::PhysicsVector;

pub trait BroadPhase<V: PhysicsVector>: Send {
    /// Fill `pairs` with candidate `(i, j)` index pairs into `shapes`.
    ///
    /// Implementations must emit `i < j`. The world sorts the output before
    /// use, so emission order does not matter.
    fn find_pairs(&mut self, shapes: &[BoxShape<V>], pairs: &mut Vec<(usize, usize)>);

    fn name(&self) -> &'static str;
}

/// Every unordered pair, O(n²).
#[derive(Debug, Default, Clone, Copy)]
pub struct AllPairs;

impl<V: PhysicsVector> BroadPhase<V> for AllPairs {
    fn find_pairs(&mut self, shapes: &[BoxShape<V>], pairs: &mut Vec<(usize, usize)>) {
        pairs.clear();
        let n = shapes.len();
        pairs.reserve(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }
    }

    fn name(&self) -> &'static str {
        "all-pairs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_all_pairs_order() {
        let shapes = vec![
            BoxShape {
                center: Vec2::ZERO,
                half_extents: Vec2::ONE,
            };
            4
        ];
        let mut pairs = vec![(9, 9)];
        BroadPhase::<Vec2>::find_pairs(&mut AllPairs, &shapes, &mut pairs);
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);

        BroadPhase::<Vec2>::find_pairs(&mut AllPairs, &shapes[..1], &mut pairs);
        assert!(pairs.is_empty());
    }
}
