//! Static 2-D k-d tree over support coordinates.
//!
//! Built once, median-split, then queried read-only from any number of
//! threads. Coordinates are compared in plain degree space, so "nearest" is
//! planar, not geodesic.

use std::cmp::Ordering;

use glam::DVec2;

#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<DVec2>,
    /// Lower rank wins when two points are equally distant.
    tie_ranks: Vec<usize>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split dimension (0 = x, 1 = y)
    split_dim: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub dist_sq: f64,
}

impl KdTree {
    /// Builds a tree where ties resolve to the earlier point.
    ///
    /// Returns `None` if `points` is empty.
    pub fn build(points: &[DVec2]) -> Option<Self> {
        let ranks: Vec<usize> = (0..points.len()).collect();
        Self::build_with_tie_ranks(points, ranks)
    }

    /// Builds a tree with an explicit tie-break rank per point.
    ///
    /// # Panics
    ///
    /// Panics if `tie_ranks` and `points` differ in length.
    pub fn build_with_tie_ranks(points: &[DVec2], tie_ranks: Vec<usize>) -> Option<Self> {
        assert_eq!(
            points.len(),
            tie_ranks.len(),
            "every point needs a tie-break rank"
        );
        if points.is_empty() {
            return None;
        }

        let points_vec: Vec<DVec2> = points.to_vec();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        Self::build_recursive(&points_vec, &mut indices, 0, &mut nodes);

        Some(Self {
            nodes,
            points: points_vec,
            tie_ranks,
        })
    }

    fn build_recursive(
        points: &[DVec2],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 2;
        indices.sort_by(|&a, &b| points[a][split_dim].total_cmp(&points[b][split_dim]));

        let median = indices.len() / 2;
        let point_idx = indices[median];

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx,
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);

        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    /// Finds the single nearest point, resolving exact distance ties by rank.
    pub fn nearest(&self, query: DVec2) -> Option<Neighbor> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best: Option<Neighbor> = None;
        self.nearest_recursive(0, query, &mut best);
        best
    }

    fn nearest_recursive(&self, node_idx: usize, query: DVec2, best: &mut Option<Neighbor>) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        let candidate = Neighbor {
            index: node.point_idx,
            dist_sq: query.distance_squared(point),
        };
        if self.is_better(candidate, *best) {
            *best = Some(candidate);
        }

        let diff = query[node.split_dim] - point[node.split_dim];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(first_idx) = first {
            self.nearest_recursive(first_idx, query, best);
        }

        // `<=` keeps exploring when the far side could hold an equally distant,
        // lower-ranked point.
        let diff_sq = diff * diff;
        if let Some(second_idx) = second {
            let bound = best.map_or(f64::INFINITY, |b| b.dist_sq);
            if diff_sq <= bound {
                self.nearest_recursive(second_idx, query, best);
            }
        }
    }

    fn is_better(&self, candidate: Neighbor, current: Option<Neighbor>) -> bool {
        let Some(current) = current else {
            return true;
        };
        match candidate.dist_sq.total_cmp(&current.dist_sq) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self.tie_ranks[candidate.index] < self.tie_ranks[current.index],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_nearest(points: &[DVec2], ranks: &[usize], query: DVec2) -> usize {
        (0..points.len())
            .min_by(|&a, &b| {
                query
                    .distance_squared(points[a])
                    .total_cmp(&query.distance_squared(points[b]))
                    .then(ranks[a].cmp(&ranks[b]))
            })
            .unwrap()
    }

    #[test]
    fn test_kdtree_build_empty() {
        assert!(KdTree::build(&[]).is_none());
    }

    #[test]
    fn test_kdtree_single_point() {
        let tree = KdTree::build(&[DVec2::new(45.0, 2.0)]).unwrap();
        assert_eq!(tree.len(), 1);
        let n = tree.nearest(DVec2::new(50.0, -3.0)).unwrap();
        assert_eq!(n.index, 0);
    }

    #[test]
    fn test_kdtree_finds_exact_point() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(5.0, 5.0),
        ];
        let tree = KdTree::build(&points).unwrap();
        let n = tree.nearest(DVec2::new(5.0, 5.0)).unwrap();
        assert_eq!(n.index, 2);
        assert_eq!(n.dist_sq, 0.0);
    }

    #[test]
    fn test_kdtree_matches_brute_force() {
        // Deterministic pseudo-random grid with duplicates.
        let mut points = Vec::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..300 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let lat = 42.0 + (seed % 1000) as f64 / 100.0;
            let lon = -5.0 + ((seed >> 20) % 1400) as f64 / 100.0;
            points.push(DVec2::new(lat, lon));
        }
        let ranks: Vec<usize> = (0..points.len()).rev().collect();
        let tree = KdTree::build_with_tie_ranks(&points, ranks.clone()).unwrap();

        for i in 0..200 {
            let query = DVec2::new(42.0 + i as f64 * 0.05, -5.0 + i as f64 * 0.07);
            let expected = brute_force_nearest(&points, &ranks, query);
            assert_eq!(tree.nearest(query).unwrap().index, expected, "query {query}");
        }
    }

    #[test]
    fn test_kdtree_tie_prefers_lower_rank() {
        let points = vec![DVec2::new(45.0, 1.5), DVec2::new(45.0, 2.5)];
        let query = DVec2::new(45.0, 2.0);

        let tree = KdTree::build_with_tie_ranks(&points, vec![1, 0]).unwrap();
        assert_eq!(tree.nearest(query).unwrap().index, 1);

        let tree = KdTree::build_with_tie_ranks(&points, vec![0, 1]).unwrap();
        assert_eq!(tree.nearest(query).unwrap().index, 0);
    }

    #[test]
    fn test_kdtree_tie_across_split_plane() {
        // Equidistant points on both sides of the root split.
        let points = vec![
            DVec2::new(44.0, 2.0),
            DVec2::new(45.0, 2.0),
            DVec2::new(46.0, 2.0),
            DVec2::new(47.0, 2.0),
        ];
        let query = DVec2::new(45.5, 2.0);
        let tree = KdTree::build_with_tie_ranks(&points, vec![3, 2, 0, 1]).unwrap();
        assert_eq!(tree.nearest(query).unwrap().index, 2);
        let tree = KdTree::build_with_tie_ranks(&points, vec![3, 0, 2, 1]).unwrap();
        assert_eq!(tree.nearest(query).unwrap().index, 1);
    }

    #[test]
    #[should_panic(expected = "every point needs a tie-break rank")]
    fn test_kdtree_rank_length_mismatch_panics() {
        KdTree::build_with_tie_ranks(&[DVec2::ZERO], vec![]);
    }
}
