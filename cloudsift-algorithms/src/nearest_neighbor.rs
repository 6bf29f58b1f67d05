//! Nearest neighbor search implementations

use cloudsift_core::{NearestNeighborSearch, Point3d};
use rstar::{PointDistance, RTree};

/// A point with its index for spatial data structures
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedPoint {
    point: Point3d,
    index: usize,
}

impl IndexedPoint {
    fn query(point: &Point3d) -> Self {
        Self {
            point: *point,
            index: usize::MAX,
        }
    }
}

impl rstar::Point for IndexedPoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 3;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            point: Point3d::new(generator(0), generator(1), generator(2)),
            index: usize::MAX,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        self.point[index]
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        &mut self.point[index]
    }
}

/// R*-tree backed spatial index over a fixed set of points
///
/// Built once with bulk loading, then shared read-only; queries are safe to
/// run from many threads at once.
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    pub fn new(points: &[Point3d]) -> Self {
        let indexed = points
            .iter()
            .enumerate()
            .map(|(index, point)| IndexedPoint { point: *point, index })
            .collect();
        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl NearestNeighborSearch for SpatialIndex {
    fn find_nearest(&self, query: &Point3d) -> Option<(usize, f64)> {
        let q = IndexedPoint::query(query);
        self.tree
            .nearest_neighbor(&q)
            .map(|found| (found.index, found.distance_2(&q).sqrt()))
    }

    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        let q = IndexedPoint::query(query);
        self.tree
            .nearest_neighbor_iter(&q)
            .take(k)
            .map(|found| (found.index, found.distance_2(&q).sqrt()))
            .collect()
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let q = IndexedPoint::query(query);
        self.tree
            .locate_within_distance(q, radius * radius)
            .map(|found| (found.index, found.distance_2(&q).sqrt()))
            .collect()
    }
}

/// Simple brute force nearest neighbor search for small datasets
///
/// Every query scans all points, so answering one query per point of another
/// cloud costs O(N·M). Kept as a reference to check [`SpatialIndex`] against.
pub struct BruteForceSearch {
    points: Vec<Point3d>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3d]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    fn distances<'a>(&'a self, query: &'a Point3d) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.points
            .iter()
            .enumerate()
            .map(move |(idx, point)| (idx, nalgebra::distance(point, query)))
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_nearest(&self, query: &Point3d) -> Option<(usize, f64)> {
        self.distances(query).min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        let mut distances: Vec<(usize, f64)> = self.distances(query).collect();

        // Sort by distance and take k nearest
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        self.distances(query)
            .filter(|&(_, distance)| distance <= radius)
            .collect()
    }
}
