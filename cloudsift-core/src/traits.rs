//! Core traits for cloudsift

use crate::point::Point3d;

/// Trait for nearest neighbor search functionality
///
/// Distances are Euclidean, in the units of the indexed coordinates.
pub trait NearestNeighborSearch {
    /// Find the single closest point, if the index holds any
    fn find_nearest(&self, query: &Point3d) -> Option<(usize, f64)>;

    /// Find the k nearest neighbors to a query point, closest first
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)>;

    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)>;
}
