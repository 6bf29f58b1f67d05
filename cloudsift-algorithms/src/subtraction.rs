//! Distance-based point set subtraction
//!
//! Used for "crop vs. remainder" workflows: a region cut out of a cloud (for
//! example by an interactive editor) comes back as its own cloud, and the
//! points of the original that it covers are removed by nearest-neighbor
//! matching rather than by exact coordinate equality.

use crate::nearest_neighbor::SpatialIndex;
use cloudsift_core::{ensure_non_negative, IndexSet, NearestNeighborSearch, PointCloud, Result};
use log::debug;
use rayon::prelude::*;

/// Matching tolerance used by interactive crop workflows, in cloud units
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Result of [`subtract`]
#[derive(Debug, Clone, PartialEq)]
pub struct Subtraction {
    /// Reference indices whose nearest cut point lies within the tolerance
    pub matched: IndexSet,
    /// Unmatched reference points, in reference order, with their attributes
    pub remainder: PointCloud,
}

impl Subtraction {
    /// Reference indices that ended up in the remainder
    pub fn remainder_indices(&self, reference_len: usize) -> IndexSet {
        self.matched.complement(reference_len)
    }
}

/// Distance from every reference point to its nearest neighbor in `cut`
///
/// Entries are `f64::INFINITY` when `cut` is empty.
pub fn point_cloud_distance(reference: &PointCloud, cut: &PointCloud) -> Vec<f64> {
    if cut.is_empty() {
        return vec![f64::INFINITY; reference.len()];
    }
    let index = SpatialIndex::new(cut.points());
    point_cloud_distance_with(reference, &index)
}

/// Like [`point_cloud_distance`] but with a caller-supplied search structure
pub fn point_cloud_distance_with<S>(reference: &PointCloud, search: &S) -> Vec<f64>
where
    S: NearestNeighborSearch + Sync,
{
    reference
        .points()
        .par_iter()
        .map(|p| search.find_nearest(p).map_or(f64::INFINITY, |(_, d)| d))
        .collect()
}

/// Remove from `reference` every point that has a point of `cut` within
/// `tolerance`
///
/// # Arguments
/// * `reference` - Cloud to subtract from
/// * `cut` - Points to remove, matched by nearest neighbor
/// * `tolerance` - Largest nearest-neighbor distance still counted as a match
///
/// # Returns
/// * `Result<Subtraction>` - Matched reference indices and the remaining cloud
///
/// # Example
/// ```rust
/// use cloudsift_core::{PointCloud, Point3d};
/// use cloudsift_algorithms::{subtract, DEFAULT_TOLERANCE};
///
/// fn main() -> cloudsift_core::Result<()> {
///     let reference = PointCloud::from_points(vec![
///         Point3d::new(0.0, 0.0, 0.0),
///         Point3d::new(1.0, 0.0, 0.0),
///         Point3d::new(2.0, 0.0, 0.0),
///     ]);
///     let cut = PointCloud::from_points(vec![Point3d::new(1.0, 0.0, 0.005)]);
///
///     let result = subtract(&reference, &cut, DEFAULT_TOLERANCE)?;
///     assert_eq!(result.matched.as_slice(), &[1]);
///     assert_eq!(result.remainder.len(), 2);
///     Ok(())
/// }
/// ```
pub fn subtract(reference: &PointCloud, cut: &PointCloud, tolerance: f64) -> Result<Subtraction> {
    ensure_non_negative("tolerance", tolerance)?;

    if cut.is_empty() || reference.is_empty() {
        return Ok(Subtraction {
            matched: IndexSet::new(),
            remainder: reference.clone(),
        });
    }

    let distances = point_cloud_distance(reference, cut);
    let matched_mask: Vec<bool> = distances.iter().map(|&d| d <= tolerance).collect();
    let keep: Vec<bool> = matched_mask.iter().map(|&m| !m).collect();

    let matched = IndexSet::from_mask(&matched_mask);
    let remainder = reference.select_by_mask(&keep)?;

    debug!(
        "subtract: {} reference points, {} cut points, {} matched within {}",
        reference.len(),
        cut.len(),
        matched.len(),
        tolerance
    );

    Ok(Subtraction { matched, remainder })
}
