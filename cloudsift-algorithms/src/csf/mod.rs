//! Cloth simulation ground filter
//!
//! Separates ground from non-ground points by dropping a simulated cloth onto
//! the upside-down cloud. In the inverted frame the terrain becomes a ceiling
//! the cloth hangs against, while trees and buildings turn into pits that the
//! springs keep the cloth from falling into. Points close to the settled cloth
//! are ground.
//!
//! The simulation runs on a particle grid covering the horizontal extent of
//! the cloud plus a small buffer. Every particle gets a floor from the lowest
//! point near it, falls under gravity, is held back by springs to its
//! neighbours and freezes for good once it reaches its floor.

mod cloth;
pub mod params;
mod rasterize;
mod slope;

pub use cloth::GridLayout;
pub use params::{CsfParams, Rigidness};

use cloth::{Cloth, START_OFFSET};
use cloudsift_core::{IndexSet, PointCloud, Result};
use log::{debug, info};
use rayon::prelude::*;

/// Settled cloth, in the elevation frame of the input cloud
#[derive(Debug, Clone, PartialEq)]
pub struct ClothSurface {
    layout: GridLayout,
    heights: Vec<f64>,
    landed: Vec<bool>,
    iterations: usize,
}

impl ClothSurface {
    fn from_cloth(cloth: &Cloth, iterations: usize) -> Self {
        Self {
            layout: cloth.layout,
            heights: cloth.particles.iter().map(|p| -p.height).collect(),
            landed: cloth.particles.iter().map(|p| !p.movable).collect(),
            iterations,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Particle elevations in row-major order
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Whether each particle touched the terrain, row-major
    pub fn landed(&self) -> &[bool] {
        &self.landed
    }

    /// Time steps the simulation ran for
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Elevation of particle `(row, col)`
    pub fn height(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.layout.rows() && col < self.layout.cols())
            .then(|| self.heights[self.layout.index(row, col)])
    }

    /// Cloth elevation above a horizontal position
    ///
    /// Bilinear interpolation between the four particles around `(x, y)`.
    /// Positions outside the grid use its nearest edge.
    pub fn height_at(&self, x: f64, y: f64) -> f64 {
        let (row, col) = self.layout.grid_coords(x, y);
        let max_row = (self.layout.rows() - 1) as f64;
        let max_col = (self.layout.cols() - 1) as f64;
        let row = row.max(0.0).min(max_row);
        let col = col.max(0.0).min(max_col);

        let (r0, c0) = (row.floor() as usize, col.floor() as usize);
        let r1 = (r0 + 1).min(self.layout.rows() - 1);
        let c1 = (c0 + 1).min(self.layout.cols() - 1);
        let (fr, fc) = (row - r0 as f64, col - c0 as f64);

        let h = |r, c| self.heights[self.layout.index(r, c)];
        let bottom = h(r0, c0) * (1.0 - fc) + h(r0, c1) * fc;
        let top = h(r1, c0) * (1.0 - fc) + h(r1, c1) * fc;
        bottom * (1.0 - fr) + top * fr
    }
}

/// Ground and non-ground indices of one classified cloud
///
/// The two sets are disjoint and together cover every index of the cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundPartition {
    pub ground: IndexSet,
    pub non_ground: IndexSet,
}

impl GroundPartition {
    /// Split `cloud` into its ground and non-ground clouds
    ///
    /// `cloud` must be the cloud that was classified.
    pub fn split(&self, cloud: &PointCloud) -> Result<(PointCloud, PointCloud)> {
        let ground = cloud.select_by_index(self.ground.as_slice())?;
        let non_ground = cloud.select_by_index(self.non_ground.as_slice())?;
        Ok((ground, non_ground))
    }
}

/// Drop the cloth onto `cloud` and return where it settled
///
/// Returns `Ok(None)` for an empty cloud.
pub fn simulate_cloth(cloud: &PointCloud, params: &CsfParams) -> Result<Option<ClothSurface>> {
    params.validate()?;
    let Some(bounds) = cloud.bounding_box() else {
        return Ok(None);
    };

    let layout = GridLayout::covering(&bounds, params.cloth_resolution)?;
    let floors = rasterize::rasterize(&layout, cloud.points());
    let start_height = -bounds.min.z + START_OFFSET;

    let mut cloth = Cloth::new(layout, start_height, floors, params.rigidness, params.time_step);
    debug!(
        "csf: {}x{} cloth at resolution {}, {} springs ({:?})",
        layout.cols(),
        layout.rows(),
        layout.resolution(),
        cloth.spring_count(),
        params.rigidness
    );

    let iterations = cloth.simulate(params.max_iterations);
    debug!(
        "csf: settled after {} of {} steps, {} particles still hanging",
        iterations,
        params.max_iterations,
        cloth.movable_count()
    );

    if params.slope_smoothing {
        let snapped = slope::smooth_slopes(&mut cloth);
        debug!("csf: slope smoothing snapped {} particles", snapped);
    }

    Ok(Some(ClothSurface::from_cloth(&cloth, iterations)))
}

/// Classify every point of `cloud` as ground or non-ground
///
/// A point is ground when it lies within `class_threshold` of the settled
/// cloth, measured vertically.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `params` - Cloth and classification parameters
///
/// # Returns
/// * `Result<GroundPartition>` - Disjoint ground and non-ground indices
///
/// # Example
/// ```rust
/// use cloudsift_core::{PointCloud, Point3d};
/// use cloudsift_algorithms::csf::{classify_ground, CsfParams, Rigidness};
///
/// fn main() -> cloudsift_core::Result<()> {
///     let mut points: Vec<Point3d> = (0..20)
///         .flat_map(|i| (0..20).map(move |j| Point3d::new(i as f64, j as f64, 0.0)))
///         .collect();
///     points.push(Point3d::new(10.0, 10.0, 6.0));
///     let cloud = PointCloud::from_points(points);
///
///     let params = CsfParams::new().with_rigidness(Rigidness::Flat);
///     let partition = classify_ground(&cloud, &params)?;
///     assert_eq!(partition.ground.len(), 400);
///     assert_eq!(partition.non_ground.as_slice(), &[400]);
///     Ok(())
/// }
/// ```
pub fn classify_ground(cloud: &PointCloud, params: &CsfParams) -> Result<GroundPartition> {
    let Some(surface) = simulate_cloth(cloud, params)? else {
        return Ok(GroundPartition::default());
    };

    let threshold = params.class_threshold;
    let is_ground: Vec<bool> = cloud
        .points()
        .par_iter()
        .map(|p| (p.z - surface.height_at(p.x, p.y)).abs() <= threshold)
        .collect();

    let ground = IndexSet::from_mask(&is_ground);
    let non_ground = ground.complement(cloud.len());
    info!(
        "csf: {} ground, {} non-ground of {} points",
        ground.len(),
        non_ground.len(),
        cloud.len()
    );

    Ok(GroundPartition { ground, non_ground })
}
