//! Filtering algorithms

use cloudsift_core::{
    ensure_non_negative, ensure_positive, Aabb, Point3d, PointCloud, Result, Rgb, Vector3d,
};
use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Integer grid coordinates of a voxel
type VoxelKey = (i64, i64, i64);

/// Running sums for the points that fall into one voxel
struct VoxelAccumulator {
    position: Vector3d,
    color: [f64; 3],
    normal: Vector3d,
    count: usize,
}

impl VoxelAccumulator {
    fn new() -> Self {
        Self {
            position: Vector3d::zeros(),
            color: [0.0; 3],
            normal: Vector3d::zeros(),
            count: 0,
        }
    }
}

/// Voxel grid downsampling
///
/// Partitions space into cubes of edge `voxel_size`, anchored at the minimum
/// corner of the cloud's bounding box, and replaces the points of every
/// occupied cube by their average. Colors are averaged the same way and
/// averaged normals are rescaled to unit length.
///
/// Points are grouped by their integer voxel coordinates and the output is
/// ordered by those coordinates, so the result does not depend on the input
/// order.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `voxel_size` - Size of each voxel cube, must be positive
///
/// # Returns
/// * `Result<PointCloud>` - One point per occupied voxel
///
/// # Example
/// ```rust
/// use cloudsift_core::{PointCloud, Point3d};
/// use cloudsift_algorithms::voxel_downsample;
///
/// fn main() -> cloudsift_core::Result<()> {
///     let cloud = PointCloud::from_points(vec![
///         Point3d::new(0.0, 0.0, 0.0),
///         Point3d::new(0.1, 0.0, 0.0),
///         Point3d::new(0.0, 0.1, 0.0),
///         Point3d::new(0.0, 0.0, 0.1),
///     ]);
///
///     let downsampled = voxel_downsample(&cloud, 0.2)?;
///     assert_eq!(downsampled.len(), 1);
///     Ok(())
/// }
/// ```
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: f64) -> Result<PointCloud> {
    ensure_positive("voxel_size", voxel_size)?;

    let Some(bounds) = cloud.bounding_box() else {
        return Ok(cloud.clone());
    };
    let origin = bounds.min;

    let keys: Vec<VoxelKey> = cloud
        .points()
        .par_iter()
        .map(|p| voxel_key(p, &origin, voxel_size))
        .collect();

    let mut voxels: BTreeMap<VoxelKey, VoxelAccumulator> = BTreeMap::new();
    for (i, key) in keys.into_iter().enumerate() {
        let acc = voxels.entry(key).or_insert_with(VoxelAccumulator::new);
        acc.position += cloud[i].coords;
        if let Some(colors) = cloud.colors() {
            let c = colors[i];
            acc.color[0] += c.r;
            acc.color[1] += c.g;
            acc.color[2] += c.b;
        }
        if let Some(normals) = cloud.normals() {
            acc.normal += normals[i];
        }
        acc.count += 1;
    }

    debug!(
        "voxel downsample: {} points -> {} voxels (voxel_size = {})",
        cloud.len(),
        voxels.len(),
        voxel_size
    );

    let mut points = Vec::with_capacity(voxels.len());
    let mut colors = Vec::with_capacity(voxels.len());
    let mut normals = Vec::with_capacity(voxels.len());
    for acc in voxels.values() {
        let n = acc.count as f64;
        points.push(Point3d::from(acc.position / n));
        colors.push(Rgb::from_channels(acc.color.map(|c| c / n)));
        normals.push(
            (acc.normal / n)
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(Vector3d::zeros),
        );
    }

    let mut output = PointCloud::from_points(points);
    if cloud.has_colors() {
        output = output.with_colors(colors)?;
    }
    if cloud.has_normals() {
        output = output.with_normals(normals)?;
    }
    Ok(output)
}

fn voxel_key(point: &Point3d, origin: &Point3d, voxel_size: f64) -> VoxelKey {
    let cell = (point - origin) / voxel_size;
    (
        cell.x.floor() as i64,
        cell.y.floor() as i64,
        cell.z.floor() as i64,
    )
}

/// Keep the points inside an axis-aligned box (boundary included)
pub fn crop_by_aabb(cloud: &PointCloud, bounds: &Aabb) -> Result<PointCloud> {
    let mask: Vec<bool> = cloud.points().par_iter().map(|p| bounds.contains(p)).collect();
    cloud.select_by_mask(&mask)
}

/// Keep the points within `radius` of `center` (boundary included)
pub fn crop_by_radius(cloud: &PointCloud, center: &Point3d, radius: f64) -> Result<PointCloud> {
    ensure_non_negative("radius", radius)?;
    let radius_squared = radius * radius;
    let mask: Vec<bool> = cloud
        .points()
        .par_iter()
        .map(|p| (p - center).norm_squared() <= radius_squared)
        .collect();
    cloud.select_by_mask(&mask)
}
