//! Integration tests for cloudsift-algorithms
//!
//! These tests run the algorithms on synthetic terrain and check the
//! properties callers rely on: partitions cover every point exactly once,
//! looser thresholds never lose ground points, and downsampling never grows
//! a cloud.

use approx::assert_relative_eq;
use cloudsift_algorithms::*;
use cloudsift_core::{Aabb, Point3d, PointCloud, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 100 x 100 plane at z = 0 with 20 tree points 5 to 10 units above plane points
fn plane_with_trees(rng: &mut StdRng) -> PointCloud {
    let mut points: Vec<Point3d> = (0..100)
        .flat_map(|i| (0..100).map(move |j| Point3d::new(i as f64, j as f64, 0.0)))
        .collect();
    for _ in 0..20 {
        let x = rng.gen_range(0..100) as f64;
        let y = rng.gen_range(0..100) as f64;
        points.push(Point3d::new(x, y, rng.gen_range(5.0..10.0)));
    }
    PointCloud::from_points(points)
}

/// Scattered samples of rolling hills with a few objects standing on them
fn rough_terrain(rng: &mut StdRng, n: usize) -> PointCloud {
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let x: f64 = rng.gen_range(0.0..40.0);
        let y: f64 = rng.gen_range(0.0..40.0);
        let ground = (x * 0.15).sin() * 2.0 + (y * 0.1).cos() + rng.gen_range(-0.05..0.05);
        let z = if i % 10 == 0 {
            ground + rng.gen_range(1.0..8.0)
        } else {
            ground
        };
        points.push(Point3d::new(x, y, z));
    }
    PointCloud::from_points(points)
}

fn assert_partition(partition: &GroundPartition, len: usize) {
    let mut all: Vec<usize> = partition
        .ground
        .iter()
        .chain(partition.non_ground.iter())
        .copied()
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..len).collect::<Vec<_>>());
}

#[test]
fn test_flat_plane_with_trees() {
    let mut rng = StdRng::seed_from_u64(7);
    let cloud = plane_with_trees(&mut rng);
    let params = CsfParams::new()
        .with_rigidness(Rigidness::Flat)
        .with_cloth_resolution(1.0)
        .with_class_threshold(0.5);

    let partition = classify_ground(&cloud, &params).unwrap();
    assert_eq!(partition.ground.as_slice(), (0..10_000).collect::<Vec<_>>().as_slice());
    assert_eq!(partition.non_ground.as_slice(), (10_000..10_020).collect::<Vec<_>>().as_slice());

    let (ground, non_ground) = partition.split(&cloud).unwrap();
    assert!(ground.iter().all(|p| p.z == 0.0));
    assert!(non_ground.iter().all(|p| p.z >= 5.0));
}

#[test]
fn test_csf_on_empty_cloud() {
    for rigidness in [Rigidness::SteepSlope, Rigidness::Relief, Rigidness::Flat] {
        let params = CsfParams::new().with_rigidness(rigidness);
        let partition = classify_ground(&PointCloud::new(), &params).unwrap();
        assert!(partition.ground.is_empty());
        assert!(partition.non_ground.is_empty());
    }
}

#[test]
fn test_csf_partition_law() {
    let mut rng = StdRng::seed_from_u64(11);
    let cloud = rough_terrain(&mut rng, 3000);

    for rigidness in [Rigidness::SteepSlope, Rigidness::Relief, Rigidness::Flat] {
        for slope_smoothing in [false, true] {
            let params = CsfParams::new()
                .with_rigidness(rigidness)
                .with_slope_smoothing(slope_smoothing)
                .with_cloth_resolution(2.0);
            let partition = classify_ground(&cloud, &params).unwrap();
            assert_partition(&partition, cloud.len());
        }
    }
}

#[test]
fn test_csf_threshold_monotonicity() {
    let mut rng = StdRng::seed_from_u64(23);
    let cloud = rough_terrain(&mut rng, 2000);

    let mut previous: Option<GroundPartition> = None;
    for threshold in [0.0, 0.1, 0.3, 0.5, 1.0, 2.5, 10.0] {
        let params = CsfParams::new().with_class_threshold(threshold).with_cloth_resolution(1.5);
        let partition = classify_ground(&cloud, &params).unwrap();
        if let Some(previous) = &previous {
            assert!(partition.ground.len() >= previous.ground.len());
            assert!(previous.ground.iter().all(|&i| partition.ground.contains(i)));
        }
        previous = Some(partition);
    }
}

#[test]
fn test_csf_zero_iterations_still_partitions() {
    let mut rng = StdRng::seed_from_u64(5);
    let cloud = rough_terrain(&mut rng, 500);
    let partition = classify_ground(&cloud, &CsfParams::new().with_max_iterations(0)).unwrap();
    assert_partition(&partition, cloud.len());
}

#[test]
fn test_downsample_monotonicity() {
    let mut rng = StdRng::seed_from_u64(3);
    let cloud = rough_terrain(&mut rng, 5000);

    let mut previous = cloud.len();
    for voxel_size in [0.1, 0.5, 1.0, 2.0, 5.0, 20.0] {
        let downsampled = voxel_downsample(&cloud, voxel_size).unwrap();
        assert!(downsampled.len() <= previous);
        previous = downsampled.len();
    }
}

#[test]
fn test_downsample_lattice_is_stable() {
    let points: Vec<Point3d> = (0..10)
        .flat_map(|i| (0..10).flat_map(move |j| (0..4).map(move |k| (i, j, k))))
        .map(|(i, j, k)| Point3d::new(i as f64 * 0.5, j as f64 * 0.5, k as f64 * 0.5))
        .collect();
    let cloud = PointCloud::from_points(points);

    let once = voxel_downsample(&cloud, 1.0).unwrap();
    let twice = voxel_downsample(&once, 1.0).unwrap();
    assert_eq!(once.len(), 5 * 5 * 2);
    assert_eq!(twice.len(), once.len());
}

#[test]
fn test_downsample_single_voxel() {
    let mut rng = StdRng::seed_from_u64(17);
    let cloud = rough_terrain(&mut rng, 400);
    let bounds = cloud.bounding_box().unwrap();

    let downsampled = voxel_downsample(&cloud, bounds.diagonal() * 1.01).unwrap();
    assert_eq!(downsampled.len(), 1);

    let mean = cloud.iter().fold(Point3d::origin(), |acc, p| acc + p.coords) / cloud.len() as f64;
    assert_relative_eq!(downsampled[0], mean, epsilon = 1e-9);
}

#[test]
fn test_downsample_averages_attributes() {
    let cloud = PointCloud::from_points(vec![
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(0.5, 0.0, 0.0),
    ])
    .with_colors(vec![Rgb::BLACK, Rgb::WHITE])
    .unwrap();
    let downsampled = voxel_downsample(&cloud, 1.0).unwrap();
    assert_eq!(downsampled.colors().unwrap(), &[Rgb::new(0.5, 0.5, 0.5)]);
}

#[test]
fn test_subtraction_partition_law() {
    let mut rng = StdRng::seed_from_u64(29);
    let reference = rough_terrain(&mut rng, 2000);
    let bounds = Aabb::new(Point3d::new(10.0, 10.0, -10.0), Point3d::new(20.0, 25.0, 20.0));
    let cut = crop_by_aabb(&reference, &bounds).unwrap();

    let result = subtract(&reference, &cut, 0.0).unwrap();
    let rest = result.remainder_indices(reference.len());
    assert_eq!(result.matched.len(), cut.len());
    assert_eq!(result.matched.len() + rest.len(), reference.len());
    assert!(rest.iter().all(|&i| !result.matched.contains(i)));
    assert_eq!(result.remainder, reference.select_by_index(rest.as_slice()).unwrap());
    assert!(result.remainder.iter().all(|p| !bounds.contains(p)));
}

#[test]
fn test_subtraction_with_empty_cut() {
    let mut rng = StdRng::seed_from_u64(31);
    let reference = rough_terrain(&mut rng, 100);
    for tolerance in [0.0, DEFAULT_TOLERANCE, 100.0] {
        let result = subtract(&reference, &PointCloud::new(), tolerance).unwrap();
        assert_eq!(result.remainder, reference);
        assert!(result.matched.is_empty());
    }
}

#[test]
fn test_crop_by_radius_then_subtract() {
    let mut rng = StdRng::seed_from_u64(37);
    let reference = rough_terrain(&mut rng, 1000);
    let center = reference[0];

    let cut = crop_by_radius(&reference, &center, 5.0).unwrap();
    let result = subtract(&reference, &cut, 0.0).unwrap();
    assert!(result.matched.contains(0));
    assert_eq!(result.remainder.len(), reference.len() - cut.len());
    assert!(result
        .remainder
        .iter()
        .all(|p| nalgebra::distance(p, &center) > 5.0));
}

#[test]
fn test_pipeline_on_terrain() {
    let mut rng = StdRng::seed_from_u64(41);
    let source = plane_with_trees(&mut rng);
    let cut = crop_by_aabb(
        &source,
        &Aabb::new(Point3d::new(0.0, 0.0, -1.0), Point3d::new(9.0, 9.0, 20.0)),
    )
    .unwrap();

    let config = PipelineConfig {
        voxel_size: None,
        crop_tolerance: Some(0.0),
        csf: CsfParams::new().with_rigidness(Rigidness::Flat),
    };
    let session = run_pipeline(Session::new(source.clone()), Some(&cut), &config).unwrap();

    let remainder = session.layer(Layer::Remainder).unwrap();
    let ground = session.layer(Layer::Ground).unwrap();
    let non_ground = session.layer(Layer::NonGround).unwrap();
    assert_eq!(session.layer(Layer::Cropped).unwrap().len(), cut.len());
    assert_eq!(remainder.len(), source.len() - cut.len());
    assert_eq!(ground.len() + non_ground.len(), remainder.len());
    assert!(ground.iter().all(|p| p.z == 0.0));
}
