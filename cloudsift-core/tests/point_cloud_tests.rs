//! Integration tests for the cloudsift-core data model

use cloudsift_core::*;

fn sample_cloud() -> PointCloud {
    PointCloud::from_xyz(&[0.0, 1.0, 2.0, 3.0], &[0.0, 0.0, 1.0, 1.0], &[5.0, 6.0, 7.0, 8.0])
        .unwrap()
        .with_colors(vec![
            Rgb::from_u8([255, 0, 0]),
            Rgb::from_u8([0, 255, 0]),
            Rgb::from_u8([0, 0, 255]),
            Rgb::from_u16([65535, 65535, 0]),
        ])
        .unwrap()
        .with_normals(vec![Vector3d::z(); 4])
        .unwrap()
}

#[test]
fn test_parallel_arrays_round_trip() {
    let cloud = sample_cloud();
    let (xs, ys, zs) = cloud.to_xyz();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(ys, vec![0.0, 0.0, 1.0, 1.0]);
    assert_eq!(zs, vec![5.0, 6.0, 7.0, 8.0]);

    let err = PointCloud::from_xyz(&[0.0, 1.0], &[0.0], &[0.0, 1.0]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { parameter: "y", .. }));
}

#[test]
fn test_selection_and_inverse_cover_cloud() {
    let cloud = sample_cloud();
    let picked = IndexSet::from_indices(vec![3, 1], cloud.len()).unwrap();

    let selected = cloud.select_by_index(picked.as_slice()).unwrap();
    let rest = cloud.select_by_index_inverted(picked.as_slice()).unwrap();
    assert_eq!(selected.len() + rest.len(), cloud.len());
    assert_eq!(selected[0], Point3d::new(1.0, 0.0, 6.0));
    assert_eq!(rest[1], Point3d::new(2.0, 1.0, 7.0));
    assert_eq!(selected.colors().unwrap()[1].to_u8(), [255, 255, 0]);
    assert!(rest.has_normals());

    let complement = picked.complement(cloud.len());
    assert_eq!(cloud.select_by_index(complement.as_slice()).unwrap(), rest);
}

#[test]
fn test_out_of_range_selection() {
    let cloud = sample_cloud();
    assert_eq!(
        cloud.select_by_index(&[0, 4]).unwrap_err(),
        Error::IndexOutOfBounds { index: 4, len: 4 }
    );
    assert!(cloud.select_by_index_inverted(&[9]).is_err());
    assert!(IndexSet::from_indices(vec![4], 4).is_err());
}

#[test]
fn test_attribute_length_mismatch() {
    let cloud = PointCloud::from_points(vec![Point3d::origin(); 3]);
    let err = cloud.clone().with_colors(vec![Rgb::WHITE; 2]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { parameter: "colors", .. }));
    assert!(cloud.with_normals(vec![Vector3d::x(); 4]).is_err());
}

#[test]
fn test_deserialization_checks_attribute_lengths() {
    let json = serde_json::to_string(&sample_cloud()).unwrap();
    let cloud: PointCloud = serde_json::from_str(&json).unwrap();
    assert_eq!(cloud, sample_cloud());

    let positions_only = r#"{"points": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]}"#;
    let cloud: PointCloud = serde_json::from_str(positions_only).unwrap();
    assert_eq!(cloud.len(), 2);
    assert!(!cloud.has_colors());

    let short_colors = r#"{
        "points": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        "colors": [{"r": 1.0, "g": 0.0, "b": 0.0}]
    }"#;
    let err = serde_json::from_str::<PointCloud>(short_colors).unwrap_err();
    assert!(err.to_string().contains("colors"), "{err}");

    let long_normals = r#"{
        "points": [[0.0, 0.0, 0.0]],
        "normals": [[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]
    }"#;
    assert!(serde_json::from_str::<PointCloud>(long_normals).is_err());
}

#[test]
fn test_push_requires_matching_attributes() {
    let mut cloud = sample_cloud();
    let mut record = PointRecord::new(Point3d::new(9.0, 9.0, 9.0));
    assert!(cloud.push(record).is_err());
    assert_eq!(cloud.len(), 4);

    record.color = Some(Rgb::BLACK);
    record.normal = Some(Vector3d::z());
    cloud.push(record).unwrap();
    assert_eq!(cloud.get(4), Some(record));
}

#[test]
fn test_bounding_box_of_cloud() {
    let cloud = sample_cloud();
    let bounds = cloud.bounding_box().unwrap();
    assert_eq!(bounds.min, Point3d::new(0.0, 0.0, 5.0));
    assert_eq!(bounds.max, Point3d::new(3.0, 1.0, 8.0));
    assert!(cloud.iter().all(|p| bounds.contains(p)));
    assert!(PointCloud::new().bounding_box().is_none());
}

#[test]
fn test_color_depth_conversion() {
    let color = Rgb::from_u16([65535, 32768, 0]);
    assert_eq!(color.to_u16(), [65535, 32768, 0]);
    assert_eq!(color.to_u8(), [255, 128, 0]);
    assert_eq!(Rgb::new(1.5, -0.2, 0.5).to_u16(), [65535, 0, 32768]);
}
