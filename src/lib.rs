//! # cloudsift
//!
//! Ground filtering and point selection for LiDAR point clouds.
//!
//! This is the umbrella crate that provides convenient access to all cloudsift
//! functionality. You can use this crate to get everything in one place, or
//! use individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Point cloud container, colors, bounding boxes, index sets
//! - **Algorithms**: Voxel downsampling, cropping, point set subtraction,
//!   cloth simulation ground filtering and the layered pipeline
//!
//! ## Quick Start
//!
//! ```rust
//! use cloudsift::prelude::*;
//!
//! let points: Vec<Point3d> = (0..10)
//!     .flat_map(|i| (0..10).map(move |j| Point3d::new(i as f64, j as f64, 0.0)))
//!     .collect();
//! let cloud = PointCloud::from_points(points);
//!
//! let downsampled = voxel_downsample(&cloud, 2.0).unwrap();
//! let partition = classify_ground(&downsampled, &CsfParams::default()).unwrap();
//! assert_eq!(partition.ground.len(), downsampled.len());
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core and algorithms
//! - `algorithms`: Point cloud processing algorithms

// Re-export core functionality
pub use cloudsift_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use cloudsift_algorithms as algorithms;

/// Convenient imports for common use cases
pub mod prelude {
    pub use cloudsift_core::*;

    #[cfg(feature = "algorithms")]
    pub use cloudsift_algorithms::*;
}
