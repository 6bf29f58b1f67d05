//! Core data structures and traits for cloudsift
//!
//! This crate provides the point cloud container shared by the cloudsift
//! algorithms: positions with optional colors and normals, bounding boxes,
//! index sets for subset selection, and the common error type.

pub mod bounds;
pub mod error;
pub mod index_set;
pub mod point;
pub mod point_cloud;
pub mod traits;

pub use bounds::*;
pub use error::*;
pub use index_set::*;
pub use point::*;
pub use point_cloud::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
