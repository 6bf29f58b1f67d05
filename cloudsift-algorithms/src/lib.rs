//! # Cloudsift Algorithms
//!
//! Point cloud processing for LiDAR ground filtering.
//!
//! This crate provides voxel downsampling and cropping, distance-based point
//! set subtraction, cloth simulation ground filtering, and a layered pipeline
//! composing them.

pub mod csf;
pub mod filtering;
pub mod nearest_neighbor;
pub mod pipeline;
pub mod subtraction;

// Re-export commonly used items
pub use csf::{classify_ground, simulate_cloth, ClothSurface, CsfParams, GroundPartition, Rigidness};
pub use filtering::*;
pub use nearest_neighbor::*;
pub use pipeline::{run_pipeline, Layer, PipelineConfig, Session};
pub use subtraction::*;
