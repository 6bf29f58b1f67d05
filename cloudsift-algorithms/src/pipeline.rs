//! Layered processing session
//!
//! A [`Session`] holds one cloud per [`Layer`] together with which layers a
//! host application currently shows. [`run_pipeline`] takes a session and
//! returns a new one with the derived layers filled in; nothing is kept
//! between calls.

use crate::csf::{classify_ground, CsfParams};
use crate::filtering::voxel_downsample;
use crate::subtraction::{subtract, DEFAULT_TOLERANCE};
use cloudsift_core::{ensure_non_negative, ensure_positive, PointCloud, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Named stage of the pipeline a cloud belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Source,
    Downsampled,
    /// Points of the working cloud covered by the cut
    Cropped,
    /// Points of the working cloud left after removing the cut
    Remainder,
    Ground,
    NonGround,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Source,
        Layer::Downsampled,
        Layer::Cropped,
        Layer::Remainder,
        Layer::Ground,
        Layer::NonGround,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Source => "source",
            Layer::Downsampled => "downsampled",
            Layer::Cropped => "cropped",
            Layer::Remainder => "remainder",
            Layer::Ground => "ground",
            Layer::NonGround => "non_ground",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Clouds of one editing session, keyed by layer
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    source: PointCloud,
    derived: BTreeMap<Layer, PointCloud>,
    visible: BTreeSet<Layer>,
}

impl Session {
    /// Session with only a visible source layer
    pub fn new(source: PointCloud) -> Self {
        Self {
            source,
            derived: BTreeMap::new(),
            visible: BTreeSet::from([Layer::Source]),
        }
    }

    pub fn source(&self) -> &PointCloud {
        &self.source
    }

    pub fn layer(&self, layer: Layer) -> Option<&PointCloud> {
        match layer {
            Layer::Source => Some(&self.source),
            other => self.derived.get(&other),
        }
    }

    /// Store `cloud` as `layer` and make it visible
    pub fn set_layer(&mut self, layer: Layer, cloud: PointCloud) {
        match layer {
            Layer::Source => self.source = cloud,
            other => {
                self.derived.insert(other, cloud);
            }
        }
        self.visible.insert(layer);
    }

    /// Remove a derived layer; the source layer cannot be removed
    pub fn remove_layer(&mut self, layer: Layer) -> Option<PointCloud> {
        if layer == Layer::Source {
            return None;
        }
        self.visible.remove(&layer);
        self.derived.remove(&layer)
    }

    /// Drop every derived layer, keeping the source
    pub fn clear_derived(&mut self) {
        self.derived.clear();
        self.visible.retain(|&l| l == Layer::Source);
    }

    /// Layers that currently hold a cloud, in pipeline order
    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        std::iter::once(Layer::Source).chain(self.derived.keys().copied())
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        self.visible.contains(&layer)
    }

    /// Show or hide a layer; only layers holding a cloud can be shown
    pub fn set_visible(&mut self, layer: Layer, visible: bool) {
        if visible && self.layer(layer).is_some() {
            self.visible.insert(layer);
        } else {
            self.visible.remove(&layer);
        }
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.visible.iter().copied()
    }

    /// Cloud further work starts from: the downsampled one if present
    pub fn active(&self) -> &PointCloud {
        self.layer(Layer::Downsampled).unwrap_or(&self.source)
    }
}

/// Stages and parameters of one [`run_pipeline`] call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Voxel edge for downsampling; absent or zero skips the stage
    pub voxel_size: Option<f64>,
    /// Matching tolerance for the cut, [`DEFAULT_TOLERANCE`] when absent
    pub crop_tolerance: Option<f64>,
    pub csf: CsfParams,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.downsample_size() {
            ensure_positive("voxel_size", size)?;
        }
        ensure_non_negative("crop_tolerance", self.tolerance())?;
        self.csf.validate()
    }

    fn downsample_size(&self) -> Option<f64> {
        self.voxel_size.filter(|&size| size != 0.0)
    }

    fn tolerance(&self) -> f64 {
        self.crop_tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }
}

/// Run downsampling, cut subtraction and ground classification
///
/// Derived layers from earlier runs are dropped first. The source is
/// downsampled when `config.voxel_size` asks for it; with a `cut`, the
/// working cloud is split into [`Layer::Cropped`] and [`Layer::Remainder`]
/// and only the remainder is classified. The ground filter always runs and
/// fills [`Layer::Ground`] and [`Layer::NonGround`].
///
/// The configuration is checked before any stage runs, so an error leaves
/// no partial result.
///
/// # Example
/// ```rust
/// use cloudsift_core::{PointCloud, Point3d};
/// use cloudsift_algorithms::pipeline::{run_pipeline, Layer, PipelineConfig, Session};
///
/// fn main() -> cloudsift_core::Result<()> {
///     let points = (0..10)
///         .flat_map(|i| (0..10).map(move |j| Point3d::new(i as f64, j as f64, 0.0)))
///         .collect();
///     let session = Session::new(PointCloud::from_points(points));
///
///     let session = run_pipeline(session, None, &PipelineConfig::default())?;
///     assert_eq!(session.layer(Layer::Ground).map(|c| c.len()), Some(100));
///     Ok(())
/// }
/// ```
pub fn run_pipeline(
    mut session: Session,
    cut: Option<&PointCloud>,
    config: &PipelineConfig,
) -> Result<Session> {
    config.validate()?;
    session.clear_derived();

    if let Some(size) = config.downsample_size() {
        let downsampled = voxel_downsample(session.source(), size)?;
        info!(
            "pipeline: downsampled {} points to {} at voxel size {}",
            session.source().len(),
            downsampled.len(),
            size
        );
        session.set_layer(Layer::Downsampled, downsampled);
    }

    let target = match cut {
        Some(cut) => {
            let working = session.active();
            let result = subtract(working, cut, config.tolerance())?;
            let cropped = working.select_by_index(result.matched.as_slice())?;
            info!(
                "pipeline: cut removed {} of {} points",
                cropped.len(),
                working.len()
            );
            session.set_layer(Layer::Cropped, cropped);
            session.set_layer(Layer::Remainder, result.remainder);
            Layer::Remainder
        }
        None if session.layer(Layer::Downsampled).is_some() => Layer::Downsampled,
        None => Layer::Source,
    };

    let (ground, non_ground) = match session.layer(target) {
        Some(cloud) => classify_ground(cloud, &config.csf)?.split(cloud)?,
        None => (PointCloud::new(), PointCloud::new()),
    };
    session.set_layer(Layer::Ground, ground);
    session.set_layer(Layer::NonGround, non_ground);

    Ok(session)
}
