//! Cloth simulation filter parameters

use cloudsift_core::{ensure_non_negative, ensure_positive, Error, Result};
use serde::{Deserialize, Serialize};

/// Stiffness class of the simulated cloth
///
/// The numeric codes follow the usual ground-filter convention:
/// `1` steep slope, `2` relief, `3` flat. A steep-slope cloth is the stiffest
/// and keeps to the overall terrain shape; a flat cloth is the most elastic
/// and follows the floor closely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rigidness {
    SteepSlope,
    #[default]
    Relief,
    Flat,
}

impl Rigidness {
    pub fn code(self) -> u8 {
        match self {
            Rigidness::SteepSlope => 1,
            Rigidness::Relief => 2,
            Rigidness::Flat => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Rigidness::SteepSlope),
            2 => Ok(Rigidness::Relief),
            3 => Ok(Rigidness::Flat),
            other => Err(Error::invalid(
                "rigidness",
                format!("expected 1 (steep slope), 2 (relief) or 3 (flat), got {other}"),
            )),
        }
    }

    /// Constraint relaxation passes folded into every time step
    pub(crate) fn constraint_passes(self) -> u32 {
        match self {
            Rigidness::SteepSlope => 3,
            Rigidness::Relief => 2,
            Rigidness::Flat => 1,
        }
    }

    /// Whether diagonal shear springs join the structural ones
    pub(crate) fn has_shear_springs(self) -> bool {
        !matches!(self, Rigidness::Flat)
    }

    /// Whether two-cell bending springs join the network
    pub(crate) fn has_bending_springs(self) -> bool {
        matches!(self, Rigidness::SteepSlope)
    }
}

/// Parameters of one [`classify_ground`](super::classify_ground) call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsfParams {
    /// Horizontal spacing between cloth particles, in cloud units
    pub cloth_resolution: f64,
    /// Upper bound on simulation time steps
    pub max_iterations: usize,
    /// Largest vertical distance to the cloth still classified as ground
    pub class_threshold: f64,
    pub rigidness: Rigidness,
    /// Snap hanging cloth regions onto gentle slopes after settling
    pub slope_smoothing: bool,
    /// Integration time step
    pub time_step: f64,
}

impl Default for CsfParams {
    fn default() -> Self {
        Self {
            cloth_resolution: 1.0,
            max_iterations: 500,
            class_threshold: 0.5,
            rigidness: Rigidness::Relief,
            slope_smoothing: true,
            time_step: 0.65,
        }
    }
}

impl CsfParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cloth_resolution(mut self, cloth_resolution: f64) -> Self {
        self.cloth_resolution = cloth_resolution;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_class_threshold(mut self, class_threshold: f64) -> Self {
        self.class_threshold = class_threshold;
        self
    }

    pub fn with_rigidness(mut self, rigidness: Rigidness) -> Self {
        self.rigidness = rigidness;
        self
    }

    pub fn with_slope_smoothing(mut self, slope_smoothing: bool) -> Self {
        self.slope_smoothing = slope_smoothing;
        self
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Check every parameter; `max_iterations` is unsigned so any value is valid
    pub fn validate(&self) -> Result<()> {
        ensure_positive("cloth_resolution", self.cloth_resolution)?;
        ensure_non_negative("class_threshold", self.class_threshold)?;
        ensure_positive("time_step", self.time_step)?;
        Ok(())
    }
}
