//! Point, vector and color types

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
///
/// Double precision keeps full resolution for projected (UTM) coordinates,
/// where values in the millions are common.
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

const U8_SCALE: f64 = 255.0;
const U16_SCALE: f64 = 65535.0;

/// An RGB color with channels normalized to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channels
    pub fn from_u8(rgb: [u8; 3]) -> Self {
        Self::new(
            rgb[0] as f64 / U8_SCALE,
            rgb[1] as f64 / U8_SCALE,
            rgb[2] as f64 / U8_SCALE,
        )
    }

    /// Build from 16-bit channels, as stored by LAS point formats
    pub fn from_u16(rgb: [u16; 3]) -> Self {
        Self::new(
            rgb[0] as f64 / U16_SCALE,
            rgb[1] as f64 / U16_SCALE,
            rgb[2] as f64 / U16_SCALE,
        )
    }

    pub fn to_u8(self) -> [u8; 3] {
        self.channels().map(|c| quantize(c, U8_SCALE) as u8)
    }

    /// Full-range 16-bit channels (1.0 maps to 65535)
    pub fn to_u16(self) -> [u16; 3] {
        self.channels().map(|c| quantize(c, U16_SCALE) as u16)
    }

    pub fn channels(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_channels(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

fn quantize(channel: f64, scale: f64) -> f64 {
    if channel.is_nan() {
        return 0.0;
    }
    (channel.clamp(0.0, 1.0) * scale).round()
}
