//! Cloth grid and mass-spring simulation
//!
//! Particles live in a flat arena addressed by `(row, col)`; springs are
//! index pairs generated from fixed neighbor-offset tables. Horizontal
//! particle positions are fixed by the grid, only the elevation moves. All
//! elevations here are in the inverted frame (`-z`), where the cloth falls
//! towards decreasing values and lands on the underside of the terrain.

use super::params::Rigidness;
use cloudsift_core::{Aabb, Error, Result};
use itertools::iproduct;
use log::trace;
use rayon::prelude::*;

/// Empty cells kept around the cloud on every side of the grid
pub(crate) const BUFFER_CELLS: usize = 2;
/// Height of the cloth above the highest inverted point at rest
pub(crate) const START_OFFSET: f64 = 0.05;
/// Fraction of velocity lost per time step
const DAMPING: f64 = 0.01;
/// Gravitational acceleration in cloud units per unit time squared
const GRAVITY: f64 = 0.2;
/// Largest per-step movement at which the cloth counts as settled
pub(crate) const CONVERGENCE_EPSILON: f64 = 0.005;
/// Time step at which spring corrections take their full strength
const REFERENCE_TIME_STEP: f64 = 0.65;
/// Refuse grids beyond this many particles rather than exhaust memory
const MAX_PARTICLES: usize = 1 << 28;

const STRUCTURAL_OFFSETS: [(isize, isize); 2] = [(0, 1), (1, 0)];
const SHEAR_OFFSETS: [(isize, isize); 2] = [(1, 1), (1, -1)];
const BENDING_OFFSETS: [(isize, isize); 4] = [(0, 2), (2, 0), (2, 2), (2, -2)];

/// Placement of the particle grid in the horizontal plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    origin_x: f64,
    origin_y: f64,
    resolution: f64,
    rows: usize,
    cols: usize,
}

impl GridLayout {
    /// Grid covering the horizontal extent of `bounds` plus a buffer ring
    ///
    /// A cloud collapsed to a line or a point still gets a grid of at least
    /// `(2 * BUFFER_CELLS + 1)` cells per side.
    pub(crate) fn covering(bounds: &Aabb, resolution: f64) -> Result<Self> {
        let extent = bounds.extent();
        if !(extent.x.is_finite()
            && extent.y.is_finite()
            && bounds.min.z.is_finite()
            && bounds.max.z.is_finite())
        {
            return Err(Error::invalid("points", "coordinates must be finite"));
        }

        let cells =
            |span: f64| ((span / resolution).floor() as usize).saturating_add(1 + 2 * BUFFER_CELLS);
        let cols = cells(extent.x);
        let rows = cells(extent.y);
        if rows.checked_mul(cols).map_or(true, |n| n > MAX_PARTICLES) {
            return Err(Error::invalid(
                "cloth_resolution",
                format!(
                    "{resolution} yields a {cols}x{rows} cloth, too large for the cloud extent"
                ),
            ));
        }

        let buffer = BUFFER_CELLS as f64 * resolution;
        Ok(Self {
            origin_x: bounds.min.x - buffer,
            origin_y: bounds.min.y - buffer,
            resolution,
            rows,
            cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// World coordinates of particle `(0, 0)`
    pub fn origin(&self) -> (f64, f64) {
        (self.origin_x, self.origin_y)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Fractional `(row, col)` of a horizontal position
    pub(crate) fn grid_coords(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (y - self.origin_y) / self.resolution,
            (x - self.origin_x) / self.resolution,
        )
    }

    /// Particle closest to a horizontal position, clamped to the grid
    pub(crate) fn nearest_cell(&self, x: f64, y: f64) -> (usize, usize) {
        let (row, col) = self.grid_coords(x, y);
        (
            (row.round().max(0.0) as usize).min(self.rows - 1),
            (col.round().max(0.0) as usize).min(self.cols - 1),
        )
    }

    /// Index of the particle at `(row + dr, col + dc)`, if inside the grid
    pub(crate) fn offset(&self, row: usize, col: usize, dr: isize, dc: isize) -> Option<usize> {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < self.rows && c < self.cols).then(|| self.index(r, c))
    }

    /// The up to four orthogonal neighbors of a particle
    pub(crate) fn neighbors4(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = (index / self.cols, index % self.cols);
        [(0, 1), (0, -1), (1, 0), (-1, 0)]
            .into_iter()
            .filter_map(move |(dr, dc)| self.offset(row, col, dr, dc))
    }
}

/// One cloth particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Particle {
    /// Current inverted elevation
    pub height: f64,
    /// Inverted elevation one time step ago, for Verlet integration
    pub previous: f64,
    /// Inverted elevation of the terrain under the particle
    pub floor: f64,
    /// False once the particle has touched its floor
    pub movable: bool,
}

impl Particle {
    fn new(height: f64, floor: f64) -> Self {
        Self {
            height,
            previous: height,
            floor,
            movable: true,
        }
    }

    /// Whether any terrain was found under this particle
    pub fn is_constrained(&self) -> bool {
        self.floor.is_finite()
    }

    /// Pin the particle onto its floor for the rest of the run
    pub fn land(&mut self) {
        self.height = self.floor;
        self.previous = self.floor;
        self.movable = false;
    }
}

/// Particle grid, spring network and integration state
pub(crate) struct Cloth {
    pub layout: GridLayout,
    pub particles: Vec<Particle>,
    springs: Vec<(usize, usize)>,
    /// Correction applied to each end of a spring whose ends both move
    shared_correction: f64,
    /// Correction applied to the free end of a spring anchored at the other
    anchored_correction: f64,
    gravity_step: f64,
}

impl Cloth {
    /// Flat cloth at `start_height` over per-particle `floors`
    pub fn new(
        layout: GridLayout,
        start_height: f64,
        floors: Vec<f64>,
        rigidness: Rigidness,
        time_step: f64,
    ) -> Self {
        debug_assert_eq!(floors.len(), layout.len());
        let particles = floors
            .into_iter()
            .map(|floor| Particle::new(start_height, floor))
            .collect();

        // Relaxing a spring n times in a row moves a free end by 1 - 0.7^n of
        // the gap and each of two free ends by (1 - 0.4^n) / 2. Gravity moves
        // a particle by g * dt^2 per step, so corrections shrink by the same
        // factor below the reference step and the settled shape does not
        // depend on the step size.
        let passes = rigidness.constraint_passes() as i32;
        let scale = (time_step / REFERENCE_TIME_STEP).powi(2).min(1.0);
        Self {
            layout,
            particles,
            springs: build_springs(&layout, rigidness),
            shared_correction: 0.5 * (1.0 - 0.4f64.powi(passes)) * scale,
            anchored_correction: (1.0 - 0.7f64.powi(passes)) * scale,
            gravity_step: -GRAVITY * time_step * time_step,
        }
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    pub fn movable_count(&self) -> usize {
        self.particles.iter().filter(|p| p.movable).count()
    }

    /// Advance one time step and return the largest vertical movement
    pub fn step(&mut self) -> f64 {
        self.integrate();
        self.satisfy_springs();
        let max_movement = self
            .particles
            .par_iter()
            .filter(|p| p.movable)
            .map(|p| (p.height - p.previous).abs())
            .reduce(|| 0.0, f64::max);
        self.collide();
        max_movement
    }

    /// Run until settled or `max_iterations` steps; returns steps taken
    ///
    /// The cloth only counts as settled once part of it rests on the
    /// terrain. Before that a small time step keeps the per-step movement
    /// tiny while the cloth is still in free fall.
    pub fn simulate(&mut self, max_iterations: usize) -> usize {
        for iteration in 0..max_iterations {
            let movement = self.step();
            let movable = self.movable_count();
            trace!(
                "cloth step {}: max movement {:.6}, {} movable",
                iteration,
                movement,
                movable
            );
            let touching = movable < self.particles.len();
            if movable == 0 || (touching && movement > 0.0 && movement < CONVERGENCE_EPSILON) {
                return iteration + 1;
            }
        }
        max_iterations
    }

    fn integrate(&mut self) {
        let gravity_step = self.gravity_step;
        self.particles.par_iter_mut().filter(|p| p.movable).for_each(|p| {
            let next = p.height + (p.height - p.previous) * (1.0 - DAMPING) + gravity_step;
            p.previous = p.height;
            p.height = next;
        });
    }

    fn satisfy_springs(&mut self) {
        for &(a, b) in &self.springs {
            let (pa, pb) = (self.particles[a], self.particles[b]);
            let gap = pb.height - pa.height;
            match (pa.movable, pb.movable) {
                (true, true) => {
                    self.particles[a].height += gap * self.shared_correction;
                    self.particles[b].height -= gap * self.shared_correction;
                }
                (true, false) => self.particles[a].height += gap * self.anchored_correction,
                (false, true) => self.particles[b].height -= gap * self.anchored_correction,
                (false, false) => {}
            }
        }
    }

    /// Freeze every particle that dropped below its floor
    fn collide(&mut self) {
        self.particles
            .par_iter_mut()
            .filter(|p| p.movable && p.height < p.floor)
            .for_each(Particle::land);
    }
}

fn build_springs(layout: &GridLayout, rigidness: Rigidness) -> Vec<(usize, usize)> {
    let mut offsets: Vec<(isize, isize)> = STRUCTURAL_OFFSETS.to_vec();
    if rigidness.has_shear_springs() {
        offsets.extend_from_slice(&SHEAR_OFFSETS);
    }
    if rigidness.has_bending_springs() {
        offsets.extend_from_slice(&BENDING_OFFSETS);
    }

    iproduct!(0..layout.rows, 0..layout.cols, offsets.iter())
        .filter_map(|(row, col, &(dr, dc))| {
            layout
                .offset(row, col, dr, dc)
                .map(|other| (layout.index(row, col), other))
        })
        .collect()
}
