//! Post-processing for cloth left hanging over slopes
//!
//! On slopes the stiff cloth tends to bridge from one landed cell to the
//! next, leaving stretches of particles that never touch the terrain. Those
//! stretches are pulled onto the terrain where the terrain is close to both
//! the hanging particle and an already landed neighbour.

use super::cloth::Cloth;
use std::collections::VecDeque;

/// Hanging regions at or below this many particles are left alone
const MIN_REGION_PARTICLES: usize = 50;
/// Largest floor step between neighbours, and largest gap between a hanging
/// particle and its floor, that still lets the particle snap down
const SNAP_THRESHOLD: f64 = 0.3;

/// Snap hanging particles onto their floors; returns how many were snapped
pub(crate) fn smooth_slopes(cloth: &mut Cloth) -> usize {
    let mut visited = vec![false; cloth.particles.len()];
    let mut snapped = 0;

    for start in 0..cloth.particles.len() {
        if visited[start] || !cloth.particles[start].movable {
            continue;
        }
        let region = hanging_region(cloth, start, &mut visited);
        if region.len() > MIN_REGION_PARTICLES {
            snapped += snap_region(cloth, &region);
        }
    }
    snapped
}

/// Connected set of movable particles around `start`
fn hanging_region(cloth: &Cloth, start: usize, visited: &mut [bool]) -> Vec<usize> {
    let mut region = vec![start];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;
    while let Some(index) = queue.pop_front() {
        for neighbor in cloth.layout.neighbors4(index) {
            if !visited[neighbor] && cloth.particles[neighbor].movable {
                visited[neighbor] = true;
                region.push(neighbor);
                queue.push_back(neighbor);
            }
        }
    }
    region
}

fn snap_region(cloth: &mut Cloth, region: &[usize]) -> usize {
    // Seeds are judged against the landed state before any snapping
    let seeds: Vec<usize> = region
        .iter()
        .copied()
        .filter(|&index| {
            cloth
                .layout
                .neighbors4(index)
                .any(|neighbor| {
                    !cloth.particles[neighbor].movable && can_snap(cloth, neighbor, index)
                })
        })
        .collect();

    let mut queue = VecDeque::with_capacity(seeds.len());
    for index in seeds {
        cloth.particles[index].land();
        queue.push_back(index);
    }

    let mut snapped = queue.len();
    while let Some(index) = queue.pop_front() {
        let neighbors: Vec<usize> = cloth.layout.neighbors4(index).collect();
        for neighbor in neighbors {
            if cloth.particles[neighbor].movable && can_snap(cloth, index, neighbor) {
                cloth.particles[neighbor].land();
                queue.push_back(neighbor);
                snapped += 1;
            }
        }
    }
    snapped
}

/// Whether `candidate` may land next to the landed particle `anchor`
fn can_snap(cloth: &Cloth, anchor: usize, candidate: usize) -> bool {
    let a = &cloth.particles[anchor];
    let c = &cloth.particles[candidate];
    c.is_constrained()
        && (a.floor - c.floor).abs() < SNAP_THRESHOLD
        && (c.height - c.floor).abs() < SNAP_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csf::cloth::GridLayout;
    use crate::csf::params::Rigidness;
    use cloudsift_core::{Aabb, Point3d};

    fn cloth_with(heights: impl Fn(usize, usize) -> (f64, f64, bool)) -> Cloth {
        let bounds = Aabb::new(Point3d::origin(), Point3d::new(15.0, 15.0, 0.0));
        let layout = GridLayout::covering(&bounds, 1.0).unwrap(); // 20 x 20
        let mut cloth = Cloth::new(layout, 0.0, vec![0.0; layout.len()], Rigidness::Relief, 0.65);
        for row in 0..layout.rows() {
            for col in 0..layout.cols() {
                let (height, floor, movable) = heights(row, col);
                let p = &mut cloth.particles[layout.index(row, col)];
                p.height = height;
                p.previous = height;
                p.floor = floor;
                p.movable = movable;
            }
        }
        cloth
    }

    #[test]
    fn test_snaps_gentle_slope_next_to_landed_cloth() {
        // left half landed on flat ground, right half hanging 0.1 above a gentle ramp
        let mut cloth = cloth_with(|_, col| {
            if col < 10 {
                (0.0, 0.0, false)
            } else {
                let floor = -0.05 * (col - 9) as f64;
                (floor + 0.1, floor, true)
            }
        });
        let snapped = smooth_slopes(&mut cloth);
        assert_eq!(snapped, 200);
        assert_eq!(cloth.movable_count(), 0);
        assert!(cloth.particles.iter().all(|p| p.height == p.floor));
    }

    #[test]
    fn test_leaves_steps_and_small_regions() {
        // hanging region far above its floor is not snapped
        let mut cloth = cloth_with(|_, col| {
            if col < 10 {
                (0.0, 0.0, false)
            } else {
                (0.0, -2.0, true)
            }
        });
        assert_eq!(smooth_slopes(&mut cloth), 0);

        // a 3 x 3 hanging patch is below the region size limit
        let mut cloth = cloth_with(|row, col| {
            let hanging = (5..8).contains(&row) && (5..8).contains(&col);
            (0.05, 0.0, hanging)
        });
        assert_eq!(smooth_slopes(&mut cloth), 0);
        assert_eq!(cloth.movable_count(), 9);
    }
}
