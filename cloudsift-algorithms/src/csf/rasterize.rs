//! Terrain floor under every cloth particle

use super::cloth::GridLayout;
use cloudsift_core::Point3d;
use std::collections::VecDeque;

/// Inverted floor elevation for every particle of `layout`
///
/// Each point is assigned to its nearest particle, which keeps the highest
/// inverted elevation (the lowest real one) of its points. Particles with no
/// points take the value of the nearest filled particle along their row or
/// column, and anything still empty after that inherits from its closest
/// filled neighbor by breadth-first search. Only a grid without points at all
/// keeps `f64::NEG_INFINITY` everywhere.
pub(crate) fn rasterize(layout: &GridLayout, points: &[Point3d]) -> Vec<f64> {
    let mut floors = vec![f64::NEG_INFINITY; layout.len()];
    for p in points {
        let (row, col) = layout.nearest_cell(p.x, p.y);
        let slot = &mut floors[layout.index(row, col)];
        *slot = slot.max(-p.z);
    }
    let floors = fill_by_scanline(layout, &floors);
    fill_by_neighbors(layout, floors)
}

fn fill_by_scanline(layout: &GridLayout, known: &[f64]) -> Vec<f64> {
    let mut nearest: Vec<Option<(usize, f64)>> = vec![None; known.len()];
    let (rows, cols) = (layout.rows(), layout.cols());

    for row in 0..rows {
        scan((0..cols).map(|col| layout.index(row, col)), known, &mut nearest);
        scan((0..cols).rev().map(|col| layout.index(row, col)), known, &mut nearest);
    }
    for col in 0..cols {
        scan((0..rows).map(|row| layout.index(row, col)), known, &mut nearest);
        scan((0..rows).rev().map(|row| layout.index(row, col)), known, &mut nearest);
    }

    known
        .iter()
        .zip(nearest)
        .map(|(&value, found)| match found {
            Some((_, fill)) if !value.is_finite() => fill,
            _ => value,
        })
        .collect()
}

/// Walk one grid line, offering every empty cell the last filled value seen
fn scan(line: impl Iterator<Item = usize>, known: &[f64], nearest: &mut [Option<(usize, f64)>]) {
    let mut last: Option<(usize, f64)> = None;
    for (position, index) in line.enumerate() {
        let value = known[index];
        if value.is_finite() {
            last = Some((position, value));
            continue;
        }
        if let Some((at, fill)) = last {
            let distance = position - at;
            if nearest[index].map_or(true, |(best, _)| distance < best) {
                nearest[index] = Some((distance, fill));
            }
        }
    }
}

fn fill_by_neighbors(layout: &GridLayout, mut floors: Vec<f64>) -> Vec<f64> {
    let mut queue: VecDeque<usize> = (0..floors.len()).filter(|&i| floors[i].is_finite()).collect();
    while let Some(index) = queue.pop_front() {
        let value = floors[index];
        for neighbor in layout.neighbors4(index) {
            if !floors[neighbor].is_finite() {
                floors[neighbor] = value;
                queue.push_back(neighbor);
            }
        }
    }
    floors
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsift_core::Aabb;

    fn layout_for(points: &[Point3d], resolution: f64) -> GridLayout {
        GridLayout::covering(&Aabb::from_points(points).unwrap(), resolution).unwrap()
    }

    #[test]
    fn test_keeps_lowest_point_per_cell() {
        let points = vec![
            Point3d::new(0.0, 0.0, 3.0),
            Point3d::new(0.1, 0.0, 1.0),
            Point3d::new(0.0, 0.1, 8.0),
        ];
        let layout = layout_for(&points, 1.0);
        let floors = rasterize(&layout, &points);
        assert_eq!(floors[layout.index(2, 2)], -1.0);
    }

    #[test]
    fn test_every_cell_is_filled() {
        let points = vec![Point3d::new(0.0, 0.0, 2.0), Point3d::new(6.0, 4.0, 5.0)];
        let layout = layout_for(&points, 1.0);
        let floors = rasterize(&layout, &points);
        assert!(floors.iter().all(|f| f.is_finite()));
        // same row as the first point, closer to it than to anything else
        assert_eq!(floors[layout.index(2, 0)], -2.0);
        assert_eq!(floors[layout.index(6, 10)], -5.0);
    }

    #[test]
    fn test_scanline_prefers_closest_filled_cell() {
        let points = vec![Point3d::new(0.0, 0.0, 1.0), Point3d::new(5.0, 0.0, 2.0)];
        let layout = layout_for(&points, 1.0);
        let floors = rasterize(&layout, &points);
        // columns 2 and 7 hold points; column 3 is one cell from column 2
        assert_eq!(floors[layout.index(2, 3)], -1.0);
        assert_eq!(floors[layout.index(2, 6)], -2.0);
    }

    #[test]
    fn test_no_points_leaves_grid_empty() {
        let layout = layout_for(&[Point3d::origin()], 1.0);
        let floors = rasterize(&layout, &[]);
        assert!(floors.iter().all(|f| *f == f64::NEG_INFINITY));
    }
}
