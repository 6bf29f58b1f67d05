//! Point cloud data structures and functionality

use crate::bounds::Aabb;
use crate::error::{Error, Result};
use crate::point::{Point3d, Rgb, Vector3d};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// One point together with whatever attributes its cloud carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    pub position: Point3d,
    pub color: Option<Rgb>,
    pub normal: Option<Vector3d>,
}

impl PointRecord {
    pub fn new(position: Point3d) -> Self {
        Self {
            position,
            color: None,
            normal: None,
        }
    }
}

/// A point cloud with optional per-point colors and normals
///
/// Attribute arrays, when present, always have one entry per point and index
/// `i` refers to the same point in every array. The constructors reject
/// arrays of the wrong length, and so does deserialization, so the invariant
/// holds for any value of this type. No spatial ordering is implied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPointCloud")]
pub struct PointCloud {
    points: Vec<Point3d>,
    colors: Option<Vec<Rgb>>,
    normals: Option<Vec<Vector3d>>,
}

/// Serialized form of [`PointCloud`] before the attribute lengths are checked
#[derive(Deserialize)]
struct RawPointCloud {
    points: Vec<Point3d>,
    colors: Option<Vec<Rgb>>,
    normals: Option<Vec<Vector3d>>,
}

impl TryFrom<RawPointCloud> for PointCloud {
    type Error = Error;

    fn try_from(raw: RawPointCloud) -> Result<Self> {
        let mut cloud = Self::from_points(raw.points);
        if let Some(colors) = raw.colors {
            cloud = cloud.with_colors(colors)?;
        }
        if let Some(normals) = raw.normals {
            cloud = cloud.with_normals(normals)?;
        }
        Ok(cloud)
    }
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            colors: None,
            normals: None,
        }
    }

    /// Create a point cloud from positions only
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    /// Build from three parallel coordinate arrays
    pub fn from_xyz(xs: &[f64], ys: &[f64], zs: &[f64]) -> Result<Self> {
        check_len("y", xs.len(), ys.len())?;
        check_len("z", xs.len(), zs.len())?;
        let points = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| Point3d::new(x, y, z))
            .collect();
        Ok(Self::from_points(points))
    }

    /// Split positions into three parallel coordinate arrays
    pub fn to_xyz(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut xs = Vec::with_capacity(self.len());
        let mut ys = Vec::with_capacity(self.len());
        let mut zs = Vec::with_capacity(self.len());
        for p in &self.points {
            xs.push(p.x);
            ys.push(p.y);
            zs.push(p.z);
        }
        (xs, ys, zs)
    }

    /// Attach per-point colors
    pub fn with_colors(mut self, colors: Vec<Rgb>) -> Result<Self> {
        check_len("colors", self.points.len(), colors.len())?;
        self.colors = Some(colors);
        Ok(self)
    }

    /// Attach per-point normals
    pub fn with_normals(mut self, normals: Vec<Vector3d>) -> Result<Self> {
        check_len("normals", self.points.len(), normals.len())?;
        self.normals = Some(normals);
        Ok(self)
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    /// Mutable access to positions; the point count cannot change through it
    pub fn points_mut(&mut self) -> &mut [Point3d] {
        &mut self.points
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        self.colors.as_deref()
    }

    pub fn normals(&self) -> Option<&[Vector3d]> {
        self.normals.as_deref()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Get one point with its attributes
    pub fn get(&self, index: usize) -> Option<PointRecord> {
        let position = *self.points.get(index)?;
        Some(PointRecord {
            position,
            color: self.colors.as_ref().map(|c| c[index]),
            normal: self.normals.as_ref().map(|n| n[index]),
        })
    }

    /// Add a point to the cloud
    ///
    /// The record must carry exactly the attributes the cloud carries. The
    /// first point pushed into an empty cloud decides which attributes exist.
    pub fn push(&mut self, record: PointRecord) -> Result<()> {
        if self.points.is_empty() {
            self.colors = record.color.map(|_| Vec::new());
            self.normals = record.normal.map(|_| Vec::new());
        }
        match (&mut self.colors, record.color) {
            (Some(colors), Some(color)) => colors.push(color),
            (None, None) => {}
            _ => return Err(Error::invalid("color", "attribute presence differs from the cloud")),
        }
        match (&mut self.normals, record.normal) {
            (Some(normals), Some(normal)) => normals.push(normal),
            (None, None) => {}
            _ => {
                if let (Some(colors), Some(_)) = (&mut self.colors, record.color) {
                    colors.pop();
                }
                return Err(Error::invalid("normal", "attribute presence differs from the cloud"));
            }
        }
        self.points.push(record.position);
        Ok(())
    }

    /// Get an iterator over the positions
    pub fn iter(&self) -> std::slice::Iter<'_, Point3d> {
        self.points.iter()
    }

    /// Iterate points together with their attributes
    pub fn records(&self) -> impl Iterator<Item = PointRecord> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Clear all points from the cloud, keeping which attributes it carries
    pub fn clear(&mut self) {
        self.points.clear();
        if let Some(colors) = &mut self.colors {
            colors.clear();
        }
        if let Some(normals) = &mut self.normals {
            normals.clear();
        }
    }

    /// Bounding box of all positions, `None` for an empty cloud
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }

    /// Rescale every normal to unit length; zero normals stay zero
    pub fn normalize_normals(&mut self) {
        if let Some(normals) = &mut self.normals {
            for n in normals.iter_mut() {
                if let Some(unit) = n.try_normalize(f64::EPSILON) {
                    *n = unit;
                }
            }
        }
    }

    /// New cloud holding the points at `indices`, in the given order
    pub fn select_by_index(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(Self {
            points: indices.iter().map(|&i| self.points[i]).collect(),
            colors: self
                .colors
                .as_ref()
                .map(|c| indices.iter().map(|&i| c[i]).collect()),
            normals: self
                .normals
                .as_ref()
                .map(|n| indices.iter().map(|&i| n[i]).collect()),
        })
    }

    /// New cloud holding every point not listed in `indices`, in cloud order
    pub fn select_by_index_inverted(&self, indices: &[usize]) -> Result<Self> {
        let mut keep = vec![true; self.len()];
        for &i in indices {
            match keep.get_mut(i) {
                Some(slot) => *slot = false,
                None => {
                    return Err(Error::IndexOutOfBounds {
                        index: i,
                        len: self.len(),
                    })
                }
            }
        }
        self.select_by_mask(&keep)
    }

    /// New cloud holding the points whose mask entry is `true`
    pub fn select_by_mask(&self, mask: &[bool]) -> Result<Self> {
        check_len("mask", self.len(), mask.len())?;
        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.select_by_index(&kept)
    }
}

fn check_len(attribute: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::invalid(
            attribute,
            format!("length {actual} does not match point count {expected}"),
        ))
    }
}

impl Index<usize> for PointCloud {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<Point3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self::from_points(Vec::from_iter(iter))
    }
}
