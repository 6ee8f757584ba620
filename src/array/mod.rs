// Point arrays for map layers: compressed storage, windows and the editable fallback

pub mod compressed;
pub mod dynamic;
pub mod iter;
pub mod scale;
pub mod sub;

#[cfg(test)]
mod tests;

use std::fmt;
use ultraviolet::Vec2;

pub use compressed::CompressedArray;
pub use dynamic::DynamicArray;
pub use iter::{PackedPoints, Points};
pub use scale::{CompressionAttempt, ScaleSearch};
pub use sub::SubArray;

use crate::error::{PointArrayError, Result};
use iter::PackedRange;

/// A point is a pair of `f32`: longitude/latitude or projected x/y.
pub type Coordinate = Vec2;

/// Axis-aligned bounding box of decoded points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn from_point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn include(&mut self, p: Vec2) {
        self.min = self.min.min_by_component(p);
        self.max = self.max.max_by_component(p);
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: self.min.min_by_component(other.min),
            max: self.max.max_by_component(other.max),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Ordered, indexable sequence of points in one of three representations.
///
/// `Compressed` and `Window` are immutable and cheap to share. Structural
/// edits always go through [`PointArray::to_editable`] and come back as
/// `Editable`; nothing is ever mutated in place.
#[derive(Clone, Debug, PartialEq)]
pub enum PointArray {
    Compressed(CompressedArray),
    Window(SubArray),
    Editable(DynamicArray),
}

enum View<'a> {
    Packed(PackedRange<'a>),
    Raw(&'a [f32]),
}

impl From<CompressedArray> for PointArray {
    fn from(array: CompressedArray) -> Self {
        PointArray::Compressed(array)
    }
}

impl From<SubArray> for PointArray {
    fn from(array: SubArray) -> Self {
        PointArray::Window(array)
    }
}

impl From<DynamicArray> for PointArray {
    fn from(array: DynamicArray) -> Self {
        PointArray::Editable(array)
    }
}

impl PointArray {
    fn view(&self) -> View<'_> {
        match self {
            PointArray::Compressed(c) => View::Packed(c.packed()),
            PointArray::Window(w) => View::Packed(w.packed()),
            PointArray::Editable(d) => View::Raw(d.coords()),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            PointArray::Compressed(c) => c.count(),
            PointArray::Window(w) => w.count(),
            PointArray::Editable(d) => d.count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// First raw index of this array in its backing buffer.
    pub fn lower(&self) -> usize {
        match self {
            PointArray::Compressed(c) => c.lower(),
            PointArray::Window(w) => w.lower(),
            PointArray::Editable(_) => 0,
        }
    }

    /// One past the last raw index of this array in its backing buffer.
    pub fn upper(&self) -> usize {
        match self {
            PointArray::Compressed(c) => c.upper(),
            PointArray::Window(w) => w.upper(),
            PointArray::Editable(d) => d.coords().len(),
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, PointArray::Editable(_))
    }

    pub fn first_point(&self) -> Option<Vec2> {
        match self.view() {
            View::Packed(p) => Some(p.first_point()),
            View::Raw(c) => c.get(0..2).map(|c| Vec2::new(c[0], c[1])),
        }
    }

    /// Compressed variants decode the whole range to get here.
    pub fn last_point(&self) -> Option<Vec2> {
        match self.view() {
            View::Packed(p) => Some(p.last_point()),
            View::Raw(c) if c.len() >= 2 => Some(Vec2::new(c[c.len() - 2], c[c.len() - 1])),
            View::Raw(_) => None,
        }
    }

    pub fn point_at(&self, index: usize) -> Result<Vec2> {
        let count = self.count();
        if index >= count {
            return Err(PointArrayError::out_of_range(index, count));
        }
        Ok(match self.view() {
            View::Packed(p) => p.point_at(index),
            View::Raw(c) => Vec2::new(c[index * 2], c[index * 2 + 1]),
        })
    }

    /// Forward iterator starting at point `start`; `start == count()` yields
    /// nothing.
    pub fn points(&self, start: usize) -> Result<Points<'_>> {
        let count = self.count();
        if start > count {
            return Err(PointArrayError::out_of_range(start, count));
        }
        Ok(match self.view() {
            View::Packed(p) => Points::Packed(p.points(start)),
            View::Raw(c) => Points::Raw(c[start * 2..].chunks_exact(2)),
        })
    }

    /// Points `[lower, upper)` of this array.
    ///
    /// Returns `None` for an empty range and a clone of `self` for the full
    /// range. Compressed arrays and windows answer with a window sharing the
    /// same delta buffer; editable arrays copy the range.
    pub fn subarray(&self, lower: usize, upper: usize) -> Result<Option<PointArray>> {
        let count = self.count();
        if upper > count {
            return Err(PointArrayError::out_of_range(upper, count));
        }
        if lower > upper {
            return Err(PointArrayError::out_of_range(lower, upper));
        }
        if lower == upper {
            return Ok(None);
        }
        if lower == 0 && upper == count {
            return Ok(Some(self.clone()));
        }
        let (from, to) = (self.lower() + lower * 2, self.lower() + upper * 2);
        Ok(Some(match self {
            PointArray::Compressed(c) => PointArray::Window(c.window(from, to)),
            PointArray::Window(w) => PointArray::Window(w.window(from, to)),
            PointArray::Editable(d) => {
                PointArray::Editable(DynamicArray::from_coords(d.coords()[from..to].to_vec())?)
            }
        }))
    }

    /// Copy decoded coordinates into `dest` from `offset` on, keeping one
    /// point out of every `decimation`.
    ///
    /// The kept point is the last of each group, plus the final point when
    /// the last group is short. Returns the index one past the last written
    /// value, `offset + 2 * ceil(count / decimation)`. With `dest == None`
    /// nothing is written and only that size is returned.
    pub fn to_float_array(&self, dest: Option<&mut [f32]>, offset: usize, decimation: usize) -> Result<usize> {
        if decimation < 1 {
            return Err(PointArrayError::InvalidArgument(format!(
                "decimation must be at least 1, got {}",
                decimation
            )));
        }
        let count = self.count();
        let end = offset + 2 * count.div_ceil(decimation);
        let Some(dest) = dest else {
            return Ok(end);
        };
        if dest.len() < end {
            return Err(PointArrayError::InvalidArgument(format!(
                "destination holds {} values, {} required",
                dest.len(),
                end
            )));
        }
        let mut cursor = offset;
        for (i, p) in self.points(0)?.enumerate() {
            if (i + 1) % decimation == 0 || i + 1 == count {
                dest[cursor] = p.x;
                dest[cursor + 1] = p.y;
                cursor += 2;
            }
        }
        debug_assert_eq!(cursor, end);
        Ok(end)
    }

    /// All decoded coordinates, interleaved.
    pub fn to_vec(&self) -> Vec<f32> {
        match self.view() {
            View::Raw(c) => c.to_vec(),
            View::Packed(p) => p.points(0).flat_map(|v| [v.x, v.y]).collect(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.points(0).ok()?;
        let mut bounds = Bounds::from_point(points.next()?);
        for p in points {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Approximate bytes of point data this array keeps alive. A window is
    /// charged for the whole parent buffer it pins, so layers holding both a
    /// parent and its windows count the shared buffer more than once.
    pub fn memory_usage(&self) -> usize {
        let data = match self {
            PointArray::Compressed(c) => c.deltas().len(),
            PointArray::Window(w) => w.buffer_len(),
            PointArray::Editable(d) => std::mem::size_of_val(d.coords()),
        };
        std::mem::size_of::<Self>() + data
    }

    /// Decode into a private editable copy.
    pub fn to_editable(&self) -> DynamicArray {
        match self {
            PointArray::Editable(d) => d.clone(),
            _ => DynamicArray::from_points(self.view_points()),
        }
    }

    /// Like [`to_editable`](Self::to_editable) but reuses an editable
    /// array's buffer.
    pub fn into_editable(self) -> DynamicArray {
        match self {
            PointArray::Editable(d) => d,
            other => other.to_editable(),
        }
    }

    fn view_points(&self) -> Points<'_> {
        match self.view() {
            View::Packed(p) => Points::Packed(p.points(0)),
            View::Raw(c) => Points::Raw(c.chunks_exact(2)),
        }
    }

    /// Insert interleaved `coords` before point `index`. An empty range
    /// leaves the array untouched, compressed or not.
    pub fn insert_at(self, index: usize, coords: &[f32], reverse: bool) -> Result<PointArray> {
        if coords.len() % 2 != 0 {
            return Err(PointArrayError::InvalidArgument(format!(
                "{} ordinates do not form whole points",
                coords.len()
            )));
        }
        if coords.is_empty() {
            return Ok(self);
        }
        let count = self.count();
        if index > count {
            return Err(PointArrayError::out_of_range(index, count));
        }
        let mut editable = self.into_editable();
        editable.insert(index, coords, reverse)?;
        Ok(PointArray::Editable(editable))
    }

    /// Insert every point of `other` before point `index`.
    pub fn insert_points(self, index: usize, other: &PointArray, reverse: bool) -> Result<PointArray> {
        if other.is_empty() {
            return Ok(self);
        }
        let coords = other.to_vec();
        self.insert_at(index, &coords, reverse)
    }

    /// Same points in the opposite order, always as an editable array.
    pub fn reverse(self) -> PointArray {
        let mut editable = self.into_editable();
        editable.reverse();
        PointArray::Editable(editable)
    }

    /// Freeze after editing. Compressed arrays and windows are already
    /// final and come back unchanged whatever `compress` says.
    pub fn get_final(self, compress: bool) -> Result<PointArray> {
        match self {
            PointArray::Editable(d) => d.get_final(compress),
            other => Ok(other),
        }
    }
}

impl fmt::Display for PointArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            PointArray::Compressed(_) => "compressed",
            PointArray::Window(_) => "window",
            PointArray::Editable(_) => "editable",
        };
        write!(f, "{} array, {} points", kind, self.count())?;
        if let (Some(first), Some(last)) = (self.first_point(), self.last_point()) {
            write!(f, " from ({}, {}) to ({}, {})", first.x, first.y, last.x, last.y)?;
        }
        Ok(())
    }
}
