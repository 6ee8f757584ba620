// Editable, uncompressed point storage used for structural edits

use ultraviolet::Vec2;

use super::compressed::CompressedArray;
use super::PointArray;
use crate::error::{PointArrayError, Result};

/// Growable buffer of raw interleaved `x, y` coordinates.
///
/// Always exclusively owned: compressed arrays hand out a fresh one for
/// every edit, so nothing here needs to care about sharing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicArray {
    coords: Vec<f32>,
}

impl DynamicArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(points: usize) -> Self {
        Self {
            coords: Vec::with_capacity(points * 2),
        }
    }

    pub fn from_coords(coords: Vec<f32>) -> Result<Self> {
        if coords.len() % 2 != 0 {
            return Err(PointArrayError::InvalidArgument(format!(
                "{} ordinates do not form whole points",
                coords.len()
            )));
        }
        Ok(Self { coords })
    }

    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Self {
        let points = points.into_iter();
        let mut array = Self::with_capacity(points.size_hint().0);
        for p in points {
            array.push(p);
        }
        array
    }

    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    pub fn count(&self) -> usize {
        self.coords.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn push(&mut self, point: Vec2) {
        self.coords.push(point.x);
        self.coords.push(point.y);
    }

    /// Splice the interleaved `coords` in before point `index`. With
    /// `reverse` the inserted points go in last-to-first; x and y stay
    /// paired.
    pub fn insert(&mut self, index: usize, coords: &[f32], reverse: bool) -> Result<()> {
        if coords.len() % 2 != 0 {
            return Err(PointArrayError::InvalidArgument(format!(
                "{} ordinates do not form whole points",
                coords.len()
            )));
        }
        let count = self.count();
        if index > count {
            return Err(PointArrayError::out_of_range(index, count));
        }
        let at = index * 2;
        if reverse {
            let reversed: Vec<f32> = coords.chunks_exact(2).rev().flatten().copied().collect();
            self.coords.splice(at..at, reversed);
        } else {
            self.coords.splice(at..at, coords.iter().copied());
        }
        Ok(())
    }

    /// Reverse point order in place.
    pub fn reverse(&mut self) {
        let n = self.count();
        for i in 0..n / 2 {
            let j = n - 1 - i;
            self.coords.swap(2 * i, 2 * j);
            self.coords.swap(2 * i + 1, 2 * j + 1);
        }
    }

    /// Freeze the array. With `compress` the points are re-encoded; an empty
    /// array has nothing to encode and stays raw.
    pub fn get_final(mut self, compress: bool) -> Result<PointArray> {
        if compress && !self.coords.is_empty() {
            return Ok(PointArray::Compressed(CompressedArray::from_coords(&self.coords)?));
        }
        self.coords.shrink_to_fit();
        Ok(PointArray::Editable(self))
    }
}
