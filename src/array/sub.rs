// Zero-copy windows over compressed point storage

use std::sync::Arc;
use ultraviolet::Vec2;

use super::compressed::CompressedArray;
use super::iter::PackedRange;

/// Contiguous window `[lower, upper)` of a compressed delta buffer.
///
/// Bounds are raw delta indices into the shared buffer, never re-based to
/// zero: point `i` of the window lives at delta index `lower + 2 * i`.
/// Creating a window copies nothing but the bounds and the integer prefix
/// sum of the deltas in front of it.
#[derive(Clone, Debug, PartialEq)]
pub struct SubArray {
    data: Arc<[i8]>,
    base: Vec2,
    scale: Vec2,
    offset: (i32, i32),
    lower: usize,
    upper: usize,
}

impl SubArray {
    /// Narrow a parent window (`parent_lower`, `parent_offset`) to
    /// `[lower, upper)`, summing the skipped deltas into the new offset.
    pub(crate) fn narrow(
        data: Arc<[i8]>,
        base: Vec2,
        scale: Vec2,
        parent_offset: (i32, i32),
        parent_lower: usize,
        lower: usize,
        upper: usize,
    ) -> Self {
        debug_assert!(parent_lower <= lower && lower <= upper && upper <= data.len());
        debug_assert!(lower % 2 == 0 && upper % 2 == 0);
        let offset = data[parent_lower..lower]
            .chunks_exact(2)
            .fold(parent_offset, |(sx, sy), d| (sx + d[0] as i32, sy + d[1] as i32));
        Self {
            data,
            base,
            scale,
            offset,
            lower,
            upper,
        }
    }

    #[inline]
    pub fn lower(&self) -> usize {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> usize {
        self.upper
    }

    pub fn count(&self) -> usize {
        (self.upper - self.lower) / 2
    }

    /// Parent origin advanced by every delta in front of this window.
    pub fn origin(&self) -> Vec2 {
        Vec2::new(
            self.base.x + self.scale.x * self.offset.0 as f32,
            self.base.y + self.scale.y * self.offset.1 as f32,
        )
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn first_point(&self) -> Vec2 {
        self.packed().first_point()
    }

    pub fn last_point(&self) -> Vec2 {
        self.packed().last_point()
    }

    /// Length of the whole shared buffer this window keeps alive.
    pub fn buffer_len(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    pub(crate) fn buffer(&self) -> &Arc<[i8]> {
        &self.data
    }

    pub(crate) fn packed(&self) -> PackedRange<'_> {
        PackedRange {
            deltas: &self.data[self.lower..self.upper],
            base: self.base,
            scale: self.scale,
            offset: self.offset,
        }
    }

    /// Sub-window; bounds are absolute delta indices already validated
    /// against this window's own extent.
    pub(crate) fn window(&self, lower: usize, upper: usize) -> SubArray {
        SubArray::narrow(Arc::clone(&self.data), self.base, self.scale, self.offset, self.lower, lower, upper)
    }

    /// Copy the window into a standalone array that no longer pins the
    /// parent buffer.
    pub fn compact(&self) -> CompressedArray {
        let mut deltas = self.data[self.lower..self.upper].to_vec();
        let origin = self.first_point();
        deltas[0] = 0;
        deltas[1] = 0;
        CompressedArray::from_raw_parts(deltas.into(), origin, self.scale)
    }
}
