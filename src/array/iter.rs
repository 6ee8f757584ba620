// Read-only views and forward iterators over point storage

use std::iter::FusedIterator;
use std::slice::ChunksExact;
use ultraviolet::Vec2;

/// Borrowed view of packed deltas restricted to one window.
///
/// Point `i` decodes to `base + scale * (offset + sum(deltas[0..=i]))`. The
/// offset is the integer prefix sum of every delta the window skipped, so a
/// window decodes to exactly the same floats as its parent.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PackedRange<'a> {
    pub deltas: &'a [i8],
    pub base: Vec2,
    pub scale: Vec2,
    pub offset: (i32, i32),
}

impl<'a> PackedRange<'a> {
    #[inline]
    pub fn count(&self) -> usize {
        self.deltas.len() / 2
    }

    #[inline]
    pub fn decode(&self, sum: (i32, i32)) -> Vec2 {
        Vec2::new(
            self.base.x + self.scale.x * sum.0 as f32,
            self.base.y + self.scale.y * sum.1 as f32,
        )
    }

    /// Integer sum of the delta pairs in `[0, points)`, on top of the window offset.
    pub fn prefix_sum(&self, points: usize) -> (i32, i32) {
        self.deltas[..points * 2]
            .chunks_exact(2)
            .fold(self.offset, |(sx, sy), d| (sx + d[0] as i32, sy + d[1] as i32))
    }

    pub fn first_point(&self) -> Vec2 {
        self.decode(self.prefix_sum(1))
    }

    /// Full linear scan; nothing is cached.
    pub fn last_point(&self) -> Vec2 {
        self.decode(self.prefix_sum(self.count()))
    }

    pub fn point_at(&self, index: usize) -> Vec2 {
        self.decode(self.prefix_sum(index + 1))
    }

    pub fn points(&self, start: usize) -> PackedPoints<'a> {
        PackedPoints {
            deltas: self.deltas[start * 2..].chunks_exact(2),
            base: self.base,
            scale: self.scale,
            sum: self.prefix_sum(start),
        }
    }
}

/// Lazy decoder over packed deltas. Restarting means building a new one.
#[derive(Clone, Debug)]
pub struct PackedPoints<'a> {
    deltas: ChunksExact<'a, i8>,
    base: Vec2,
    scale: Vec2,
    sum: (i32, i32),
}

impl Iterator for PackedPoints<'_> {
    type Item = Vec2;

    #[inline]
    fn next(&mut self) -> Option<Vec2> {
        let d = self.deltas.next()?;
        self.sum.0 += d[0] as i32;
        self.sum.1 += d[1] as i32;
        Some(Vec2::new(
            self.base.x + self.scale.x * self.sum.0 as f32,
            self.base.y + self.scale.y * self.sum.1 as f32,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.deltas.size_hint()
    }
}

impl ExactSizeIterator for PackedPoints<'_> {}
impl FusedIterator for PackedPoints<'_> {}

/// Forward iterator over the points of any [`PointArray`](super::PointArray).
#[derive(Clone, Debug)]
pub enum Points<'a> {
    Packed(PackedPoints<'a>),
    Raw(ChunksExact<'a, f32>),
}

impl Iterator for Points<'_> {
    type Item = Vec2;

    #[inline]
    fn next(&mut self) -> Option<Vec2> {
        match self {
            Points::Packed(it) => it.next(),
            Points::Raw(it) => it.next().map(|c| Vec2::new(c[0], c[1])),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Points::Packed(it) => it.size_hint(),
            Points::Raw(it) => it.size_hint(),
        }
    }
}

impl ExactSizeIterator for Points<'_> {}
impl FusedIterator for Points<'_> {}
