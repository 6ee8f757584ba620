// Immutable delta-compressed point storage

use log::debug;
use std::sync::Arc;
use ultraviolet::Vec2;

use super::iter::{PackedPoints, PackedRange};
use super::scale::{trial_encode, DeltaExtents, ScaleSearch};
use super::sub::SubArray;
use crate::error::{PointArrayError, Result};
use crate::profile_scope;

/// Points stored as signed 8-bit delta pairs from an origin, one scale per axis.
///
/// The delta buffer sits behind an `Arc<[i8]>` and is never written after
/// construction, so windows share it freely across threads.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedArray {
    data: Arc<[i8]>,
    origin: Vec2,
    scale: Vec2,
}

impl CompressedArray {
    /// Compress the interleaved coordinates `coords[lower..upper]`.
    pub fn new(coords: &[f32], lower: usize, upper: usize) -> Result<Self> {
        profile_scope!("compress");
        if lower > upper || upper > coords.len() {
            return Err(PointArrayError::invalid_range(lower, upper, "outside coordinate buffer"));
        }
        let len = upper - lower;
        if len < 2 {
            return Err(PointArrayError::invalid_range(lower, upper, "fewer than one point"));
        }
        if len % 2 != 0 {
            return Err(PointArrayError::invalid_range(lower, upper, "odd number of ordinates"));
        }
        let coords = &coords[lower..upper];
        if let Some(bad) = coords.iter().position(|c| !c.is_finite()) {
            return Err(PointArrayError::InvalidArgument(format!(
                "non-finite ordinate at index {}",
                lower + bad
            )));
        }

        let anchor = Vec2::new(coords[0], coords[1]);
        let extents = DeltaExtents::of(coords);
        if !extents.is_finite() {
            debug!("step between consecutive points overflows f32: {:?}", extents);
            return Err(PointArrayError::ArithmeticOverflow { attempts: 0 });
        }
        let mut search = ScaleSearch::new(extents);
        while let Some(attempt) = search.next_attempt() {
            if !attempt.scale.x.is_finite() || !attempt.scale.y.is_finite() {
                return Err(PointArrayError::ArithmeticOverflow { attempts: search.attempts() });
            }
            match trial_encode(coords, anchor, attempt.scale) {
                Ok(deltas) => {
                    debug_assert!(deltas[0] == 0 && deltas[1] == 0, "anchor must encode as (0,0)");
                    return Ok(Self {
                        data: deltas.into(),
                        origin: anchor,
                        scale: attempt.scale,
                    });
                }
                Err(overflow) => {
                    debug!(
                        "scale search attempt {} overflowed ({:?}) with scale {:?}",
                        search.attempts(),
                        overflow,
                        attempt.scale
                    );
                    search.record_overflow(overflow);
                }
            }
        }
        Err(PointArrayError::ArithmeticOverflow { attempts: search.attempts() })
    }

    /// Compress a whole interleaved coordinate buffer.
    pub fn from_coords(coords: &[f32]) -> Result<Self> {
        Self::new(coords, 0, coords.len())
    }

    /// Rebuild from stored parts, checking every layout invariant.
    pub fn from_parts(origin: Vec2, scale: Vec2, deltas: Vec<i8>) -> Result<Self> {
        let len = deltas.len();
        if len < 2 || len % 2 != 0 {
            return Err(PointArrayError::invalid_range(0, len, "delta buffer must hold whole points"));
        }
        if deltas[0] != 0 || deltas[1] != 0 {
            return Err(PointArrayError::InvalidArgument(format!(
                "first delta pair must be (0,0), found ({},{})",
                deltas[0], deltas[1]
            )));
        }
        if !(origin.x.is_finite() && origin.y.is_finite() && scale.x.is_finite() && scale.y.is_finite()) {
            return Err(PointArrayError::InvalidArgument("non-finite origin or scale".into()));
        }
        Ok(Self {
            data: deltas.into(),
            origin,
            scale,
        })
    }

    /// Trusted constructor for buffers that already satisfy the layout.
    pub(crate) fn from_raw_parts(data: Arc<[i8]>, origin: Vec2, scale: Vec2) -> Self {
        debug_assert!(data.len() >= 2 && data.len() % 2 == 0);
        debug_assert!(data[0] == 0 && data[1] == 0);
        Self { data, origin, scale }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn deltas(&self) -> &[i8] {
        &self.data
    }

    #[cfg(test)]
    pub(crate) fn buffer(&self) -> &Arc<[i8]> {
        &self.data
    }

    #[inline]
    pub fn lower(&self) -> usize {
        0
    }

    #[inline]
    pub fn upper(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn packed(&self) -> PackedRange<'_> {
        PackedRange {
            deltas: &self.data,
            base: self.origin,
            scale: self.scale,
            offset: (0, 0),
        }
    }

    pub fn count(&self) -> usize {
        self.data.len() / 2
    }

    /// Always the origin: the first delta pair is `(0,0)`.
    pub fn first_point(&self) -> Vec2 {
        self.packed().first_point()
    }

    pub fn last_point(&self) -> Vec2 {
        self.packed().last_point()
    }

    pub fn points(&self) -> PackedPoints<'_> {
        self.packed().points(0)
    }

    /// Window over the raw delta indices `[lower, upper)`; bounds must be
    /// even and inside this array.
    pub(crate) fn window(&self, lower: usize, upper: usize) -> SubArray {
        SubArray::narrow(Arc::clone(&self.data), self.origin, self.scale, (0, 0), self.lower(), lower, upper)
    }
}
