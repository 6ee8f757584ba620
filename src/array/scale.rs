// Scale search for the 8-bit delta codec
// Kept as a small explicit state machine so termination is testable on its own

use ultraviolet::Vec2;

use crate::config::{DELTA_MAX, DELTA_MIN, MAX_SCALE_ATTEMPTS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Which way a trial delta left the `[-128, 127]` range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overflow {
    High(Axis),
    Low(Axis),
}

/// Extremes of the step between consecutive points, per axis.
///
/// Both extremes start at zero, so `min <= 0 <= max` always holds and the
/// derived scales are never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeltaExtents {
    pub min: Vec2,
    pub max: Vec2,
}

impl DeltaExtents {
    /// `coords` holds interleaved x/y values of the range being encoded.
    pub fn of(coords: &[f32]) -> Self {
        let mut extents = Self::default();
        for pair in coords.windows(4).step_by(2) {
            let step = Vec2::new(pair[2] - pair[0], pair[3] - pair[1]);
            extents.min = extents.min.min_by_component(step);
            extents.max = extents.max.max_by_component(step);
        }
        extents
    }

    /// False when a step overflowed `f32`, which no scale can represent.
    pub fn is_finite(&self) -> bool {
        self.min.x.is_finite() && self.min.y.is_finite() && self.max.x.is_finite() && self.max.y.is_finite()
    }
}

/// One candidate scale pair plus the overflow counters that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionAttempt {
    pub scale: Vec2,
    pub reduce_min_x: i32,
    pub reduce_max_x: i32,
    pub reduce_min_y: i32,
    pub reduce_max_y: i32,
}

#[derive(Clone, Debug)]
pub struct ScaleSearch {
    extents: DeltaExtents,
    attempt: usize,
    max_attempts: usize,
    reduce_min_x: i32,
    reduce_max_x: i32,
    reduce_min_y: i32,
    reduce_max_y: i32,
}

impl ScaleSearch {
    pub fn new(extents: DeltaExtents) -> Self {
        Self::with_max_attempts(extents, MAX_SCALE_ATTEMPTS)
    }

    pub fn with_max_attempts(extents: DeltaExtents, max_attempts: usize) -> Self {
        Self {
            extents,
            attempt: 0,
            max_attempts,
            reduce_min_x: 0,
            reduce_max_x: 0,
            reduce_min_y: 0,
            reduce_max_y: 0,
        }
    }

    /// Attempts handed out so far.
    pub fn attempts(&self) -> usize {
        self.attempt
    }

    /// Next scale pair to try, or `None` once the budget is spent.
    pub fn next_attempt(&mut self) -> Option<CompressionAttempt> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        let scale = Vec2::new(
            axis_scale(self.extents.min.x, self.extents.max.x, self.reduce_min_x, self.reduce_max_x),
            axis_scale(self.extents.min.y, self.extents.max.y, self.reduce_min_y, self.reduce_max_y),
        );
        Some(CompressionAttempt {
            scale,
            reduce_min_x: self.reduce_min_x,
            reduce_max_x: self.reduce_max_x,
            reduce_min_y: self.reduce_min_y,
            reduce_max_y: self.reduce_max_y,
        })
    }

    /// Widen the range on the side that overflowed.
    pub fn record_overflow(&mut self, overflow: Overflow) {
        match overflow {
            Overflow::High(Axis::X) => self.reduce_max_x += 1,
            Overflow::Low(Axis::X) => self.reduce_min_x += 1,
            Overflow::High(Axis::Y) => self.reduce_max_y += 1,
            Overflow::Low(Axis::Y) => self.reduce_min_y += 1,
        }
    }
}

#[inline]
fn axis_scale(d_min: f32, d_max: f32, reduce_min: i32, reduce_max: i32) -> f32 {
    let high = d_max / (DELTA_MAX - reduce_max) as f32;
    let low = d_min / (DELTA_MIN + reduce_min) as f32;
    high.max(low)
}

/// Quantised offset from the anchor. A zero scale means every value on
/// that axis equals the anchor.
#[inline]
fn quantize(value: f32, anchor: f32, scale: f32) -> i32 {
    if scale == 0.0 {
        0
    } else {
        ((value - anchor) / scale).round() as i32
    }
}

#[inline]
fn check_delta(delta: i32, axis: Axis) -> Result<i8, Overflow> {
    if delta > DELTA_MAX {
        Err(Overflow::High(axis))
    } else if delta < DELTA_MIN {
        Err(Overflow::Low(axis))
    } else {
        Ok(delta as i8)
    }
}

/// Encode `coords` with one candidate scale, stopping at the first delta
/// that does not fit in a byte.
pub fn trial_encode(coords: &[f32], anchor: Vec2, scale: Vec2) -> Result<Vec<i8>, Overflow> {
    let mut out = Vec::with_capacity(coords.len());
    let (mut last_x, mut last_y) = (0i32, 0i32);
    for c in coords.chunks_exact(2) {
        let x = quantize(c[0], anchor.x, scale.x);
        out.push(check_delta(x.saturating_sub(last_x), Axis::X)?);
        last_x = x;
        let y = quantize(c[1], anchor.y, scale.y);
        out.push(check_delta(y.saturating_sub(last_y), Axis::Y)?);
        last_y = y;
    }
    Ok(out)
}
