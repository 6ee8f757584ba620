pub mod array;
pub mod config;
pub mod error;
pub mod io;
pub mod layer;
pub mod profiler;

pub use array::{Bounds, CompressedArray, Coordinate, DynamicArray, PointArray, Points, SubArray};
pub use error::{PointArrayError, Result};
pub use layer::{LayerEntry, LayerStats, PointLayer};

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
