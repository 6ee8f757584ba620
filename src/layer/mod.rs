// Named collections of point arrays, built and flattened the way map layers use them


use log::{debug, info};
use rayon::prelude::*;

use crate::array::{Bounds, DynamicArray, PointArray};
use crate::config::LayerConfig;
use crate::error::{PointArrayError, Result};
use crate::profile_scope;

/// Storage statistics for a layer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerStats {
    pub entry_count: usize,
    pub point_count: usize,
    pub compressed_count: usize,
    /// Bytes of point data as stored; windows count their whole parent buffer
    pub stored_bytes: usize,
    /// Bytes the same points take as raw `f32` pairs
    pub raw_bytes: usize,
}

impl LayerStats {
    pub fn stored_mb(&self) -> f64 {
        self.stored_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn raw_mb(&self) -> f64 {
        self.raw_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Stored size over raw size; lower is better.
    pub fn compression_ratio(&self) -> f64 {
        if self.raw_bytes == 0 {
            return 0.0;
        }
        self.stored_bytes as f64 / self.raw_bytes as f64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerEntry {
    pub name: String,
    pub points: PointArray,
}

/// Polylines of one map layer, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointLayer {
    entries: Vec<LayerEntry>,
}

impl PointLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a layer from raw interleaved polylines, compressing them in
    /// parallel. Polylines shorter than `min_compress_points` stay raw.
    pub fn from_polylines(polylines: Vec<(String, Vec<f32>)>, config: &LayerConfig) -> Result<Self> {
        profile_scope!("build_layer");
        let entries = polylines
            .into_par_iter()
            .map(|(name, coords)| build_entry(name, coords, config))
            .collect::<Result<Vec<_>>>()?;
        let layer = Self { entries };
        let stats = layer.stats();
        info!(
            "built layer: {} polylines, {} points, {} compressed, ratio {:.3}",
            stats.entry_count,
            stats.point_count,
            stats.compressed_count,
            stats.compression_ratio()
        );
        Ok(layer)
    }

    pub fn push(&mut self, name: impl Into<String>, points: PointArray) {
        self.entries.push(LayerEntry {
            name: name.into(),
            points,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry called `name`.
    pub fn get(&self, name: &str) -> Option<&PointArray> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.points)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.entries
    }

    /// Flatten every entry with the given decimation, for drawing at low
    /// zoom. Each buffer is sized by a dry run before it is filled.
    pub fn decimated(&self, decimation: usize) -> Result<Vec<(&str, Vec<f32>)>> {
        profile_scope!("decimate_layer");
        if decimation < 1 {
            return Err(PointArrayError::InvalidArgument(format!(
                "decimation must be at least 1, got {}",
                decimation
            )));
        }
        self.entries
            .par_iter()
            .map(|entry| {
                let len = entry.points.to_float_array(None, 0, decimation)?;
                let mut buf = vec![0.0f32; len];
                entry.points.to_float_array(Some(&mut buf[..]), 0, decimation)?;
                Ok::<_, PointArrayError>((entry.name.as_str(), buf))
            })
            .collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.entries
            .iter()
            .filter_map(|e| e.points.bounds())
            .reduce(Bounds::union)
    }

    pub fn stats(&self) -> LayerStats {
        self.entries.iter().fold(
            LayerStats {
                entry_count: self.entries.len(),
                ..Default::default()
            },
            |mut stats, entry| {
                let count = entry.points.count();
                stats.point_count += count;
                stats.raw_bytes += count * 2 * std::mem::size_of::<f32>();
                stats.stored_bytes += entry.points.memory_usage();
                if entry.points.is_compressed() {
                    stats.compressed_count += 1;
                }
                stats
            },
        )
    }
}

fn build_entry(name: String, coords: Vec<f32>, config: &LayerConfig) -> Result<LayerEntry> {
    let editable = DynamicArray::from_coords(coords)?;
    let compress = config.compress && editable.count() >= config.min_compress_points.max(1);
    if !compress {
        debug!("keeping '{}' uncompressed ({} points)", name, editable.count());
    }
    Ok(LayerEntry {
        name,
        points: editable.get_final(compress)?,
    })
}
