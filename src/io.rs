use crate::profile_scope;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use ultraviolet::Vec2;

use crate::array::{CompressedArray, DynamicArray, PointArray};
use crate::config::SaveFormat;
use crate::error::PointArrayError;
use crate::layer::PointLayer;

pub const LAYER_FORMAT_VERSION: u32 = 1;

/// On-disk form of one point array. Windows are compacted before saving so
/// a file never depends on a parent buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StoredArray {
    Compressed {
        origin: Vec2,
        scale: Vec2,
        deltas: Vec<i8>,
    },
    Raw {
        coords: Vec<f32>,
    },
}

impl From<&PointArray> for StoredArray {
    fn from(array: &PointArray) -> Self {
        let compressed = match array {
            PointArray::Compressed(c) => c.clone(),
            PointArray::Window(w) => w.compact(),
            PointArray::Editable(d) => {
                return StoredArray::Raw {
                    coords: d.coords().to_vec(),
                }
            }
        };
        StoredArray::Compressed {
            origin: compressed.origin(),
            scale: compressed.scale(),
            deltas: compressed.deltas().to_vec(),
        }
    }
}

impl TryFrom<StoredArray> for PointArray {
    type Error = PointArrayError;

    fn try_from(stored: StoredArray) -> Result<Self, Self::Error> {
        match stored {
            StoredArray::Compressed { origin, scale, deltas } => {
                Ok(PointArray::Compressed(CompressedArray::from_parts(origin, scale, deltas)?))
            }
            StoredArray::Raw { coords } => Ok(PointArray::Editable(DynamicArray::from_coords(coords)?)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredEntry {
    pub name: String,
    pub points: StoredArray,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredLayer {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<StoredEntry>,
}

fn default_version() -> u32 {
    LAYER_FORMAT_VERSION
}

impl StoredLayer {
    pub fn from_layer(layer: &PointLayer) -> Self {
        Self {
            version: LAYER_FORMAT_VERSION,
            entries: layer
                .iter()
                .map(|e| StoredEntry {
                    name: e.name.clone(),
                    points: StoredArray::from(&e.points),
                })
                .collect(),
        }
    }

    /// Validate every stored array and rebuild the layer.
    pub fn into_layer(self) -> std::io::Result<PointLayer> {
        if self.version > LAYER_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("layer format version {} is newer than {}", self.version, LAYER_FORMAT_VERSION),
            ));
        }
        let mut layer = PointLayer::new();
        for entry in self.entries {
            let points = PointArray::try_from(entry.points).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("entry '{}': {}", entry.name, e))
            })?;
            layer.push(entry.name, points);
        }
        Ok(layer)
    }
}

pub fn save_layer<P: AsRef<Path>>(path: P, layer: &PointLayer, format: SaveFormat, gzip: bool) -> std::io::Result<()> {
    profile_scope!("save_layer");
    let path = path.as_ref();
    let stored = StoredLayer::from_layer(layer);
    write_atomically(path, |writer| match (format, gzip) {
        (SaveFormat::Json, false) => {
            serde_json::to_writer(writer, &stored).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
        }
        (SaveFormat::Json, true) => {
            let mut encoder = GzEncoder::new(writer, Compression::fast());
            serde_json::to_writer(&mut encoder, &stored)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            encoder.finish().map(|_| ())
        }
        (SaveFormat::Binary, false) => {
            bincode::serialize_into(writer, &stored).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
        }
        (SaveFormat::Binary, true) => {
            let mut encoder = GzEncoder::new(writer, Compression::fast());
            bincode::serialize_into(&mut encoder, &stored)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            encoder.finish().map(|_| ())
        }
    })?;
    info!(
        "saved {} polylines to {} ({:?}, gzip={})",
        layer.len(),
        path.display(),
        format,
        gzip
    );
    Ok(())
}

/// Write through a `.tmp` sibling and rename it over `path`, so a crash
/// never leaves a truncated file. The sibling is removed when writing fails.
fn write_atomically<F>(path: &Path, write: F) -> std::io::Result<()>
where
    F: FnOnce(&mut BufWriter<std::fs::File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(".tmp");
        os
    });
    let result = std::fs::File::create(&tmp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()
    });
    if let Err(e) = result {
        if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
            warn!("could not remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(e);
    }
    std::fs::rename(&tmp_path, path)
}

pub fn load_layer<P: AsRef<Path>>(path: P) -> std::io::Result<PointLayer> {
    profile_scope!("load_layer");
    let data = std::fs::read(path.as_ref())?;
    let stored = if let Some(decoded) = maybe_decompress_gzip(&data)? {
        parse_stored_layer(&decoded)?
    } else {
        parse_stored_layer(&data)?
    };
    stored.into_layer()
}

fn parse_stored_layer(bytes: &[u8]) -> std::io::Result<StoredLayer> {
    if let Ok(layer) = serde_json::from_slice::<StoredLayer>(bytes) {
        return Ok(layer);
    }
    if let Ok(layer) = bincode::deserialize::<StoredLayer>(bytes) {
        return Ok(layer);
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "failed to parse point layer: not valid JSON or binary format",
    ))
}

fn maybe_decompress_gzip(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(None);
    }

    let mut decoder = GzDecoder::new(Cursor::new(data));
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded)?;
    Ok(Some(decoded))
}

/// Read plain-text polylines: one `x y` or `x,y` pair per line, blank lines
/// between polylines, `#` starts a comment.
pub fn read_polylines<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<(String, Vec<f32>)>> {
    let text = std::fs::read_to_string(path)?;
    parse_polylines(&text)
}

pub fn parse_polylines(text: &str) -> std::io::Result<Vec<(String, Vec<f32>)>> {
    fn flush(current: &mut Vec<f32>, polylines: &mut Vec<(String, Vec<f32>)>) {
        if !current.is_empty() {
            let name = format!("polyline-{}", polylines.len());
            polylines.push((name, std::mem::take(current)));
        }
    }

    let mut polylines = Vec::new();
    let mut current: Vec<f32> = Vec::new();
    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            if raw.trim().is_empty() {
                flush(&mut current, &mut polylines);
            }
            continue;
        }
        let values: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        if values.len() != 2 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("line {}: expected 2 values, found {}", line_no + 1, values.len()),
            ));
        }
        for v in values {
            let parsed: f32 = v.parse().map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("line {}: '{}': {}", line_no + 1, v, e),
                )
            })?;
            current.push(parsed);
        }
    }
    flush(&mut current, &mut polylines);
    if polylines.is_empty() {
        warn!("no coordinates found in input");
    }
    Ok(polylines)
}

/// Write polylines in the text form [`parse_polylines`] reads, each one
/// preceded by a `# name` comment.
pub fn write_polylines<W: Write>(mut writer: W, polylines: &[(&str, Vec<f32>)]) -> std::io::Result<()> {
    for (i, (name, coords)) in polylines.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "# {}", name)?;
        for pair in coords.chunks_exact(2) {
            writeln!(writer, "{} {}", pair[0], pair[1])?;
        }
    }
    writer.flush()
}
