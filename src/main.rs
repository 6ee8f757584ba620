use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};

use pointpack::config::{LayerConfig, SaveFormat};
use pointpack::{io, PointLayer};

#[derive(Parser)]
#[command(name = "pointpack", version, about = "Compact point storage for map layers")]
struct Cli {
    /// Layer settings (defaults to ./pointpack.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress plain-text polylines into a layer file
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Save as JSON instead of the configured format
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_gzip: bool,
    },
    /// Print statistics for a layer file
    Info { layer: PathBuf },
    /// Write a decimated copy of a layer as plain text
    Decimate {
        layer: PathBuf,
        #[arg(short, long)]
        factor: Option<usize>,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<LayerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => LayerConfig::load_from_file(path),
        None => LayerConfig::load_default(),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Compress {
            input,
            output,
            json,
            no_gzip,
        } => {
            let polylines = io::read_polylines(&input)?;
            let layer = PointLayer::from_polylines(polylines, &config)?;
            let format = if json { SaveFormat::Json } else { config.save_format };
            io::save_layer(&output, &layer, format, config.gzip && !no_gzip)?;
        }
        Command::Info { layer } => {
            let loaded = io::load_layer(&layer)?;
            let stats = loaded.stats();
            println!("{}", layer.display());
            println!("  polylines:  {}", stats.entry_count);
            println!("  points:     {}", stats.point_count);
            println!("  compressed: {}", stats.compressed_count);
            println!(
                "  size:       {:.3} MB stored, {:.3} MB raw (ratio {:.3})",
                stats.stored_mb(),
                stats.raw_mb(),
                stats.compression_ratio()
            );
            if let Some(bounds) = loaded.bounds() {
                println!(
                    "  bounds:     ({}, {}) .. ({}, {}), {} x {}",
                    bounds.min.x,
                    bounds.min.y,
                    bounds.max.x,
                    bounds.max.y,
                    bounds.width(),
                    bounds.height()
                );
            }
            for entry in loaded.iter() {
                println!("  {}: {}", entry.name, entry.points);
            }
        }
        Command::Decimate { layer, factor, output } => {
            let loaded = io::load_layer(&layer)?;
            let factor = factor.unwrap_or(config.default_decimation);
            let flat = loaded.decimated(factor)?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)?;
                    io::write_polylines(std::io::BufWriter::new(file), &flat)?;
                    info!("wrote {} polylines decimated by {} to {}", flat.len(), factor, path.display());
                }
                None => io::write_polylines(std::io::stdout().lock(), &flat)?,
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = run(cli);

    #[cfg(feature = "profiling")]
    pointpack::PROFILER.lock().log_and_clear();

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
