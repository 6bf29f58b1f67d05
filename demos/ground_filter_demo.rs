//! Ground filtering demo for cloudsift
//!
//! Generates a synthetic terrain with scattered objects, optionally
//! downsamples it and separates ground from non-ground points with the cloth
//! simulation filter. Parameters come from an optional JSON pipeline config
//! and can be overridden on the command line.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cloudsift_algorithms::{run_pipeline, Layer, PipelineConfig, Rigidness, Session};
use cloudsift_core::{Point3d, PointCloud, Rgb};

#[derive(Parser, Debug)]
#[command(
    name = "ground_filter_demo",
    about = "Classify a synthetic terrain into ground and non-ground points"
)]
struct Cli {
    /// JSON pipeline config; command line flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Terrain edge length in cloud units
    #[arg(long, default_value_t = 100)]
    size: usize,

    /// Number of tree points scattered over the terrain
    #[arg(long, default_value_t = 200)]
    trees: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long)]
    voxel_size: Option<f64>,

    #[arg(long)]
    cloth_resolution: Option<f64>,

    #[arg(long)]
    class_threshold: Option<f64>,

    #[arg(long)]
    max_iterations: Option<usize>,

    /// 1 steep slope, 2 relief, 3 flat
    #[arg(long)]
    rigidness: Option<u8>,

    /// Write the ground and non-ground clouds as JSON into this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if self.voxel_size.is_some() {
            config.voxel_size = self.voxel_size;
        }
        if let Some(resolution) = self.cloth_resolution {
            config.csf.cloth_resolution = resolution;
        }
        if let Some(threshold) = self.class_threshold {
            config.csf.class_threshold = threshold;
        }
        if let Some(iterations) = self.max_iterations {
            config.csf.max_iterations = iterations;
        }
        if let Some(code) = self.rigidness {
            config.csf.rigidness = Rigidness::from_code(code)?;
        }
        Ok(config)
    }
}

/// Gently rolling ground sampled on a unit grid, plus tree points above it
fn generate_terrain(size: usize, trees: usize, rng: &mut StdRng) -> Result<PointCloud> {
    let ground_height = |x: f64, y: f64| (x * 0.05).sin() * 1.5 + (y * 0.03).cos();

    let mut points = Vec::with_capacity(size * size + trees);
    let mut colors = Vec::with_capacity(size * size + trees);
    for i in 0..size {
        for j in 0..size {
            let (x, y) = (i as f64, j as f64);
            points.push(Point3d::new(x, y, ground_height(x, y) + rng.gen_range(-0.02..0.02)));
            colors.push(Rgb::from_u8([150, 120, 90]));
        }
    }
    for _ in 0..trees {
        let x = rng.gen_range(0.0..size as f64);
        let y = rng.gen_range(0.0..size as f64);
        points.push(Point3d::new(x, y, ground_height(x, y) + rng.gen_range(2.0..12.0)));
        colors.push(Rgb::from_u8([40, 160, 40]));
    }

    Ok(PointCloud::from_points(points).with_colors(colors)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
        .filter(
            None,
            if cli.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .parse_default_env()
        .init();

    let config = cli.pipeline_config()?;
    log::info!("pipeline config: {}", serde_json::to_string(&config)?);

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let source = generate_terrain(cli.size, cli.trees, &mut rng)?;
    log::info!("generated {} points ({} trees)", source.len(), cli.trees);

    let start = std::time::Instant::now();
    let session = run_pipeline(Session::new(source), None, &config)?;
    log::info!("pipeline finished in {:?}", start.elapsed());

    for layer in session.layers() {
        if let Some(cloud) = session.layer(layer) {
            println!("{:<12} {:>8} points", layer.name(), cloud.len());
        }
    }

    if let Some(dir) = &cli.output {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for layer in [Layer::Ground, Layer::NonGround] {
            let Some(cloud) = session.layer(layer) else {
                continue;
            };
            let path = dir.join(format!("{layer}.json"));
            fs::write(&path, serde_json::to_string(cloud)?)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
    }

    Ok(())
}
