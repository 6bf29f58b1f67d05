//! Crop and subtract demo for cloudsift
//!
//! Cuts a region out of a synthetic cloud, either a sphere around a point or
//! an axis-aligned cuboid, and removes it from the cloud by nearest-neighbor
//! matching. The remainder is then ground filtered.

use std::io::Write;

use anyhow::{bail, ensure, Result};
use clap::{Parser, ValueEnum};
use env_logger::Builder;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cloudsift_algorithms::{
    crop_by_aabb, crop_by_radius, point_cloud_distance, run_pipeline, subtract, Layer,
    PipelineConfig, Session, DEFAULT_TOLERANCE,
};
use cloudsift_core::{Aabb, Point3d, PointCloud, Vector3d};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Region {
    Sphere,
    Cuboid,
}

#[derive(Parser, Debug)]
#[command(
    name = "crop_and_subtract_demo",
    about = "Cut a region out of a synthetic cloud and subtract it"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Region::Sphere)]
    region: Region,

    /// Sphere radius, or half the cuboid edge
    #[arg(long, default_value_t = 10.0)]
    radius: f64,

    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    #[arg(long, default_value_t = 20_000)]
    points: usize,

    #[arg(long, default_value_t = 0.0)]
    voxel_size: f64,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    #[arg(short, long)]
    verbose: bool,
}

fn random_cloud(n: usize, rng: &mut StdRng) -> PointCloud {
    let points = (0..n)
        .map(|_| {
            let x: f64 = rng.gen_range(0.0..60.0);
            let y: f64 = rng.gen_range(0.0..60.0);
            let z = (x * 0.1).sin() + rng.gen_range(0.0..0.1);
            Point3d::new(x, y, z)
        })
        .collect();
    PointCloud::from_points(points)
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

    if cli.radius <= 0.0 {
        bail!("--radius must be positive, got {}", cli.radius);
    }

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let source = random_cloud(cli.points, &mut rng);
    let Some(bounds) = source.bounding_box() else {
        bail!("no points generated");
    };
    let center = bounds.center();

    let cut = match cli.region {
        Region::Sphere => crop_by_radius(&source, &center, cli.radius)?,
        Region::Cuboid => {
            let half = Vector3d::repeat(cli.radius);
            crop_by_aabb(&source, &Aabb::new(center - half, center + half))?
        }
    };
    log::info!("{:?} region around {:?} holds {} points", cli.region, center, cut.len());

    let distances = point_cloud_distance(&source, &cut);
    let within = distances.iter().filter(|&&d| d <= cli.tolerance).count();
    let result = subtract(&source, &cut, cli.tolerance)?;
    ensure!(within == result.matched.len(), "distance and subtraction disagree");
    println!(
        "subtracted {} of {} points, {} remain",
        result.matched.len(),
        source.len(),
        result.remainder.len()
    );

    let mut config = PipelineConfig {
        voxel_size: Some(cli.voxel_size),
        crop_tolerance: Some(cli.tolerance),
        ..Default::default()
    };
    config.csf.cloth_resolution = 2.0;

    let session = run_pipeline(Session::new(source), Some(&cut), &config)?;
    for layer in Layer::ALL {
        match session.layer(layer) {
            Some(cloud) => println!("{:<12} {:>8} points", layer.name(), cloud.len()),
            None => println!("{:<12} {:>8}", layer.name(), "-"),
        }
    }

    Ok(())
}
