#![allow(clippy::cast_possible_truncation)]

mod options;

use anyhow::{anyhow, Error as AnyError};
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd};
use osrm::{Acquirer, Client};
use std::{
    fs::File,
    io::{BufWriter, Write},
    time::Instant,
};
use terrain::{dem::GeoTiff, Profile, Record, TileMode, Tiles};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    env_logger::init();

    // Reject bad settings before any network or raster I/O.
    let builder = Profile::builder()
        .points(cli.points)
        .batch_size(cli.batch)
        .parallel(cli.parallel);
    builder.validate()?;
    let acquirer = Acquirer::new(Client::new(cli.osrm_url.clone())?, cli.acquirer_config())?;

    let route = acquirer.acquire(cli.start.0, cli.end.0)?;
    info!("route vertices: {}", route.len());
    let builder = builder.route(route);

    let now = Instant::now();
    let profile = match (&cli.dem, &cli.tile_dir) {
        (Some(path), _) => {
            let dem = GeoTiff::open(path)?;
            builder.build(&dem)?
        }
        (None, Some(tile_dir)) => {
            let tiles = Tiles::new(tile_dir.clone(), TileMode::MemMap)?;
            builder.build(&tiles)?
        }
        (None, None) => return Err(anyhow!("either --dem or --tile-dir is required")),
    };
    info!(
        "profile; points: {}, distance_m: {:.1}, unknown elevations: {}, exec: {:?}",
        profile.len(),
        profile.distance_m,
        profile.unknown_elevations(),
        now.elapsed()
    );

    match cli.cmd {
        CliCmd::Csv { out: Some(path) } => write_csv(BufWriter::new(File::create(path)?), &profile)?,
        CliCmd::Csv { out: None } => write_csv(std::io::stdout().lock(), &profile)?,
        CliCmd::Json { every } => print_json(&profile, usize::try_from(every)?)?,
        CliCmd::Plot => plot_ascii(&profile),
    };
    Ok(())
}

/// Writes one CSV row per profile point, unknown values as empty
/// fields.
///
/// # Example with gnuplot
///
/// ```sh
/// cargo run -- --start=55.7558,37.6173 --end=59.9343,30.3351 --dem=dem.tif csv | tr ',' ' ' > ~/.tmp/plot && gnuplot -p -e "plot '~/.tmp/plot' using 4:5 with lines"
/// ```
fn write_csv<W: Write>(mut out: W, profile: &Profile) -> Result<(), AnyError> {
    writeln!(out, "idx,lat,lon,dist_m,elevation_m,gradient_pct")?;
    for Record {
        idx,
        lat,
        lon,
        dist_m,
        elevation_m,
        gradient_pct,
    } in profile.records()
    {
        writeln!(
            out,
            "{idx},{lat},{lon},{dist_m},{},{}",
            Field(elevation_m),
            Field(gradient_pct)
        )?;
    }
    out.flush()?;
    Ok(())
}

/// An optional CSV value.
struct Field(Option<f64>);

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => Ok(()),
        }
    }
}

/// Returns every `every`th record, plus the last one.
fn decimate(profile: &Profile, every: usize) -> Vec<Record> {
    let last = profile.len().saturating_sub(1);
    profile
        .records()
        .filter(|r| r.idx % every == 0 || r.idx == last)
        .collect()
}

fn print_json(profile: &Profile, every: usize) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &decimate(profile, every))?;
    writeln!(stdout)?;
    Ok(())
}

fn plot_ascii(profile: &Profile) {
    let plot_data: Vec<(f32, f32)> = profile
        .records()
        .filter_map(|r| {
            r.elevation_m
                .map(|elev| ((r.dist_m / 1000.0) as f32, elev as f32))
        })
        .collect();
    Chart::new(300, 150, 0.0, (profile.distance_m / 1000.0) as f32)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}
