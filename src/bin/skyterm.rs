// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use canonical_error::{failed_precondition_error, invalid_argument_error, CanonicalError};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};

use skyterm::config::{parse_glyph_set, SkyConfig};
use skyterm::frame_stats::FrameStatsAccumulator;
use skyterm::sim_clock::SimulationClock;
use skyterm::sky_scene::{Grid, SkyScene};
use skyterm_elements::catalog::{
    build_moon, build_planet_table, build_star_table, parse_constellation_table,
    parse_name_table, set_star_labels, CatalogEntry};
use skyterm_elements::orbital_tables::PlanetId;
use skyterm_elements::sky_geometry::{cardinal_grid_positions, grid_to_polar,
                                     unproject_stereographic_north};
use skyterm_elements::time_util::{parse_datetime, zodiac_sign};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Observer latitude, degrees in [-90, 90].
    #[arg(long, default_value = "42.361145", allow_hyphen_values = true)]
    latitude: f64,

    /// Observer longitude, degrees in [-180, 180], positive east.
    #[arg(long, default_value = "-71.057083", allow_hyphen_values = true)]
    longitude: f64,

    /// Observation start in UTC, <yyyy-mm-ddThh:mm:ss>. Defaults to now.
    #[arg(long)]
    datetime: Option<String>,

    /// Only show stars brighter than this magnitude.
    #[arg(long, default_value = "3.0")]
    threshold: f64,

    /// Label stars brighter than this magnitude.
    #[arg(long, default_value = "0.5")]
    label_thresh: f64,

    /// Frames per second.
    #[arg(long, default_value = "24")]
    fps: u32,

    /// Simulation speed multiplier.
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    speed: f64,

    /// Terminal cell height/width ratio.
    #[arg(long)]
    aspect_ratio: Option<f64>,

    /// Star glyphs: ascii, round, diamond, open or filled.
    #[arg(long, default_value = "round")]
    glyphs: String,

    /// Color planets, the Moon and constellation lines in the text render.
    #[arg(long)]
    color: bool,

    /// Show the azimuthal grid.
    #[arg(long)]
    grid: bool,

    /// Show constellation figures.
    #[arg(long)]
    constellations: bool,

    /// Log metadata (date, Moon phase, frame timing) each frame.
    #[arg(long)]
    meta: bool,

    /// Star name table, <catalog_number,name> per line.
    #[arg(long)]
    names: Option<String>,

    /// Constellation figure table, <ABBR n s1 s2 ...> per line.
    #[arg(long)]
    constellation_file: Option<String>,

    /// Number of frames to run.
    #[arg(long, default_value = "1")]
    frames: u32,

    /// Grid rows.
    #[arg(long, default_value = "25")]
    rows: usize,

    /// Grid columns.
    #[arg(long, default_value = "61")]
    cols: usize,

    /// Print the last frame as text.
    #[arg(long)]
    render: bool,

    /// Directory for a daily rolling log file. No log file if omitted.
    #[arg(long)]
    log_dir: Option<String>,

    #[arg(long, default_value = "skyterm_log.txt")]
    log_file: String,
}

// A handful of bright stars (J2000 RA hours, Dec degrees, magnitude x 100)
// so that the driver shows a sky without the binary catalog.
const BRIGHT_STARS: [(u32, f64, f64, i16); 12] = [
    (424, 2.530301, 89.264109, 202),     // Polaris
    (1708, 5.278155, 45.997991, 8),      // Capella
    (1713, 5.242298, -8.201640, 12),     // Rigel
    (2061, 5.919529, 7.407064, 50),      // Betelgeuse
    (2326, 6.399195, -52.695661, -72),   // Canopus
    (2491, 6.752481, -16.716116, -146),  // Sirius
    (2943, 7.655033, 5.224993, 38),      // Procyon
    (5340, 14.261020, 19.182410, -4),    // Arcturus
    (5459, 14.660765, -60.833976, -1),   // Rigil Kentaurus
    (7001, 18.615649, 38.783692, 3),     // Vega
    (7557, 19.846388, 8.868322, 77),     // Altair
    (7924, 20.690532, 45.280339, 125),   // Deneb
];

fn bright_star_entries() -> Vec<CatalogEntry> {
    BRIGHT_STARS.iter().map(|&(n, ra_hours, dec, mag)| CatalogEntry {
        catalog_number: n,
        right_ascension: (ra_hours * 15.0).to_radians(),
        declination: dec.to_radians(),
        magnitude: mag,
        ra_motion: 0.0,
        dec_motion: 0.0,
    }).collect()
}

fn read_file(path: &str) -> Result<String, CanonicalError> {
    std::fs::read_to_string(path).map_err(|e| failed_precondition_error(
        format!("Could not read {}: {:?}", path, e).as_str()))
}

fn config_from_args(args: &Args) -> Result<SkyConfig, CanonicalError> {
    let datetime = match &args.datetime {
        Some(text) => Some(parse_datetime(text)?),
        None => None,
    };
    let config = SkyConfig {
        latitude: args.latitude,
        longitude: args.longitude,
        datetime,
        threshold: args.threshold,
        label_threshold: args.label_thresh,
        fps: args.fps,
        speed: args.speed,
        aspect_ratio: args.aspect_ratio,
        glyph_set: parse_glyph_set(&args.glyphs)?,
        color: args.color,
        grid: args.grid,
        constellations: args.constellations,
        metadata: args.meta,
    };
    config.validate()?;
    Ok(config)
}

fn grid_from_args(args: &Args, config: &SkyConfig) -> Result<Grid, CanonicalError> {
    if args.rows == 0 || args.cols == 0 {
        return Err(invalid_argument_error(
            format!("Grid {}x{} has no cells", args.rows, args.cols).as_str()));
    }
    Ok(Grid {
        height: args.rows,
        width: args.cols,
        aspect_ratio: config.aspect_ratio(),
    })
}

fn build_scene(args: &Args, config: &SkyConfig) -> Result<SkyScene, CanonicalError> {
    let names = match &args.names {
        Some(path) => parse_name_table(&read_file(path)?)?,
        None => {
            let mut names = HashMap::new();
            names.insert(424, "Polaris".to_string());
            names.insert(2491, "Sirius".to_string());
            names.insert(7001, "Vega".to_string());
            names
        }
    };
    let constellations = match &args.constellation_file {
        Some(path) => parse_constellation_table(&read_file(path)?)?,
        None => Vec::new(),
    };
    let scale = config.magnitude_scale();
    let mut stars = build_star_table(&bright_star_entries(), &names, &scale);
    set_star_labels(&mut stars, &names, config.label_threshold);
    Ok(SkyScene::new(stars, build_planet_table(&scale), build_moon(), constellations))
}

const ANSI_RESET: &str = "\x1b[0m";
const MOON_COLOR: &str = "\x1b[97m";
const CONSTELLATION_COLOR: &str = "\x1b[34m";

fn planet_color(id: PlanetId) -> &'static str {
    match id {
        PlanetId::Sun => "\x1b[93m",
        PlanetId::Mercury => "\x1b[90m",
        PlanetId::Venus | PlanetId::Saturn => "\x1b[33m",
        PlanetId::Mars => "\x1b[31m",
        PlanetId::Jupiter => "\x1b[36m",
        PlanetId::Uranus => "\x1b[96m",
        PlanetId::Earth | PlanetId::Neptune => "\x1b[94m",
    }
}

// Wraps `glyph` in an ANSI color when color output is on.
fn paint(glyph: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{}{}{}", color, glyph, ANSI_RESET)
    } else {
        glyph.to_string()
    }
}

// Text rendering of one frame, north up and east left.
fn render(scene: &SkyScene, config: &SkyConfig, grid: &Grid) -> String {
    if grid.height == 0 || grid.width == 0 {
        return String::new();
    }
    let unicode = config.unicode();
    let mut cells = vec![vec![" ".to_string(); grid.width]; grid.height];
    let mut put = |(row, col): (usize, usize), s: &str| {
        cells[row][col] = s.to_string();
    };

    // Horizon outline and azimuthal grid.
    for row in 0..grid.height {
        for col in 0..grid.width {
            let (r, theta) = grid_to_polar(row, col, grid.height, grid.width,
                                           grid.aspect_ratio);
            if (r - 1.0).abs() < 0.04 {
                put((row, col), ".");
            } else if config.grid && r < 1.0 {
                let (alt, az) = unproject_stereographic_north(r, theta);
                let on_circle = (alt.to_degrees() / 30.0).fract().abs() < 0.03;
                let on_spoke = (az.to_degrees() / 45.0).fract().abs() < 0.02;
                if on_circle || on_spoke {
                    put((row, col), "'");
                }
            }
        }
    }
    if config.constellations {
        let dot = paint("·", CONSTELLATION_COLOR, config.color);
        for (start, end) in scene.constellation_segments(config.threshold, grid) {
            // Dotted line between the end points.
            let steps = start.0.abs_diff(end.0).max(start.1.abs_diff(end.1)).max(1);
            for i in 1..steps {
                let t = i as f64 / steps as f64;
                let row = start.0 as f64 + t * (end.0 as f64 - start.0 as f64);
                let col = start.1 as f64 + t * (end.1 as f64 - start.1 as f64);
                put((row.round() as usize, col.round() as usize), &dot);
            }
        }
    }
    for (star, cell) in scene.visible_stars(config.threshold, grid) {
        put(cell, &star.base.symbol(unicode));
        if let Some(label) = star.base.label() {
            for (i, c) in label.chars().enumerate() {
                if cell.1 + 2 + i < grid.width {
                    put((cell.0, cell.1 + 2 + i), &c.to_string());
                }
            }
        }
    }
    for (planet, cell) in scene.visible_planets(grid) {
        put(cell, &paint(&planet.base.symbol(unicode), planet_color(planet.id),
                         config.color));
    }
    if let Some(cell) = scene.visible_moon(grid) {
        let moon = scene.moon();
        let glyph = if unicode { moon.phase.glyph().to_string() }
                    else { moon.base.symbol(false) };
        put(cell, &paint(&glyph, MOON_COLOR, config.color));
    }
    for (label, row, col) in cardinal_grid_positions(grid.height, grid.width,
                                                     grid.aspect_ratio) {
        put((row, col), label);
    }
    cells.iter().map(|row| row.concat()).collect::<Vec<_>>().join("\n")
}

fn log_frame(scene: &SkyScene, config: &SkyConfig, grid: &Grid, frame: u32) {
    for (star, (row, col)) in scene.visible_stars(config.threshold, grid) {
        info!("frame {} star {} {:?} mag {:.2} alt {:.2} az {:.2} at ({}, {})",
              frame, star.catalog_number, star.base.label().unwrap_or(""),
              star.magnitude, star.base.altitude.to_degrees(),
              star.base.azimuth.to_degrees(), row, col);
    }
    for (planet, (row, col)) in scene.visible_planets(grid) {
        info!("frame {} {} alt {:.2} az {:.2} at ({}, {})",
              frame, planet.id.name(), planet.base.altitude.to_degrees(),
              planet.base.azimuth.to_degrees(), row, col);
    }
    if let Some((row, col)) = scene.visible_moon(grid) {
        let moon = scene.moon();
        info!("frame {} Moon alt {:.2} az {:.2} at ({}, {})",
              frame, moon.base.altitude.to_degrees(),
              moon.base.azimuth.to_degrees(), row, col);
    }
}

fn log_metadata(scene: &SkyScene, clock: &SimulationClock,
                frame_stats: &FrameStatsAccumulator) {
    let (year, month, day) = clock.calendar_date();
    let elapsed = clock.elapsed();
    info!("Date {:04}-{:02}-{:02} (JD {:.5}) {}; elapsed {}{}y {}d {:02}:{:02}:{:02}",
          year, month, day, clock.current_julian_date(), zodiac_sign(month, day),
          if elapsed.negative { "-" } else { "" },
          elapsed.years, elapsed.days, elapsed.hours, elapsed.minutes, elapsed.seconds);
    let phase = scene.moon().phase;
    info!("Moon: {} {} ({:.0}% lit)", phase.name(), phase.glyph(),
          100.0 * phase.illuminated_fraction);
    if let Some(nearest) = scene.nearest_object(0.0, std::f64::consts::FRAC_PI_2) {
        info!("Nearest zenith: {} ({:.1} deg away)", nearest.name,
              nearest.separation.to_degrees());
    }
    let recent = &frame_stats.frame_stats.recent;
    info!("Update latency ms: mean {:.3} median {:.3} max {:.3}",
          recent.mean * 1000.0, recent.median.unwrap_or(0.0) * 1000.0,
          recent.max * 1000.0);
}

fn setup_logging(args: &Args) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();
    let (non_blocking_stdout, stdout_guard) = NonBlockingBuilder::default()
        .lossy(false)
        .finish(std::io::stdout());
    guards.push(stdout_guard);
    let file_layer = args.log_dir.as_ref().map(|log_dir| {
        let file_appender = tracing_appender::rolling::daily(log_dir, &args.log_file);
        let (non_blocking_file, file_guard) = NonBlockingBuilder::default()
            .lossy(false)
            .finish(file_appender);
        guards.push(file_guard);
        fmt::layer().with_ansi(false).with_writer(non_blocking_file)
    });
    registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(non_blocking_stdout))
        .with(file_layer)
        .init();
    guards
}

fn run(args: &Args, got_signal: &AtomicBool) -> Result<(), CanonicalError> {
    let config = config_from_args(args)?;
    let observer = config.to_observer();
    let mut scene = build_scene(args, &config)?;
    let grid = grid_from_args(args, &config)?;
    let mut clock = SimulationClock::new(config.start_julian_date());
    let mut frame_stats = FrameStatsAccumulator::new(config.fps as usize);
    let frame_duration = Duration::from_secs_f64(config.frame_seconds());
    info!("Observer lat {:.4} long {:.4}, start JD {:.5}, {} stars, {} constellations",
          config.latitude, config.longitude, clock.start_julian_date(),
          scene.stars().len(), scene.constellations().len());

    for frame in 0..args.frames {
        if got_signal.load(AtomicOrdering::Relaxed) {
            warn!("Interrupted after {} frames", frame);
            break;
        }
        let frame_start = Instant::now();
        scene.update(&clock, &observer);
        frame_stats.add_value(frame_start.elapsed().as_secs_f64());

        log_frame(&scene, &config, &grid, frame);
        if config.metadata {
            log_metadata(&scene, &clock, &frame_stats);
        }
        if frame + 1 < args.frames {
            clock.advance(config.frame_seconds(), config.speed);
            if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
    if args.render {
        println!("{}", render(&scene, &config, &grid));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    let guards = setup_logging(&args);

    let got_signal = Arc::new(AtomicBool::new(false));
    let got_signal2 = got_signal.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Got control-c");
        got_signal2.store(true, AtomicOrdering::Relaxed);
    }) {
        warn!("Could not install control-c handler: {:?}", e);
    }

    if let Err(e) = run(&args, &got_signal) {
        error!("{:?}", e);
        drop(guards);  // Flush logs.
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["skyterm", "--datetime", "2000-01-01T12:00:00",
                            "--latitude", "51.4769", "--longitude", "0.0"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    // Scene at J2000 over Greenwich, where the Sun is about 15 degrees up.
    fn updated_scene(args: &Args, config: &SkyConfig) -> SkyScene {
        let mut scene = build_scene(args, config).unwrap();
        let clock = SimulationClock::new(config.start_julian_date());
        scene.update(&clock, &config.to_observer());
        scene
    }

    #[test]
    fn test_empty_grid_rejected() {
        for extra in [["--rows", "0"], ["--cols", "0"]] {
            let args = args(&extra);
            let config = config_from_args(&args).unwrap();
            assert!(grid_from_args(&args, &config).is_err());
        }
        let args = args(&["--rows", "1", "--cols", "1"]);
        let config = config_from_args(&args).unwrap();
        let grid = grid_from_args(&args, &config).unwrap();
        assert_eq!((grid.height, grid.width), (1, 1));
    }

    #[test]
    fn test_render_empty_grid() {
        let args = args(&[]);
        let config = config_from_args(&args).unwrap();
        let scene = updated_scene(&args, &config);
        for (height, width) in [(0, 61), (25, 0), (0, 0)] {
            let grid = Grid { height, width, aspect_ratio: config.aspect_ratio() };
            assert_eq!(render(&scene, &config, &grid), "");
        }
    }

    #[test]
    fn test_render_color() {
        let plain_args = args(&[]);
        let plain_config = config_from_args(&plain_args).unwrap();
        let scene = updated_scene(&plain_args, &plain_config);
        let grid = grid_from_args(&plain_args, &plain_config).unwrap();
        let planets = scene.visible_planets(&grid);
        assert!(planets.iter().any(|(p, _)| p.id == PlanetId::Sun));

        let plain = render(&scene, &plain_config, &grid);
        assert_eq!(plain.lines().count(), 25);
        assert!(!plain.contains('\x1b'));

        let color_config = config_from_args(&args(&["--color"])).unwrap();
        assert!(color_config.color);
        let colored = render(&scene, &color_config, &grid);
        assert!(planets.iter().any(|(p, _)| colored.contains(planet_color(p.id))));
        assert!(colored.contains(ANSI_RESET));
        assert_eq!(colored.lines().count(), 25);
    }

    #[test]
    fn test_paint() {
        assert_eq!(paint("*", MOON_COLOR, false), "*");
        assert_eq!(paint("*", MOON_COLOR, true), "\x1b[97m*\x1b[0m");
    }
}  // mod tests.
