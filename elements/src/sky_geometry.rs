// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::f64::consts::{FRAC_PI_2, PI};

use astro::{
    angle::{anglr_sepr, limit_to_two_PI},
    coords::{alt_frm_eq, az_frm_eq, hr_angl_frm_hz},
};

/// Typical terminal cell height/width ratio. Callers may override it when the
/// projection does not come out round.
pub const DEFAULT_CELL_ASPECT_RATIO: f64 = 2.0;

/// Returns (alt, az) in radians. Returned azimuth is clockwise from north
/// (north = 0, east = pi/2), in 0..2pi.
/// dec: declination in radians.
/// ra: right ascension in radians.
/// gmst: Greenwich mean sidereal time in radians.
/// lat: observer latitude in radians; clamped to -pi/2..pi/2.
/// long: observer longitude in radians, positive east of Greenwich.
pub fn equatorial_to_horizontal(
    dec: f64,
    ra: f64,
    gmst: f64,
    lat: f64,
    long: f64,
) -> (/* alt */ f64, /* az */ f64) {
    let lat = lat.clamp(-FRAC_PI_2, FRAC_PI_2);

    // Local hour angle. With east-positive longitude the local sidereal time
    // is gmst + long.
    let hour_angle = gmst + long - ra;

    // Meeus measures azimuth westward from south.
    let meeus_az = az_frm_eq(hour_angle, dec, lat);
    let az = limit_to_two_PI(meeus_az + PI);

    (alt_frm_eq(hour_angle, dec, lat), az)
}

/// Returns (ra, dec) in radians; ra is in 0..2pi.
/// alt: elevation in radians.
/// az: radians, clockwise from north.
/// gmst: Greenwich mean sidereal time in radians.
/// lat: observer latitude in radians.
/// long: observer longitude in radians, positive east.
pub fn horizontal_to_equatorial(
    alt: f64,
    az: f64,
    gmst: f64,
    lat: f64,
    long: f64,
) -> (/* ra */ f64, /* dec */ f64) {
    let lat = lat.clamp(-FRAC_PI_2, FRAC_PI_2);
    let meeus_az = limit_to_two_PI(az - PI);

    // astro::coords::dec_frm_hz() is incorrect.
    let dec =
        (lat.sin() * alt.sin() - lat.cos() * alt.cos() * meeus_az.cos()).asin();
    let hour_angle = hr_angl_frm_hz(meeus_az, alt, lat);
    let ra = limit_to_two_PI(gmst + long - hour_angle);

    (ra, dec)
}

/// Re-expresses horizon coordinates as (theta, phi) on the unit sphere with
/// the zenith as the pole: theta is the colatitude from the zenith, phi is
/// the azimuth.
pub fn horizontal_to_spherical(az: f64, alt: f64) -> (/* theta */ f64, /* phi */ f64) {
    (FRAC_PI_2 - alt, az)
}

/// Stereographic projection of a point on a sphere of the given radius,
/// projected from the nadir onto the plane tangent at the zenith, scaled so
/// that the horizon lands on the circle of radius `radius`.
/// Returns polar coordinates (r, theta) on the plane. The zenith maps to
/// r = 0. Points below the horizon have |r| > 1 (for a unit sphere) and must
/// not be drawn; see is_in_frame().
pub fn project_stereographic_north(
    radius: f64,
    theta_sphere: f64,
    phi_sphere: f64,
) -> (/* r */ f64, /* theta */ f64) {
    (radius * (theta_sphere / 2.0).tan(), phi_sphere)
}

/// Inverse of project_stereographic_north() on the unit sphere. Returns
/// (alt, az) in radians, az in 0..2pi.
pub fn unproject_stereographic_north(
    r_polar: f64,
    theta_polar: f64,
) -> (/* alt */ f64, /* az */ f64) {
    let theta_sphere = 2.0 * r_polar.atan();
    (FRAC_PI_2 - theta_sphere, limit_to_two_PI(theta_polar))
}

/// Whether a projected radius lies on the visible disc (at or above the
/// horizon).
pub fn is_in_frame(r_polar: f64) -> bool {
    r_polar.abs() <= 1.0
}

// Layout of the unit disc on a character grid.
struct GridDisc {
    center_row: f64,
    center_col: f64,
    row_radius: f64,
    col_radius: f64,
}

impl GridDisc {
    fn new(height: usize, width: usize, aspect_ratio: f64) -> Self {
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            DEFAULT_CELL_ASPECT_RATIO
        };
        let half_height = (height.max(1) - 1) as f64 / 2.0;
        let half_width = (width.max(1) - 1) as f64 / 2.0;

        // Cells are `aspect` times taller than they are wide, so a circle
        // spans `aspect` times as many columns as rows.
        let row_radius = half_height.min(half_width / aspect);
        GridDisc {
            center_row: half_height,
            center_col: half_width,
            row_radius,
            col_radius: row_radius * aspect,
        }
    }
}

/// Maps polar coordinates on the unit disc to a (row, col) cell of a
/// `height` x `width` character grid. North (theta = 0) is at the top and
/// east (theta = pi/2) on the left, as seen when looking up at the sky.
/// `aspect_ratio` is the cell height/width ratio; non-positive values fall
/// back to DEFAULT_CELL_ASPECT_RATIO. The result is clamped into the grid.
pub fn polar_to_grid(
    r_polar: f64,
    theta_polar: f64,
    height: usize,
    width: usize,
    aspect_ratio: f64,
) -> (/* row */ usize, /* col */ usize) {
    if height == 0 || width == 0 {
        return (0, 0);
    }
    let disc = GridDisc::new(height, width, aspect_ratio);
    let north = r_polar * theta_polar.cos();
    let east = r_polar * theta_polar.sin();

    let row = (disc.center_row - north * disc.row_radius).round();
    let col = (disc.center_col - east * disc.col_radius).round();

    (
        row.clamp(0.0, (height - 1) as f64) as usize,
        col.clamp(0.0, (width - 1) as f64) as usize,
    )
}

/// Inverse of polar_to_grid(): the polar coordinates (r, theta) at the
/// center of the given grid cell.
pub fn grid_to_polar(
    row: usize,
    col: usize,
    height: usize,
    width: usize,
    aspect_ratio: f64,
) -> (/* r */ f64, /* theta */ f64) {
    let disc = GridDisc::new(height, width, aspect_ratio);
    if disc.row_radius <= 0.0 {
        return (0.0, 0.0);
    }
    let north = (disc.center_row - row as f64) / disc.row_radius;
    let east = (disc.center_col - col as f64) / disc.col_radius;
    (north.hypot(east), limit_to_two_PI(east.atan2(north)))
}

/// Grid cells of the N, E, S, W points of the horizon.
pub fn cardinal_grid_positions(
    height: usize,
    width: usize,
    aspect_ratio: f64,
) -> [(&'static str, usize, usize); 4] {
    let place = |label, az: f64| {
        let (row, col) = polar_to_grid(1.0, az, height, width, aspect_ratio);
        (label, row, col)
    };
    [
        place("N", 0.0),
        place("E", FRAC_PI_2),
        place("S", PI),
        place("W", 3.0 * FRAC_PI_2),
    ]
}

/// Returns the separation, in radians, between two points given as
/// (longitude-like, latitude-like) pairs in radians. Works for both (ra, dec)
/// and (az, alt).
pub fn angular_separation(p0_lon: f64, p0_lat: f64, p1_lon: f64, p1_lat: f64) -> f64 {
    anglr_sepr(p0_lon, p0_lat, p1_lon, p1_lat)
}

// mod tests.
