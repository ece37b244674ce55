// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

// Per-frame orchestration: computes the horizon position of every object for
// the clock's current instant and maps it onto the character grid.

use std::f64::consts::FRAC_PI_2;

use log::debug;

use skyterm_elements::catalog::{
    order_by_brightness, Constellation, Moon, ObjectBase, Planet, Star, StarTable};
use skyterm_elements::orbital::{moon_phase, moon_position, planet_position};
use skyterm_elements::sky_geometry::{
    angular_separation, equatorial_to_horizontal, horizontal_to_spherical,
    is_in_frame, polar_to_grid, project_stereographic_north};
use skyterm_elements::time_util::sidereal_time_radians;

use crate::sim_clock::SimulationClock;

/// Where the sky is observed from. Radians; longitude is positive east.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Observer {
    latitude: f64,
    longitude: f64,
}

impl Observer {
    /// `latitude` is clamped to -pi/2..pi/2.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Observer {
            latitude: latitude.clamp(-FRAC_PI_2, FRAC_PI_2),
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Character grid that the visible hemisphere is drawn onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub height: usize,
    pub width: usize,
    /// Cell height/width.
    pub aspect_ratio: f64,
}

/// Result of nearest_object().
#[derive(Clone, Debug, PartialEq)]
pub struct NearestObject {
    pub name: String,
    pub azimuth: f64,
    pub altitude: f64,
    /// Radians from the query point.
    pub separation: f64,
}

pub struct SkyScene {
    stars: StarTable,
    // Catalog numbers, brightest first.
    brightness_order: Vec<u32>,
    planets: Vec<Planet>,
    moon: Moon,
    constellations: Vec<Constellation>,
}

impl SkyScene {
    pub fn new(stars: StarTable,
               planets: Vec<Planet>,
               moon: Moon,
               constellations: Vec<Constellation>) -> Self {
        let brightness_order = order_by_brightness(stars.iter());
        SkyScene {
            stars,
            brightness_order,
            planets,
            moon,
            constellations,
        }
    }

    pub fn stars(&self) -> &StarTable {
        &self.stars
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn moon(&self) -> &Moon {
        &self.moon
    }

    pub fn constellations(&self) -> &[Constellation] {
        &self.constellations
    }

    pub fn update_star_positions(&mut self, julian_date: f64, observer: &Observer) {
        let gmst = sidereal_time_radians(julian_date);
        for star in self.stars.iter_mut() {
            let (alt, az) = equatorial_to_horizontal(
                star.declination, star.right_ascension, gmst,
                observer.latitude, observer.longitude);
            star.base.altitude = alt;
            star.base.azimuth = az;
        }
    }

    pub fn update_planet_positions(&mut self, julian_date: f64, observer: &Observer) {
        let gmst = sidereal_time_radians(julian_date);
        for planet in &mut self.planets {
            let Some(pos) = planet_position(planet.id, julian_date) else {
                continue;
            };
            let (alt, az) = equatorial_to_horizontal(
                pos.dec, pos.ra, gmst, observer.latitude, observer.longitude);
            planet.base.altitude = alt;
            planet.base.azimuth = az;
        }
    }

    /// Updates the Moon's position and phase.
    pub fn update_moon_position(&mut self, julian_date: f64, observer: &Observer) {
        let gmst = sidereal_time_radians(julian_date);
        let pos = moon_position(julian_date);
        let (alt, az) = equatorial_to_horizontal(
            pos.dec, pos.ra, gmst, observer.latitude, observer.longitude);
        self.moon.base.altitude = alt;
        self.moon.base.azimuth = az;
        self.moon.phase = moon_phase(julian_date, observer.latitude);
    }

    /// Brings every object to the clock's current instant.
    pub fn update(&mut self, clock: &SimulationClock, observer: &Observer) {
        let julian_date = clock.current_julian_date();
        self.update_star_positions(julian_date, observer);
        self.update_planet_positions(julian_date, observer);
        self.update_moon_position(julian_date, observer);
        debug!("Updated {} stars, {} planets for JD {:.5}",
               self.stars.len(), self.planets.len(), julian_date);
    }

    /// Current (azimuth, altitude) of a star.
    pub fn star_position(&self, catalog_number: u32) -> Option<(f64, f64)> {
        self.stars.get(catalog_number)
            .map(|s| (s.base.azimuth, s.base.altitude))
    }

    /// A figure is drawn only if every star it references exists and is at
    /// least as bright as `threshold`.
    pub fn constellation_drawable(&self, constellation: &Constellation,
                                  threshold: f64) -> bool {
        constellation.star_numbers().all(|n| {
            matches!(self.stars.get(n), Some(star) if star.magnitude <= threshold)
        })
    }

    /// Grid cell of the object, or None if it is below the horizon.
    pub fn project(base: &ObjectBase, grid: &Grid) -> Option<(usize, usize)> {
        let (theta, phi) = horizontal_to_spherical(base.azimuth, base.altitude);
        let (r, theta_polar) = project_stereographic_north(1.0, theta, phi);
        if !is_in_frame(r) {
            return None;
        }
        Some(polar_to_grid(r, theta_polar, grid.height, grid.width, grid.aspect_ratio))
    }

    /// Stars above the horizon and at least as bright as `threshold`, with
    /// their grid cells. Dim stars come first so that brighter ones are drawn
    /// over them.
    pub fn visible_stars(&self, threshold: f64, grid: &Grid)
                         -> Vec<(&Star, (usize, usize))> {
        self.brightness_order.iter().rev()
            .filter_map(|&n| self.stars.get(n))
            .filter(|star| star.magnitude <= threshold)
            .filter_map(|star| Self::project(&star.base, grid).map(|cell| (star, cell)))
            .collect()
    }

    pub fn visible_planets(&self, grid: &Grid) -> Vec<(&Planet, (usize, usize))> {
        self.planets.iter()
            .filter_map(|p| Self::project(&p.base, grid).map(|cell| (p, cell)))
            .collect()
    }

    /// Grid cell of the Moon, if it is up.
    pub fn visible_moon(&self, grid: &Grid) -> Option<(usize, usize)> {
        Self::project(&self.moon.base, grid)
    }

    /// End points of constellation segments to draw: both stars must be
    /// above the horizon and the figure drawable at `threshold`.
    pub fn constellation_segments(&self, threshold: f64, grid: &Grid)
                                  -> Vec<((usize, usize), (usize, usize))> {
        let mut segments = Vec::new();
        for constellation in &self.constellations {
            if !self.constellation_drawable(constellation, threshold) {
                continue;
            }
            for &(a, b) in &constellation.segments {
                let cell = |n| self.stars.get(n).and_then(|s| Self::project(&s.base, grid));
                if let (Some(start), Some(end)) = (cell(a), cell(b)) {
                    segments.push((start, end));
                }
            }
        }
        segments
    }

    /// The named object above the horizon closest to (azimuth, altitude).
    /// Stars without a label are reported by catalog number.
    pub fn nearest_object(&self, azimuth: f64, altitude: f64) -> Option<NearestObject> {
        let candidates = self.stars.iter()
            .map(|s| (s.base.label().map(str::to_string)
                      .unwrap_or_else(|| format!("HR {}", s.catalog_number)),
                      &s.base))
            .chain(self.planets.iter()
                   .map(|p| (p.id.name().to_string(), &p.base)))
            .chain(std::iter::once(("Moon".to_string(), &self.moon.base)));

        let mut nearest: Option<NearestObject> = None;
        for (name, base) in candidates {
            if base.altitude < 0.0 {
                continue;
            }
            let separation = angular_separation(
                azimuth, altitude, base.azimuth, base.altitude);
            if nearest.as_ref().map_or(true, |n| separation < n.separation) {
                nearest = Some(NearestObject {
                    name,
                    azimuth: base.azimuth,
                    altitude: base.altitude,
                    separation,
                });
            }
        }
        nearest
    }
}

// mod tests.
