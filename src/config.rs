// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::{invalid_argument_error, CanonicalError};
use chrono::{DateTime, Utc};

use skyterm_elements::catalog::{GlyphSet, MagnitudeScale};
use skyterm_elements::sky_geometry::DEFAULT_CELL_ASPECT_RATIO;
use skyterm_elements::time_util::{current_julian_date, julian_date};

use crate::sky_scene::Observer;

/// Run-time settings for the star chart. Angles are in degrees here; the
/// scene works in radians (see to_observer()).
#[derive(Clone, Debug, PartialEq)]
pub struct SkyConfig {
    pub latitude: f64,
    /// Positive east of Greenwich.
    pub longitude: f64,
    /// Start of the simulation; None means now.
    pub datetime: Option<DateTime<Utc>>,
    /// Stars dimmer than this magnitude are not drawn.
    pub threshold: f64,
    /// Stars brighter than this magnitude are labelled.
    pub label_threshold: f64,
    pub fps: u32,
    /// Simulated seconds per real second.
    pub speed: f64,
    /// Cell height/width; None uses DEFAULT_CELL_ASPECT_RATIO.
    pub aspect_ratio: Option<f64>,
    pub glyph_set: GlyphSet,
    pub color: bool,
    pub grid: bool,
    pub constellations: bool,
    pub metadata: bool,
}

impl Default for SkyConfig {
    fn default() -> Self {
        // Boston, MA.
        SkyConfig {
            latitude: 42.361145,
            longitude: -71.057083,
            datetime: None,
            threshold: 3.0,
            label_threshold: 0.5,
            fps: 24,
            speed: 1.0,
            aspect_ratio: None,
            glyph_set: GlyphSet::UnicodeRound,
            color: false,
            grid: false,
            constellations: false,
            metadata: false,
        }
    }
}

impl SkyConfig {
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid_argument_error(
                format!("Latitude {} is outside [-90, 90]", self.latitude).as_str()));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid_argument_error(
                format!("Longitude {} is outside [-180, 180]", self.longitude).as_str()));
        }
        if self.fps < 1 {
            return Err(invalid_argument_error("Frames per second must be at least 1"));
        }
        if !self.speed.is_finite() {
            return Err(invalid_argument_error(
                format!("Invalid speed {}", self.speed).as_str()));
        }
        if let Some(aspect) = self.aspect_ratio {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(invalid_argument_error(
                    format!("Aspect ratio {} must be positive", aspect).as_str()));
            }
        }
        Ok(())
    }

    pub fn to_observer(&self) -> Observer {
        Observer::new(self.latitude.to_radians(), self.longitude.to_radians())
    }

    pub fn frame_seconds(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio.unwrap_or(DEFAULT_CELL_ASPECT_RATIO)
    }

    pub fn unicode(&self) -> bool {
        self.glyph_set != GlyphSet::Ascii
    }

    pub fn magnitude_scale(&self) -> MagnitudeScale {
        MagnitudeScale::with_glyph_set(self.glyph_set)
    }

    /// Julian date the simulation starts at.
    pub fn start_julian_date(&self) -> f64 {
        match &self.datetime {
            Some(dt) => julian_date(dt),
            None => current_julian_date(),
        }
    }
}

/// Parses a glyph set name: ascii, round, diamond, open or filled.
pub fn parse_glyph_set(name: &str) -> Result<GlyphSet, CanonicalError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ascii" => Ok(GlyphSet::Ascii),
        "round" => Ok(GlyphSet::UnicodeRound),
        "diamond" => Ok(GlyphSet::UnicodeDiamond),
        "open" => Ok(GlyphSet::UnicodeOpen),
        "filled" => Ok(GlyphSet::UnicodeFilled),
        _ => Err(invalid_argument_error(
            format!("Unknown glyph set '{}'; expected one of \
                     ascii|round|diamond|open|filled", name).as_str())),
    }
}

// mod tests.
