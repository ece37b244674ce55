// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::collections::HashMap;

use canonical_error::{invalid_argument_error, CanonicalError};
use log::{info, warn};
use noisy_float::types::{n64, N64};

use crate::orbital::MoonPhase;
use crate::orbital_tables::PlanetId;

/// Brightest magnitude of the calibrated glyph range (Sirius).
pub const MIN_MAGNITUDE: f64 = -1.46;

/// Dimmest magnitude of the calibrated glyph range.
pub const MAX_MAGNITUDE: f64 = 7.96;

pub const GLYPH_BUCKETS: usize = 10;

/// One record of the binary star catalog, as delivered by the catalog parser.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CatalogEntry {
    /// 1-based, unique.
    pub catalog_number: u32,
    /// J2000, radians.
    pub right_ascension: f64,
    /// J2000, radians.
    pub declination: f64,
    /// Visual magnitude times 100.
    pub magnitude: i16,
    /// Radians per year.
    pub ra_motion: f64,
    pub dec_motion: f64,
}

/// Position and display identity common to everything drawn on the chart.
/// The display identity is fixed when the catalog is built; azimuth and
/// altitude are refreshed on every scene update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectBase {
    /// Radians, clockwise from north.
    pub azimuth: f64,
    /// Radians above the horizon.
    pub altitude: f64,

    symbol_ascii: char,
    symbol_unicode: Option<&'static str>,
    label: Option<String>,
}

impl ObjectBase {
    pub fn new(symbol_ascii: char,
               symbol_unicode: Option<&'static str>,
               label: Option<String>) -> Self {
        ObjectBase {
            azimuth: 0.0,
            altitude: 0.0,
            symbol_ascii,
            symbol_unicode,
            label,
        }
    }

    pub fn symbol_ascii(&self) -> char {
        self.symbol_ascii
    }

    pub fn symbol_unicode(&self) -> Option<&'static str> {
        self.symbol_unicode
    }

    /// The glyph to draw: the Unicode symbol when requested and available,
    /// otherwise the ASCII symbol.
    pub fn symbol(&self, unicode: bool) -> String {
        match self.symbol_unicode {
            Some(s) if unicode => s.to_string(),
            _ => self.symbol_ascii.to_string(),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    pub base: ObjectBase,
    pub catalog_number: u32,
    pub magnitude: f64,
    pub right_ascension: f64,
    pub declination: f64,
    // Carried for completeness; positions are computed at the catalog epoch.
    pub ra_motion: f64,
    pub dec_motion: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Planet {
    pub base: ObjectBase,
    pub id: PlanetId,
    pub magnitude: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Moon {
    pub base: ObjectBase,
    pub phase: MoonPhase,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constellation {
    pub abbreviation: String,
    /// Each segment joins two stars, by catalog number.
    pub segments: Vec<(u32, u32)>,
}

impl Constellation {
    /// Catalog numbers referenced by the figure, in segment order.
    pub fn star_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.segments.iter().flat_map(|&(a, b)| [a, b])
    }
}

/// Stars keyed by catalog number: slot n-1 holds catalog number n. Numbers
/// that the catalog skips leave an empty slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StarTable {
    stars: Vec<Option<Star>>,
}

impl StarTable {
    pub fn get(&self, catalog_number: u32) -> Option<&Star> {
        if catalog_number == 0 {
            return None;
        }
        self.stars.get(catalog_number as usize - 1).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, catalog_number: u32) -> Option<&mut Star> {
        if catalog_number == 0 {
            return None;
        }
        self.stars.get_mut(catalog_number as usize - 1).and_then(|s| s.as_mut())
    }

    /// Number of slots, including gaps.
    pub fn capacity(&self) -> usize {
        self.stars.len()
    }

    /// Number of stars present.
    pub fn len(&self) -> usize {
        self.stars.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.iter().all(|s| s.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Star> {
        self.stars.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Star> {
        self.stars.iter_mut().flatten()
    }

    fn insert(&mut self, star: Star) {
        let index = star.catalog_number as usize - 1;
        if index >= self.stars.len() {
            self.stars.resize(index + 1, None);
        }
        self.stars[index] = Some(star);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlyphSet {
    Ascii,
    #[default]
    UnicodeRound,
    UnicodeDiamond,
    UnicodeOpen,
    UnicodeFilled,
}

const ASCII_GLYPHS: [char; GLYPH_BUCKETS] =
    ['0', '0', 'O', 'O', 'o', 'o', '.', '.', '.', '.'];
const ROUND_GLYPHS: [&str; GLYPH_BUCKETS] =
    ["⬤", "●", "⦁", "•", "•", "∙", "⋅", "⋅", "⋅", "⋅"];
const DIAMOND_GLYPHS: [&str; GLYPH_BUCKETS] =
    ["⯁", "◇", "⬥", "⬦", "⬩", "🞘", "🞗", "🞗", "🞗", "🞗"];
const OPEN_GLYPHS: [&str; GLYPH_BUCKETS] =
    ["✩", "✧", "⋄", "⭒", "🞝", "🞝", "🞝", "🞝", "🞝", "🞝"];
const FILLED_GLYPHS: [&str; GLYPH_BUCKETS] =
    ["★", "✦", "⬩", "⭑", "🞝", "🞝", "🞝", "🞝", "🞝", "🞝"];

impl GlyphSet {
    fn unicode_table(self) -> Option<&'static [&'static str; GLYPH_BUCKETS]> {
        match self {
            GlyphSet::Ascii => None,
            GlyphSet::UnicodeRound => Some(&ROUND_GLYPHS),
            GlyphSet::UnicodeDiamond => Some(&DIAMOND_GLYPHS),
            GlyphSet::UnicodeOpen => Some(&OPEN_GLYPHS),
            GlyphSet::UnicodeFilled => Some(&FILLED_GLYPHS),
        }
    }
}

/// Maps visual magnitude onto discrete glyph buckets. Resolved once when the
/// catalog is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagnitudeScale {
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub bucket_count: usize,
    pub glyph_set: GlyphSet,
}

impl Default for MagnitudeScale {
    fn default() -> Self {
        MagnitudeScale {
            min_magnitude: MIN_MAGNITUDE,
            max_magnitude: MAX_MAGNITUDE,
            bucket_count: GLYPH_BUCKETS,
            glyph_set: GlyphSet::default(),
        }
    }
}

impl MagnitudeScale {
    pub fn with_glyph_set(glyph_set: GlyphSet) -> Self {
        MagnitudeScale { glyph_set, ..Default::default() }
    }

    /// Bucket for `magnitude`, 0 being the brightest. Magnitudes outside the
    /// calibrated range land in the first or last bucket.
    pub fn symbol_index(&self, magnitude: f64) -> usize {
        if self.bucket_count < 2 || magnitude.is_nan() {
            return 0;
        }
        let last = (self.bucket_count - 1) as f64;
        let span = self.max_magnitude - self.min_magnitude;
        if span <= 0.0 {
            return 0;
        }
        let index = (last * (magnitude - self.min_magnitude) / span).round();
        index.clamp(0.0, last) as usize
    }

    fn glyph_index(&self, magnitude: f64) -> usize {
        self.symbol_index(magnitude).min(GLYPH_BUCKETS - 1)
    }

    pub fn ascii_symbol(&self, magnitude: f64) -> char {
        ASCII_GLYPHS[self.glyph_index(magnitude)]
    }

    pub fn unicode_symbol(&self, magnitude: f64) -> Option<&'static str> {
        self.glyph_set.unicode_table().map(|t| t[self.glyph_index(magnitude)])
    }
}

/// Glyph bucket 0..=9 for `magnitude` on the default calibration.
pub fn magnitude_to_symbol_index(magnitude: f64) -> usize {
    MagnitudeScale::default().symbol_index(magnitude)
}

/// Catalog numbers sorted from brightest to dimmest. Equal magnitudes keep
/// their input order; draw in reverse to put bright stars on top.
pub fn order_by_brightness<'a, I>(stars: I) -> Vec<u32>
where I: IntoIterator<Item = &'a Star>
{
    let mut keyed: Vec<(N64, u32)> = stars.into_iter()
        .filter(|s| !s.magnitude.is_nan())
        .map(|s| (n64(s.magnitude), s.catalog_number))
        .collect();
    keyed.sort_by_key(|k| k.0);
    keyed.into_iter().map(|k| k.1).collect()
}

/// Builds the star table from raw catalog entries. Entries with catalog
/// number 0 are skipped. `names` supplies labels, keyed by catalog number.
pub fn build_star_table(entries: &[CatalogEntry],
                        names: &HashMap<u32, String>,
                        scale: &MagnitudeScale) -> StarTable {
    let mut table = StarTable::default();
    for entry in entries {
        if entry.catalog_number == 0 {
            warn!("Skipping catalog entry with catalog number 0");
            continue;
        }
        let magnitude = entry.magnitude as f64 / 100.0;
        let base = ObjectBase::new(
            scale.ascii_symbol(magnitude),
            scale.unicode_symbol(magnitude),
            names.get(&entry.catalog_number).cloned());
        table.insert(Star {
            base,
            catalog_number: entry.catalog_number,
            magnitude,
            right_ascension: entry.right_ascension,
            declination: entry.declination,
            ra_motion: entry.ra_motion,
            dec_motion: entry.dec_motion,
        });
    }
    info!("Built star table with {} stars in {} slots",
          table.len(), table.capacity());
    table
}

/// Parses a name table of `catalog_number,name` lines. Blank lines are
/// ignored.
pub fn parse_name_table(text: &str) -> Result<HashMap<u32, String>, CanonicalError> {
    let mut names = HashMap::new();
    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((number, name)) = line.split_once(',') else {
            return Err(invalid_argument_error(
                format!("Name table line {}: expected <catalog_number,name>, got '{}'",
                        line_number + 1, line).as_str()));
        };
        let catalog_number = parse_catalog_number(number.trim(), line_number)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid_argument_error(
                format!("Name table line {}: empty name", line_number + 1).as_str()));
        }
        names.insert(catalog_number, name.to_string());
    }
    Ok(names)
}

/// Parses constellation figures, one per line: `ABBR n s1 s2 ... s2n`, where
/// n is the number of segments and each consecutive pair of star numbers is a
/// segment.
pub fn parse_constellation_table(text: &str)
                                 -> Result<Vec<Constellation>, CanonicalError> {
    let mut constellations = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let Some(abbreviation) = tokens.next() else {
            continue;  // Blank.
        };
        let num_segments: usize = match tokens.next().map(|t| t.parse()) {
            Some(Ok(n)) if n > 0 => n,
            _ => {
                return Err(invalid_argument_error(
                    format!("Constellation table line {}: missing or invalid \
                             segment count", line_number + 1).as_str()));
            }
        };
        let numbers = tokens
            .map(|t| parse_catalog_number(t, line_number))
            .collect::<Result<Vec<u32>, CanonicalError>>()?;
        if numbers.len() != 2 * num_segments {
            return Err(invalid_argument_error(
                format!("Constellation table line {}: {} expects {} star numbers, got {}",
                        line_number + 1, abbreviation, 2 * num_segments,
                        numbers.len()).as_str()));
        }
        constellations.push(Constellation {
            abbreviation: abbreviation.to_string(),
            segments: numbers.chunks_exact(2).map(|p| (p[0], p[1])).collect(),
        });
    }
    Ok(constellations)
}

fn parse_catalog_number(token: &str, line_number: usize) -> Result<u32, CanonicalError> {
    match token.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid_argument_error(
            format!("Line {}: invalid catalog number '{}'",
                    line_number + 1, token).as_str())),
    }
}

/// Keeps labels only on stars strictly brighter than `label_threshold`.
/// Labels are taken from `names`; stars without a name get none.
pub fn set_star_labels(table: &mut StarTable,
                       names: &HashMap<u32, String>,
                       label_threshold: f64) {
    let mut labelled = 0;
    for star in table.iter_mut() {
        star.base.label = if star.magnitude < label_threshold {
            names.get(&star.catalog_number).cloned()
        } else {
            None
        };
        if star.base.label.is_some() {
            labelled += 1;
        }
    }
    info!("Labelled {} stars brighter than magnitude {}", labelled, label_threshold);
}

fn planet_symbol_unicode(id: PlanetId) -> &'static str {
    match id {
        PlanetId::Sun => "☉",
        PlanetId::Mercury => "☿",
        PlanetId::Venus => "♀",
        PlanetId::Earth => "🜨",
        PlanetId::Mars => "♂",
        PlanetId::Jupiter => "♃",
        PlanetId::Saturn => "♄",
        PlanetId::Uranus => "⛢",
        PlanetId::Neptune => "♆",
    }
}

/// The Sun and planets drawn on the chart, in `PlanetId` order. Earth is
/// omitted.
pub fn build_planet_table(scale: &MagnitudeScale) -> Vec<Planet> {
    let unicode = scale.glyph_set != GlyphSet::Ascii;
    PlanetId::ALL.iter()
        .filter(|id| id.is_sky_object())
        .map(|&id| {
            let ascii = if id == PlanetId::Sun { '@' } else { '*' };
            Planet {
                base: ObjectBase::new(ascii,
                                      unicode.then(|| planet_symbol_unicode(id)),
                                      Some(id.name().to_string())),
                id,
                magnitude: id.mean_magnitude(),
            }
        })
        .collect()
}

pub fn build_moon() -> Moon {
    Moon {
        base: ObjectBase::new('M', Some("🌝"), Some("Moon".to_string())),
        phase: MoonPhase::default(),
    }
}

// mod tests.
