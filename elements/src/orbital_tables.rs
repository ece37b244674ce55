// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

// Process-wide orbital element tables. Nothing here is ever mutated; planet
// entities refer to these tables through a PlanetId.

use crate::orbital::{KeplerElements, KeplerExtras, KeplerRates};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanetId {
    Sun,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl PlanetId {
    pub const ALL: [PlanetId; 9] = [
        PlanetId::Sun,
        PlanetId::Mercury,
        PlanetId::Venus,
        PlanetId::Earth,
        PlanetId::Mars,
        PlanetId::Jupiter,
        PlanetId::Saturn,
        PlanetId::Uranus,
        PlanetId::Neptune,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlanetId::Sun => "Sun",
            PlanetId::Mercury => "Mercury",
            PlanetId::Venus => "Venus",
            PlanetId::Earth => "Earth",
            PlanetId::Mars => "Mars",
            PlanetId::Jupiter => "Jupiter",
            PlanetId::Saturn => "Saturn",
            PlanetId::Uranus => "Uranus",
            PlanetId::Neptune => "Neptune",
        }
    }

    // Row in the heliocentric tables. The Sun has no orbit of its own.
    fn table_index(self) -> Option<usize> {
        match self {
            PlanetId::Sun => None,
            PlanetId::Mercury => Some(0),
            PlanetId::Venus => Some(1),
            PlanetId::Earth => Some(2),
            PlanetId::Mars => Some(3),
            PlanetId::Jupiter => Some(4),
            PlanetId::Saturn => Some(5),
            PlanetId::Uranus => Some(6),
            PlanetId::Neptune => Some(7),
        }
    }

    /// Heliocentric elements at J2000.0; None for the Sun.
    pub fn elements(self) -> Option<&'static KeplerElements> {
        self.table_index().map(|i| &PLANET_ELEMENTS[i])
    }

    /// Element rates per Julian century; None for the Sun.
    pub fn rates(self) -> Option<&'static KeplerRates> {
        self.table_index().map(|i| &PLANET_RATES[i])
    }

    /// Mean anomaly corrections; only Jupiter through Neptune have them.
    pub fn extras(self) -> Option<&'static KeplerExtras> {
        self.table_index().and_then(|i| PLANET_EXTRAS[i].as_ref())
    }

    /// Whether this body is drawn on the sky. Earth is only used as the
    /// observing platform.
    pub fn is_sky_object(self) -> bool {
        self != PlanetId::Earth
    }

    /// Mean apparent visual magnitude.
    pub fn mean_magnitude(self) -> f64 {
        match self {
            PlanetId::Sun => -26.832,
            PlanetId::Mercury => 0.23,
            PlanetId::Venus => -4.14,
            PlanetId::Earth => 0.0,
            PlanetId::Mars => 0.71,
            PlanetId::Jupiter => -2.20,
            PlanetId::Saturn => 0.46,
            PlanetId::Uranus => 5.68,
            PlanetId::Neptune => 7.78,
        }
    }
}

const fn elements(a: f64, e: f64, i: f64, m: f64, w: f64, o: f64) -> KeplerElements {
    KeplerElements {
        semi_major_axis: a,
        eccentricity: e,
        inclination: i,
        mean_anomaly: m,
        arg_perihelion: w,
        ascending_node: o,
    }
}

const fn rates(a: f64, e: f64, i: f64, m: f64, w: f64, o: f64) -> KeplerRates {
    KeplerRates {
        semi_major_axis: a,
        eccentricity: e,
        inclination: i,
        mean_anomaly: m,
        arg_perihelion: w,
        ascending_node: o,
    }
}

const fn extras(b: f64, c: f64, s: f64, f: f64) -> Option<KeplerExtras> {
    Some(KeplerExtras { b, c, s, f })
}

// JPL "Approximate Positions of the Planets", table 2a (3000 BC to 3000 AD),
// restated with mean anomaly and argument of perihelion in place of mean
// longitude and longitude of perihelion. AU and degrees.
static PLANET_ELEMENTS: [KeplerElements; 8] = [
    elements(0.38709843, 0.20563661, 7.00559432, 174.79394829, 29.11810076, 48.33961819),
    elements(0.72332102, 0.00676399, 3.39777545, 50.21215137, 55.09494217, 76.67261496),
    elements(1.00000018, 0.01673163, -0.00054346, -2.46314313, 108.04266274, -5.11260389),
    elements(1.52371243, 0.09336511, 1.85181869, 19.34931620, -73.63065768, 49.71320984),
    elements(5.20248019, 0.04853590, 1.29861416, 20.05983908, -86.01787410, 100.29282654),
    elements(9.54149883, 0.05550825, 2.49424102, -42.78564734, -20.77862639, 113.63998702),
    elements(19.18797948, 0.04685740, 0.77298127, 141.76872184, 98.47154226, 73.96250215),
    elements(30.06952752, 0.00895439, 1.77005520, 257.54130563, -85.10477129, 131.78635853),
];

// Per Julian century.
static PLANET_RATES: [KeplerRates; 8] = [
    rates(0.00000000, 0.00002123, -0.00590158, 149472.51546610, 0.28154195, -0.12214182),
    rates(-0.00000026, -0.00005107, 0.00043494, 58517.75880612, 0.32953822, -0.27274174),
    rates(-0.00000003, -0.00003661, -0.01337178, 35999.05511069, 0.55919116, -0.24123856),
    rates(0.00000097, 0.00009149, -0.00724757, 19139.84710618, 0.72076056, -0.26852431),
    rates(-0.00002864, 0.00018026, -0.00322699, 3034.72172561, 0.05174577, 0.13024619),
    rates(-0.00003065, -0.00032044, 0.00451969, 1221.57315246, 0.79194480, -0.25015002),
    rates(-0.00020455, -0.00001550, -0.00180155, 428.40245610, 0.03527286, 0.05739699),
    rates(0.00006447, 0.00000818, 0.00022400, 218.45505376, 0.01616240, -0.00606302),
];

static PLANET_EXTRAS: [Option<KeplerExtras>; 8] = [
    None,
    None,
    None,
    None,
    extras(-0.00012452, 0.06064060, -0.35635438, 38.35125000),
    extras(0.00025899, -0.13434469, 0.87320147, 38.35125000),
    extras(0.00058331, -0.97731848, 0.17689245, 7.67025000),
    extras(-0.00041348, 0.68346318, -0.10162547, 7.67025000),
];

/// Geocentric lunar elements (Earth radii, degrees) at 2000 Jan 0.0 UT, from
/// Paul Schlyter's "How to compute planetary positions".
pub static MOON_ELEMENTS: KeplerElements =
    KeplerElements {
        semi_major_axis: 60.2666,
        eccentricity: 0.054900,
        inclination: 5.1454,
        mean_anomaly: 115.3654,
        arg_perihelion: 318.0634,
        ascending_node: 125.1228,
    };

/// Lunar element rates per day.
pub static MOON_RATES: KeplerRates =
    KeplerRates {
        semi_major_axis: 0.0,
        eccentricity: 0.0,
        inclination: 0.0,
        mean_anomaly: 13.0649929509,
        arg_perihelion: 0.1643573223,
        ascending_node: -0.0529538083,
    };

// mod tests.
