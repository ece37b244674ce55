// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::f64::consts::PI;

use astro::{
    angle::limit_to_two_PI,
    time::{julian_day, mn_sidr, CalType, Date},
};
use canonical_error::{invalid_argument_error, CanonicalError};
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};

/// Julian date of the J2000.0 epoch (2000-01-01T12:00:00).
pub const J2000: f64 = 2451545.0;

pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

pub const SECONDS_PER_DAY: f64 = 86400.0;

// Origin of the day count used by the lunar elements: 2000 Jan 0.0 UT.
const LUNAR_DAY_ZERO: f64 = 2451543.5;

/// Julian date for a proleptic Gregorian calendar date. `decimal_day` carries
/// the time of day as a fraction (e.g. 1.5 is noon on the first). Years
/// outside the i16 range are extrapolated on the same calendar.
pub fn julian_date_from_calendar(year: i32, month: u32, decimal_day: f64) -> f64 {
    match (i16::try_from(year), u8::try_from(month)) {
        (Ok(year), Ok(month)) => julian_day(&Date {
            year,
            month,
            decimal_day,
            cal_type: CalType::Gregorian,
        }),
        _ => extended_julian_date(year as f64, month as f64, decimal_day),
    }
}

// Meeus ch. 7 with floor(), for dates astro::time::Date cannot hold.
fn extended_julian_date(year: f64, month: f64, decimal_day: f64) -> f64 {
    let (year, month) = if month <= 2.0 { (year - 1.0, month + 12.0) }
                        else { (year, month) };
    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor()
        + decimal_day + b - 1524.5
}

/// Julian date of the given UTC instant.
pub fn julian_date(dt: &DateTime<Utc>) -> f64 {
    let seconds = dt.time().num_seconds_from_midnight() as f64
        + dt.time().nanosecond() as f64 * 1.0e-9;
    julian_date_from_calendar(dt.year(), dt.month(),
                              dt.day() as f64 + seconds / SECONDS_PER_DAY)
}

/// Julian date of the current wall clock time.
pub fn current_julian_date() -> f64 {
    julian_date(&Utc::now())
}

/// Returns (year, month, day) of the proleptic Gregorian date containing
/// `julian_date`. Inverse of julian_date_from_calendar() to within the day.
pub fn gregorian(julian_date: f64) -> (i32, u32, u32) {
    // Meeus, Astronomical Algorithms ch. 7, with the Gregorian correction
    // applied unconditionally and floor() in place of truncation so that dates
    // before 1582 stay on the proleptic calendar.
    let jd = julian_date + 0.5;
    let z = jd.floor();
    let f = jd - z;
    let alpha = ((z - 1867216.25) / 36524.25).floor();
    let a = z + 1.0 + alpha - (alpha / 4.0).floor();
    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();

    let day = (b - d - (30.6001 * e).floor() + f).floor();
    let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
    let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

    (year as i32, month as u32, day as u32)
}

/// Julian centuries elapsed since J2000.0.
pub fn centuries_since_epoch(julian_date: f64) -> f64 {
    (julian_date - J2000) / DAYS_PER_JULIAN_CENTURY
}

/// Days elapsed since 2000 Jan 0.0 UT; the time argument of the lunar
/// elements.
pub fn days_since_epoch(julian_date: f64) -> f64 {
    julian_date - LUNAR_DAY_ZERO
}

/// Greenwich mean sidereal time in radians, in [0, 2pi).
pub fn sidereal_time_radians(julian_date: f64) -> f64 {
    // mn_sidr() evaluates the IAU 1982 polynomial in centuries since J2000.
    let gmst = limit_to_two_PI(mn_sidr(julian_date));
    if !(0.0..2.0 * PI).contains(&gmst) {
        // Rounding can land exactly on 2pi.
        return 0.0;
    }
    gmst
}

/// Parses a UTC datetime of the form yyyy-mm-ddThh:mm:ss.
pub fn parse_datetime(text: &str) -> Result<DateTime<Utc>, CanonicalError> {
    match NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%dT%H:%M:%S") {
        Ok(naive) => Ok(Utc.from_utc_datetime(&naive)),
        Err(e) => Err(invalid_argument_error(
            format!("Unable to parse datetime '{}' ({}); datetimes must be \
                     in form <yyyy-mm-ddThh:mm:ss>", text, e).as_str())),
    }
}

/// A span of simulated time broken down for display.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElapsedTime {
    pub negative: bool,
    pub years: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

/// Splits `elapsed_days` into years (of 365.25 days), days, hours, minutes
/// and whole seconds.
pub fn elapsed_components(elapsed_days: f64) -> ElapsedTime {
    const SECONDS_PER_YEAR: i64 = 31_557_600;
    let mut remaining = (elapsed_days.abs() * SECONDS_PER_DAY).round() as i64;

    let years = remaining / SECONDS_PER_YEAR;
    remaining %= SECONDS_PER_YEAR;
    let days = remaining / 86400;
    remaining %= 86400;
    let hours = remaining / 3600;
    remaining %= 3600;

    ElapsedTime {
        negative: elapsed_days < 0.0,
        years,
        days,
        hours,
        minutes: remaining / 60,
        seconds: remaining % 60,
    }
}

/// Western (tropical) zodiac sign for a calendar day.
pub fn zodiac_sign(month: u32, day: u32) -> &'static str {
    // Each entry is the sign in effect from the given day of its month until
    // the next entry's start.
    const STARTS: [(u32, u32, &str); 12] = [
        (1, 20, "Aquarius"),
        (2, 19, "Pisces"),
        (3, 21, "Aries"),
        (4, 20, "Taurus"),
        (5, 21, "Gemini"),
        (6, 21, "Cancer"),
        (7, 23, "Leo"),
        (8, 23, "Virgo"),
        (9, 23, "Libra"),
        (10, 23, "Scorpio"),
        (11, 22, "Sagittarius"),
        (12, 22, "Capricorn"),
    ];
    let mut sign = "Capricorn";
    for (start_month, start_day, name) in STARTS {
        if (month, day) >= (start_month, start_day) {
            sign = name;
        }
    }
    sign
}

#[cfg(test)]
mod tests {
    extern crate approx;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn test_j2000_is_exact() {
        let dt = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(julian_date(&dt), 2451545.0);
        assert_eq!(julian_date_from_calendar(2000, 1, 1.5), J2000);
    }

    #[test]
    fn test_known_julian_dates() {
        // Meeus example 7.a and 7.b.
        assert_abs_diff_eq!(julian_date_from_calendar(1957, 10, 4.81),
                            2436116.31, epsilon = 1e-6);
        assert_abs_diff_eq!(julian_date_from_calendar(1987, 1, 27.0),
                            2446822.5, epsilon = 1e-9);
        let dt = Utc.with_ymd_and_hms(2024, 3, 8, 7, 56, 0).unwrap();
        assert_abs_diff_eq!(julian_date(&dt), 2460377.830556, epsilon = 1e-5);
    }

    #[test]
    fn test_gregorian_round_trip() {
        let mut date = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        while date <= last {
            let expected = (date.year(), date.month(), date.day());
            for fraction in [0.0, 0.5, 0.999] {
                let jd = julian_date_from_calendar(
                    date.year(), date.month(), date.day() as f64 + fraction);
                assert_eq!(gregorian(jd), expected, "jd {}", jd);
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
    }

    #[test]
    fn test_far_future_years() {
        assert_eq!(extended_julian_date(2000.0, 1.0, 1.5), J2000);
        assert_eq!(extended_julian_date(1987.0, 1.0, 27.0),
                   julian_date_from_calendar(1987, 1, 27.0));
        // 20000 Gregorian years across the i16 limit.
        assert_eq!(julian_date_from_calendar(40000, 3, 1.0)
                   - julian_date_from_calendar(20000, 3, 1.0),
                   20000.0 * 365.2425);
        assert_eq!(gregorian(julian_date_from_calendar(40000, 7, 4.25)),
                   (40000, 7, 4));
        assert_eq!(gregorian(julian_date_from_calendar(-40000, 7, 4.25)),
                   (-40000, 7, 4));
    }

    #[test]
    fn test_gregorian_known() {
        assert_eq!(gregorian(J2000), (2000, 1, 1));
        assert_eq!(gregorian(2436116.31), (1957, 10, 4));
        // Leap day, and the day after a century non-leap February.
        assert_eq!(gregorian(julian_date_from_calendar(2024, 2, 29.25)),
                   (2024, 2, 29));
        assert_eq!(gregorian(julian_date_from_calendar(1900, 3, 1.0)),
                   (1900, 3, 1));
    }

    #[test]
    fn test_sidereal_time() {
        // GMST at J2000.0 is 18h41m50.548s.
        assert_abs_diff_eq!(sidereal_time_radians(J2000),
                            280.46061837_f64.to_radians(), epsilon = 1e-9);
        // Meeus example 12.a: 1987 April 10, 0h UT.
        assert_abs_diff_eq!(sidereal_time_radians(2446895.5),
                            197.693195_f64.to_radians(), epsilon = 1e-6);
    }

    #[test]
    fn test_sidereal_time_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..10000 {
            let jd = rng.gen_range(-5.0e6..1.0e8);
            let gmst = sidereal_time_radians(jd);
            assert!((0.0..2.0 * PI).contains(&gmst), "jd {} gmst {}", jd, gmst);
        }
        for jd in [-1.0e7, -0.5, 0.0, 1.0e9] {
            let gmst = sidereal_time_radians(jd);
            assert!((0.0..2.0 * PI).contains(&gmst));
        }
    }

    #[test]
    fn test_centuries_and_days() {
        assert_eq!(centuries_since_epoch(J2000), 0.0);
        assert_eq!(centuries_since_epoch(J2000 + 36525.0), 1.0);
        assert_eq!(days_since_epoch(J2000), 1.5);
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse_datetime("2000-01-01T12:00:00").unwrap();
        assert_eq!(julian_date(&dt), J2000);
        assert!(parse_datetime("2000-01-01 12:00").is_err());
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_elapsed_components() {
        let elapsed = elapsed_components(366.25 + 1.0 / 24.0 + 61.0 / 86400.0);
        assert_eq!(elapsed, ElapsedTime {
            negative: false, years: 1, days: 1, hours: 1, minutes: 1, seconds: 1,
        });
        let back = elapsed_components(-0.5);
        assert!(back.negative);
        assert_eq!(back.hours, 12);
        assert_eq!(elapsed_components(0.0), ElapsedTime::default());
    }

    #[test]
    fn test_zodiac_sign() {
        assert_eq!(zodiac_sign(1, 1), "Capricorn");
        assert_eq!(zodiac_sign(1, 20), "Aquarius");
        assert_eq!(zodiac_sign(3, 21), "Aries");
        assert_eq!(zodiac_sign(8, 22), "Leo");
        assert_eq!(zodiac_sign(12, 31), "Capricorn");
    }
}  // mod tests.
