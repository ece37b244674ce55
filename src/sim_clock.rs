// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use skyterm_elements::time_util::{
    elapsed_components, gregorian, ElapsedTime, SECONDS_PER_DAY};

/// Simulated time, as a Julian date. Owned by the frame loop and advanced
/// once per frame; the scene update only reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationClock {
    start_julian_date: f64,
    current_julian_date: f64,
}

impl SimulationClock {
    pub fn new(start_julian_date: f64) -> Self {
        SimulationClock {
            start_julian_date,
            current_julian_date: start_julian_date,
        }
    }

    pub fn start_julian_date(&self) -> f64 {
        self.start_julian_date
    }

    pub fn current_julian_date(&self) -> f64 {
        self.current_julian_date
    }

    /// Moves simulated time forward by one frame. `frame_seconds` is the real
    /// duration of the frame and `speed` the simulation rate multiplier;
    /// negative speeds run the clock backwards.
    pub fn advance(&mut self, frame_seconds: f64, speed: f64) {
        self.current_julian_date += frame_seconds * speed / SECONDS_PER_DAY;
    }

    /// Simulated days since the clock started.
    pub fn elapsed_days(&self) -> f64 {
        self.current_julian_date - self.start_julian_date
    }

    pub fn elapsed(&self) -> ElapsedTime {
        elapsed_components(self.elapsed_days())
    }

    /// Current (year, month, day).
    pub fn calendar_date(&self) -> (i32, u32, u32) {
        gregorian(self.current_julian_date)
    }
}

#[cfg(test)]
mod tests {
    extern crate approx;
    use approx::assert_abs_diff_eq;
    use skyterm_elements::time_util::J2000;

    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = SimulationClock::new(J2000);
        assert_eq!(clock.elapsed_days(), 0.0);

        // One 24 fps frame at 3600x.
        clock.advance(1.0 / 24.0, 3600.0);
        assert_abs_diff_eq!(clock.current_julian_date(), J2000 + 150.0 / 86400.0,
                            epsilon = 1e-9);
        assert_eq!(clock.start_julian_date(), J2000);

        for _ in 0..24 * 60 - 1 {
            clock.advance(1.0 / 24.0, 3600.0);
        }
        assert_abs_diff_eq!(clock.elapsed_days(), 2.5, epsilon = 1e-6);
        let elapsed = clock.elapsed();
        assert_eq!((elapsed.days, elapsed.hours), (2, 12));
        // Noon plus 2.5 days is just past midnight on the 4th.
        clock.advance(60.0, 1.0);
        assert_eq!(clock.calendar_date(), (2000, 1, 4));
    }

    #[test]
    fn test_reverse() {
        let mut clock = SimulationClock::new(J2000);
        clock.advance(86400.0, -1.0);
        assert_eq!(clock.elapsed_days(), -1.0);
        assert!(clock.elapsed().negative);
        assert_eq!(clock.calendar_date(), (1999, 12, 31));
    }
}  // mod tests.
