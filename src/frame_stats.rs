// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use medians::Medianf64;
use rolling_stats;
use statistical;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DescriptiveStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub median: Option<f64>,
    pub median_absolute_deviation: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Over the most recent frames.
    pub recent: DescriptiveStats,
    /// Since the start of the session (or the last reset_session()).
    pub session: DescriptiveStats,
}

/// Accumulates a per-frame measurement, typically the scene update latency
/// in seconds.
pub struct FrameStatsAccumulator {
    pub frame_stats: FrameStats,

    // State for `recent`.
    circular_buffer: CircularBuffer,

    // State for `session`.
    rolling_stats: rolling_stats::Stats<f64>,
}

impl FrameStatsAccumulator {
    /// `capacity` is the number of frames in the `recent` window.
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_stats: FrameStats::default(),
            circular_buffer: CircularBuffer::new(capacity.max(1)),
            rolling_stats: rolling_stats::Stats::<f64>::new(),
        }
    }

    pub fn add_value(&mut self, value: f64) {
        self.circular_buffer.push(value);
        self.rolling_stats.update(value);

        let recent_values = self.circular_buffer.unordered_contents();
        let recent_stats = &mut self.frame_stats.recent;
        recent_stats.min = recent_values.iter().copied().fold(f64::INFINITY, f64::min);
        recent_stats.max = recent_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        recent_stats.mean = statistical::mean(recent_values);
        if recent_values.len() > 1 {
            recent_stats.stddev = statistical::standard_deviation(
                recent_values, Some(recent_stats.mean));
        }
        let median = recent_values.medf_unchecked();
        recent_stats.median = Some(median);
        recent_stats.median_absolute_deviation = Some(recent_values.madf(median));

        let session_stats = &mut self.frame_stats.session;
        session_stats.min = self.rolling_stats.min;
        session_stats.max = self.rolling_stats.max;
        session_stats.mean = self.rolling_stats.mean;
        session_stats.stddev = self.rolling_stats.std_dev;
        // No median or median_absolute_deviation for session_stats.
    }

    pub fn reset_session(&mut self) {
        self.frame_stats.session = DescriptiveStats::default();
        self.rolling_stats = rolling_stats::Stats::<f64>::new();
    }
}

// A Vec<f64> used as a ring buffer, so that all elements are visible as a
// single (unordered) slice.
#[derive(Debug)]
struct CircularBuffer {
    start: usize,
    capacity: usize,
    data: Vec<f64>,
}

impl CircularBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            start: 0,
            capacity,
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: f64) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.start] = item;
            self.start += 1;
            self.start %= self.capacity;
        }
    }

    pub fn unordered_contents(&self) -> &[f64] {
        self.data.as_slice()
    }
}

#[cfg(test)]
mod tests {
    extern crate approx;
    use approx::assert_abs_diff_eq;
    use super::*;

    #[test]
    fn test_circular_buffer() {
        let mut cb = CircularBuffer::new(3);
        assert_eq!(cb.unordered_contents(), &[] as &[f64]);

        cb.push(4.0);
        assert_eq!(cb.unordered_contents(), [4.0]);

        cb.push(5.0);
        cb.push(6.0);
        assert_eq!(cb.unordered_contents(), [4.0, 5.0, 6.0]);

        cb.push(7.0);
        cb.push(8.0);
        assert_eq!(cb.unordered_contents(), [7.0, 8.0, 6.0]);
    }

    #[test]
    fn test_frame_stats_accumulator() {
        let mut fsa = FrameStatsAccumulator::new(3);
        assert_eq!(fsa.frame_stats, FrameStats::default());

        // Update latencies, seconds.
        fsa.add_value(0.002);
        fsa.add_value(0.004);
        let recent = &fsa.frame_stats.recent;
        assert_eq!(recent.min, 0.002);
        assert_eq!(recent.max, 0.004);
        assert_abs_diff_eq!(recent.mean, 0.003, epsilon = 1e-12);
        assert_abs_diff_eq!(recent.stddev, 0.00141, epsilon = 0.00001);
        assert_abs_diff_eq!(recent.median.unwrap(), 0.003, epsilon = 1e-12);
        assert_abs_diff_eq!(recent.median_absolute_deviation.unwrap(), 0.001,
                            epsilon = 1e-12);
        let session = &fsa.frame_stats.session;
        assert_eq!(session.min, 0.002);
        assert_eq!(session.max, 0.004);
        assert_eq!(session.median, None);

        // A slow frame falls out of the recent window but not the session.
        fsa.add_value(0.050);
        fsa.add_value(0.003);
        fsa.add_value(0.003);
        fsa.add_value(0.003);
        assert_eq!(fsa.frame_stats.recent.max, 0.003);
        assert_eq!(fsa.frame_stats.session.max, 0.050);

        fsa.reset_session();
        assert_eq!(fsa.frame_stats.session, DescriptiveStats::default());
        assert_eq!(fsa.frame_stats.recent.max, 0.003);
    }

    #[test]
    fn test_one_second_window() {
        // One second of frames at 24 fps: a slow second, then a fast one.
        let mut fsa = FrameStatsAccumulator::new(24);
        fsa.add_value(0.010);
        assert_eq!(fsa.frame_stats.recent.stddev, 0.0);
        assert_eq!(fsa.frame_stats.recent.median, Some(0.010));
        for _ in 1..24 {
            fsa.add_value(0.010);
        }
        for _ in 0..24 {
            fsa.add_value(0.001);
        }
        let recent = &fsa.frame_stats.recent;
        assert_eq!(recent.max, 0.001);
        assert_abs_diff_eq!(recent.mean, 0.001, epsilon = 1e-12);
        assert_abs_diff_eq!(recent.median.unwrap(), 0.001, epsilon = 1e-12);
        assert_abs_diff_eq!(recent.median_absolute_deviation.unwrap(), 0.0,
                            epsilon = 1e-12);
        assert_abs_diff_eq!(recent.stddev, 0.0, epsilon = 1e-9);

        let session = &fsa.frame_stats.session;
        assert_eq!(session.min, 0.001);
        assert_eq!(session.max, 0.010);
        assert_abs_diff_eq!(session.mean, 0.0055, epsilon = 1e-12);
        assert!((0.00449..0.0046).contains(&session.stddev), "{}", session.stddev);
    }

    #[test]
    fn test_zero_capacity() {
        let mut fsa = FrameStatsAccumulator::new(0);
        fsa.add_value(1.0);
        fsa.add_value(2.0);
        assert_eq!(fsa.frame_stats.recent.min, 2.0);
        assert_eq!(fsa.frame_stats.recent.median, Some(2.0));
    }
}  // mod tests.
