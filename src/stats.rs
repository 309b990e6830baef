//! Throughput tracking and time estimates.

use std::time::Duration;

use serde::Serialize;

/// Number of samples averaged into the throughput figure.
pub const WINDOW_DEPTH: usize = 3;

/// Fixed-size ring of counters. The slot at `head` is the one being filled.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    slots: [u64; N],
    head: usize,
}

impl<const N: usize> RingBuffer<N> {
    pub fn new() -> Self {
        Self {
            slots: [0; N],
            head: 0,
        }
    }

    /// Adds to the current slot.
    #[inline]
    pub fn add(&mut self, value: u64) {
        self.slots[self.head] = self.slots[self.head].saturating_add(value);
    }

    /// Moves to the next slot and zeroes it, dropping the oldest sample.
    pub fn advance(&mut self) {
        self.head = (self.head + 1) % N;
        self.slots[self.head] = 0;
    }

    pub fn current(&self) -> u64 {
        self.slots[self.head]
    }

    pub fn sum(&self) -> u64 {
        self.slots.iter().sum()
    }

    pub fn depth(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.slots = [0; N];
        self.head = 0;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the search statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub addresses_per_second: f64,
    pub addresses_generated: u64,
    pub ignored_matches: u64,
    /// `None` until there is throughput to estimate from
    pub estimated_seconds_remaining: Option<f64>,
}

/// Aggregates worker Stat events into totals and a rolling rate.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    window: RingBuffer<WINDOW_DEPTH>,
    /// Length of one window slot
    sample: Duration,
    addresses_per_second: f64,
    addresses_generated: u64,
    ignored_matches: u64,
    min_iterations: f64,
}

impl StatsAggregator {
    /// One-second samples.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    /// Samples of length `sample`; the rate is still reported per second.
    pub fn with_interval(sample: Duration) -> Self {
        Self {
            window: RingBuffer::new(),
            sample: sample.max(Duration::from_millis(1)),
            addresses_per_second: 0.0,
            addresses_generated: 0,
            ignored_matches: 0,
            min_iterations: 1.0,
        }
    }

    /// Sets the expected number of attempts used for the time estimate.
    pub fn set_min_iterations(&mut self, iterations: f64) {
        self.min_iterations = iterations.max(1.0);
    }

    pub fn min_iterations(&self) -> f64 {
        self.min_iterations
    }

    pub fn interval(&self) -> Duration {
        self.sample
    }

    /// Folds one worker report into the totals and the current sample.
    pub fn record(&mut self, addresses: u64, ignored: u64) {
        self.addresses_generated = self.addresses_generated.saturating_add(addresses);
        self.ignored_matches = self.ignored_matches.saturating_add(ignored);
        self.window.add(addresses);
    }

    /// Closes the current sample: recomputes the rate and starts a new slot.
    pub fn tick(&mut self) -> f64 {
        let span = self.window.depth() as f64 * self.sample.as_secs_f64();
        self.addresses_per_second = self.window.sum() as f64 / span;
        self.window.advance();
        self.addresses_per_second
    }

    pub fn addresses_per_second(&self) -> f64 {
        self.addresses_per_second
    }

    pub fn addresses_generated(&self) -> u64 {
        self.addresses_generated
    }

    pub fn ignored_matches(&self) -> u64 {
        self.ignored_matches
    }

    /// Seconds until a match is expected at the current rate. `None` without
    /// throughput or when no term can ever match.
    pub fn estimated_seconds_remaining(&self) -> Option<f64> {
        if self.addresses_per_second > 0.0 && self.min_iterations.is_finite() {
            Some(self.min_iterations / self.addresses_per_second)
        } else {
            None
        }
    }

    /// Clears totals and the rate window. The iteration estimate is kept.
    pub fn reset(&mut self) {
        self.window.clear();
        self.addresses_per_second = 0.0;
        self.addresses_generated = 0;
        self.ignored_matches = 0;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            addresses_per_second: self.addresses_per_second,
            addresses_generated: self.addresses_generated,
            ignored_matches: self.ignored_matches,
            estimated_seconds_remaining: self.estimated_seconds_remaining(),
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a count as "1.23K", "4.56M", etc.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format duration as "5.3 hours", "2.5 minutes", "45 seconds", etc.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();

    if secs >= 86400 {
        format!("{:.1} days", secs as f64 / 86400.0)
    } else if secs >= 3600 {
        format!("{:.1} hours", secs as f64 / 3600.0)
    } else if secs >= 60 {
        format!("{:.1} minutes", secs as f64 / 60.0)
    } else {
        format!("{} seconds", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_wraps() {
        let mut ring = RingBuffer::<3>::new();
        ring.add(5);
        ring.advance();
        ring.add(7);
        ring.advance();
        ring.add(9);
        assert_eq!(ring.sum(), 21);

        // oldest sample (5) is overwritten
        ring.advance();
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.sum(), 16);

        ring.clear();
        assert_eq!(ring.sum(), 0);
    }

    #[test]
    fn test_constant_rate_converges() {
        let mut stats = StatsAggregator::new();
        let k = 1200;

        stats.record(k, 0);
        assert_eq!(stats.tick(), k as f64 / 3.0);
        stats.record(k, 0);
        assert_eq!(stats.tick(), 2.0 * k as f64 / 3.0);
        stats.record(k, 0);
        assert_eq!(stats.tick(), k as f64);

        for _ in 0..5 {
            stats.record(k / 2, 0);
            stats.record(k / 2, 0);
            assert_eq!(stats.tick(), k as f64);
        }
        assert_eq!(stats.addresses_generated(), 8 * k);
    }

    #[test]
    fn test_short_samples_report_per_second() {
        let mut stats = StatsAggregator::with_interval(Duration::from_millis(250));
        for _ in 0..3 {
            stats.record(100, 0);
            stats.tick();
        }
        assert_eq!(stats.addresses_per_second(), 400.0);
    }

    #[test]
    fn test_estimate_needs_throughput() {
        let mut stats = StatsAggregator::new();
        stats.set_min_iterations(600.0);
        assert_eq!(stats.estimated_seconds_remaining(), None);

        stats.record(300, 2);
        stats.tick();
        assert_eq!(stats.estimated_seconds_remaining(), Some(6.0));
        assert_eq!(stats.ignored_matches(), 2);

        stats.set_min_iterations(f64::INFINITY);
        assert_eq!(stats.estimated_seconds_remaining(), None);
    }

    #[test]
    fn test_reset_keeps_estimate_baseline() {
        let mut stats = StatsAggregator::new();
        stats.set_min_iterations(50.0);
        stats.record(90, 1);
        stats.tick();
        stats.reset();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.addresses_generated, 0);
        assert_eq!(snapshot.ignored_matches, 0);
        assert_eq!(snapshot.addresses_per_second, 0.0);
        assert_eq!(snapshot.estimated_seconds_remaining, None);
        assert_eq!(stats.min_iterations(), 50.0);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.50K");
        assert_eq!(format_number(2_000_000), "2.00M");
        assert_eq!(format_duration(Duration::from_secs(45)), "45 seconds");
        assert_eq!(format_duration(Duration::from_secs(150)), "2.5 minutes");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2.0 hours");
    }
}
