//! Per-system frame profiler.
//!
//! When enabled on the [`World`](crate::world::World), every system call is
//! timed under the system's name and every `update` counts as one frame.
//! Nothing is recorded while profiling is off.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Statistics for a profiled section.
#[derive(Debug, Default, Clone)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

/// `total / count` in whole nanoseconds; zero when `count` is zero.
fn mean(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

impl SectionStats {
    /// Get the average time per call.
    pub fn avg_time(&self) -> Duration {
        mean(self.total_time, self.call_count)
    }

    fn record(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.call_count += 1;
        self.min_time = Some(self.min_time.map_or(elapsed, |m| m.min(elapsed)));
        self.max_time = Some(self.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }
}

#[derive(Debug, Default)]
pub struct Profiler {
    sections: HashMap<&'static str, SectionStats>,
    frame_count: u64,
}

impl Profiler {
    /// Create a new profiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one timed call of `section`.
    pub fn record(&mut self, section: &'static str, elapsed: Duration) {
        self.sections.entry(section).or_default().record(elapsed);
    }

    /// Mark the end of a frame.
    pub fn frame(&mut self) {
        self.frame_count += 1;
    }

    /// Get the number of frames profiled.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get stats for a specific section.
    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    /// Get all section names.
    pub fn section_names(&self) -> Vec<&'static str> {
        self.sections.keys().copied().collect()
    }

    /// Table of sections sorted by total time, slowest first.
    pub fn summary(&self) -> String {
        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));
        let total: Duration = sections.iter().map(|(_, s)| s.total_time).sum();

        let mut out = String::new();
        let _ = writeln!(out, "=== Profiler Summary ({} frames) ===", self.frame_count);
        let _ = writeln!(
            out,
            "{:<20} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "System", "Total", "Avg", "Min", "Max", "% Time"
        );
        for (name, stats) in &sections {
            let pct = if total.as_nanos() > 0 {
                stats.total_time.as_nanos() as f64 / total.as_nanos() as f64 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:<20} {:>10.2?} {:>10.2?} {:>10.2?} {:>10.2?} {:>7.1}%",
                name,
                stats.total_time,
                stats.avg_time(),
                stats.min_time.unwrap_or(Duration::ZERO),
                stats.max_time.unwrap_or(Duration::ZERO),
                pct
            );
        }
        if self.frame_count > 0 {
            let _ = writeln!(out, "{:<20} {:>10.2?}", "Avg per frame", mean(total, self.frame_count));
        }
        out
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        self.sections.clear();
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_min_max_and_count() {
        let mut profiler = Profiler::new();
        profiler.record("movement", Duration::from_micros(10));
        profiler.record("movement", Duration::from_micros(30));
        profiler.frame();

        let stats = profiler.get_section("movement").unwrap();
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.min_time, Some(Duration::from_micros(10)));
        assert_eq!(stats.max_time, Some(Duration::from_micros(30)));
        assert_eq!(stats.avg_time(), Duration::from_micros(20));
    }

    #[test]
    fn test_summary_lists_sections() {
        let mut profiler = Profiler::new();
        profiler.record("collision", Duration::from_micros(50));
        profiler.record("movement", Duration::from_micros(5));
        profiler.frame();
        let summary = profiler.summary();
        assert!(summary.contains("collision"));
        assert!(summary.contains("1 frames"));

        profiler.reset();
        assert!(profiler.section_names().is_empty());
    }

    #[test]
    fn test_averages_survive_counts_past_u32() {
        let stats = SectionStats {
            total_time: Duration::from_secs(8),
            call_count: 1 << 32,
            ..SectionStats::default()
        };
        assert_eq!(stats.avg_time(), Duration::from_nanos(1));

        let mut profiler = Profiler::new();
        profiler.record("movement", Duration::from_secs(8));
        profiler.frame_count = 1 << 32;
        assert!(profiler.summary().contains("Avg per frame"));
    }
}
