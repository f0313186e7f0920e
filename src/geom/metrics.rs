//! Opt-in timing hooks for builds and queries.
//!
//! Timing is collected only when the `metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! let mut metrics = Metrics::default();
//! metrics.begin();
//! let triangulation = metrics.time(TimingBucket::Triangulation, || {
//!     Triangulation::build(&points, options)
//! });
//! if let Some(report) = metrics.end() {
//!     log::debug!("build took {} ns", report.triangulation_ns);
//! }
//! ```

/// Categories of timed work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Delaunay builds, including precondition checks.
    Triangulation,
    /// Single-point location and interpolation.
    Interpolation,
    /// Grid and histogram passes.
    Sampling,
    /// Contour tracing.
    Contouring,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimingReport {
    pub triangulation_ns: u64,
    pub interpolation_ns: u64,
    pub sampling_ns: u64,
    pub contouring_ns: u64,
}

impl TimingReport {
    /// Sum over the four buckets.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.triangulation_ns
            .saturating_add(self.interpolation_ns)
            .saturating_add(self.sampling_ns)
            .saturating_add(self.contouring_ns)
    }

    /// [`Self::total_ns`] in milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing operations.
///
/// When the `metrics` feature is disabled (or on WASM), all methods are no-ops
/// and [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct Metrics {
    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    report: TimingReport,
}

impl Metrics {
    /// Starts a fresh report.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            self.report = TimingReport::default();
        }
    }

    /// Snapshot of the current report; `None` when timing is compiled out.
    #[must_use]
    pub fn end(&self) -> Option<TimingReport> {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, charging its wall time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Triangulation => &mut self.report.triangulation_ns,
            TimingBucket::Interpolation => &mut self.report.interpolation_ns,
            TimingBucket::Sampling => &mut self.report.sampling_ns,
            TimingBucket::Contouring => &mut self.report.contouring_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = TimingReport {
            triangulation_ns: 2000,
            sampling_ns: 3000,
            contouring_ns: 1000,
            ..TimingReport::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = Metrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Sampling, || 42);
        assert_eq!(result, 42);
    }

    #[cfg(all(feature = "metrics", not(target_arch = "wasm32")))]
    #[test]
    fn test_report_available_with_feature() {
        let mut metrics = Metrics::default();
        metrics.begin();
        metrics.time(TimingBucket::Triangulation, || {
            std::thread::sleep(std::time::Duration::from_millis(1));
        });
        let report = metrics.end().unwrap();
        assert!(report.triangulation_ns > 0);
        assert_eq!(report.sampling_ns, 0);
    }

    #[cfg(not(all(feature = "metrics", not(target_arch = "wasm32"))))]
    #[test]
    fn test_report_absent_without_feature() {
        let mut metrics = Metrics::default();
        metrics.begin();
        metrics.time(TimingBucket::Contouring, || ());
        assert!(metrics.end().is_none());
    }
}
