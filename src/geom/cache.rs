//! Memoized triangulation for one point set.
//!
//! The cache holds at most one build, tagged with the generation it was made
//! for. Any mutation of the owning point set bumps the generation; the next
//! lookup then rebuilds. Failed builds are cached as well, so a bulk pass over
//! an unbuildable point set pays for the attempt once.
//!
//! # Example
//! ```ignore
//! let mut cache = TriangulationCache::new();
//! let built = cache.get_or_build(|| Triangulation::build(&points, options));
//! cache.invalidate();
//! println!("hits: {}, misses: {}", cache.stats().hits, cache.stats().misses);
//! ```

use std::mem::size_of;

use super::triangulation::{Edge, Triangle, Triangulation};
use crate::error::DelaunayResult;

#[derive(Debug)]
struct CachedBuild {
    generation: u64,
    result: DelaunayResult<Triangulation>,
}

#[derive(Debug, Default)]
pub struct TriangulationCache {
    entry: Option<CachedBuild>,
    generation: u64,

    // Hit/miss counters for diagnostics
    hits: usize,
    misses: usize,
    invalidations: usize,
    failed_builds: usize,
}

/// Cache statistics for diagnostics and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Current generation of the owning point set.
    pub generation: u64,
    /// Whether a build (successful or not) is held for the current generation.
    pub cached: bool,
    pub hits: usize,
    pub misses: usize,
    /// Invalidations that discarded a held build.
    pub invalidations: usize,
    /// Builds that ended in an error.
    pub failed_builds: usize,
    /// Estimated memory usage in bytes.
    pub estimated_memory_bytes: usize,
}

impl CacheStats {
    /// Returns the cache hit rate as a value between 0.0 and 1.0.
    /// Returns 0.0 if no lookups have been made.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl TriangulationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation and drops whatever was held.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if self.entry.take().is_some() {
            self.invalidations += 1;
        }
    }

    /// The held build for the current generation, without building.
    #[must_use]
    pub fn peek(&self) -> Option<&DelaunayResult<Triangulation>> {
        self.entry
            .as_ref()
            .filter(|entry| entry.generation == self.generation)
            .map(|entry| &entry.result)
    }

    /// Returns the build for the current generation, calling `make` on a miss.
    pub fn get_or_build(
        &mut self,
        make: impl FnOnce() -> DelaunayResult<Triangulation>,
    ) -> &DelaunayResult<Triangulation> {
        let generation = self.generation;
        if self.entry.as_ref().is_some_and(|entry| entry.generation != generation) {
            self.entry = None;
        }

        if self.entry.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }

        let failed_builds = &mut self.failed_builds;
        let entry = self.entry.get_or_insert_with(|| {
            let result = make();
            if let Err(err) = &result {
                *failed_builds += 1;
                log::warn!("triangulation build failed: {err}");
            }
            CachedBuild { generation, result }
        });
        &entry.result
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            generation: self.generation,
            cached: self.peek().is_some(),
            hits: self.hits,
            misses: self.misses,
            invalidations: self.invalidations,
            failed_builds: self.failed_builds,
            estimated_memory_bytes: self.estimate_memory_usage(),
        }
    }

    /// Drops the held build and resets the counters; the generation is kept.
    pub fn clear(&mut self) {
        self.entry = None;
        self.reset_counters();
    }

    /// Resets hit/miss counters without clearing cached data.
    pub fn reset_counters(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.invalidations = 0;
        self.failed_builds = 0;
    }

    /// Estimates the memory held by the cached triangulation in bytes.
    #[must_use]
    pub fn estimate_memory_usage(&self) -> usize {
        let Some(Ok(triangulation)) = self.entry.as_ref().map(|entry| &entry.result) else {
            return 0;
        };
        let per_triangle = size_of::<Triangle>() + size_of::<[Option<usize>; 3]>();
        // incident-triangle seed plus hull flag
        let per_point = size_of::<usize>() + size_of::<bool>();
        let hull = triangulation.hull().len() * (size_of::<usize>() + size_of::<Edge>());
        triangulation.len() * per_triangle + triangulation.point_count() * per_point + hull
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DelaunayError;
    use crate::geom::point_set::PointSet;
    use crate::geom::triangulation::DelaunayOptions;

    fn square() -> PointSet {
        PointSet::from_slices(&[0.0, 1.0, 0.0, 1.0], &[0.0, 0.0, 1.0, 1.0], &[0.0; 4]).unwrap()
    }

    #[test]
    fn test_hit_after_miss() {
        let points = square();
        let mut cache = TriangulationCache::new();
        let mut builds = 0;
        for _ in 0..3 {
            let result = cache.get_or_build(|| {
                builds += 1;
                Triangulation::build(&points, DelaunayOptions::default())
            });
            assert!(result.is_ok());
        }
        assert_eq!(builds, 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (2, 1));
        assert!(stats.cached);
        assert!(stats.estimated_memory_bytes > 0);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let points = square();
        let mut cache = TriangulationCache::new();
        let _ = cache.get_or_build(|| Triangulation::build(&points, DelaunayOptions::default()));
        cache.invalidate();
        assert!(cache.peek().is_none());
        assert_eq!(cache.generation(), 1);
        let _ = cache.get_or_build(|| Triangulation::build(&points, DelaunayOptions::default()));
        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.invalidations, 1);

        // Invalidating an empty cache bumps the generation only.
        cache.clear();
        cache.invalidate();
        assert_eq!(cache.stats().invalidations, 0);
        assert_eq!(cache.generation(), 2);
    }

    #[test]
    fn test_failed_build_is_cached() {
        let points = PointSet::from_slices(&[0.0, 1.0], &[0.0, 1.0], &[0.0, 0.0]).unwrap();
        let mut cache = TriangulationCache::new();
        for _ in 0..4 {
            let result =
                cache.get_or_build(|| Triangulation::build(&points, DelaunayOptions::default()));
            assert_eq!(result, &Err(DelaunayError::InsufficientPoints { provided: 2 }));
        }
        let stats = cache.stats();
        assert_eq!(stats.failed_builds, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.estimated_memory_bytes, 0);
    }
}
