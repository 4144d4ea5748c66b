//! Telemetry hooks for placement decisions.
//!
//! The policy reports coarse-grained events through an injected
//! [`PlacementReporter`]; hosts wire the hooks into whatever metrics
//! registry they run. Implementations must be cheap and non-blocking;
//! the hooks are called inside selection paths.

/// Sink for placement telemetry. Every hook defaults to a no-op, so
/// implementations only override what they track.
pub trait PlacementReporter: Send + Sync {
    fn ensemble_created(&self, _size: usize) {}
    fn placement_failed(&self) {}
    fn bookie_replaced(&self) {}
    fn read_reordered(&self) {}
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl PlacementReporter for NoopReporter {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingReporter {
        ensembles: AtomicUsize,
        failures: AtomicUsize,
    }

    impl PlacementReporter for CountingReporter {
        fn ensemble_created(&self, _size: usize) {
            self.ensembles.fetch_add(1, Ordering::Relaxed);
        }

        fn placement_failed(&self) {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_overridden_hooks_fire_and_defaults_stay_silent() {
        let reporter = CountingReporter::default();
        reporter.ensemble_created(3);
        reporter.placement_failed();
        reporter.bookie_replaced(); // default no-op

        assert_eq!(reporter.ensembles.load(Ordering::Relaxed), 1);
        assert_eq!(reporter.failures.load(Ordering::Relaxed), 1);
    }
}
