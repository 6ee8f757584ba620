use log::info;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cumulative wall time per named section (compress, save_layer, ...).
#[derive(Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, Duration>,
    pub calls: HashMap<&'static str, u64>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        self.record(guard.name, guard.start.elapsed());
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        *self.timings.entry(name).or_default() += elapsed;
        *self.calls.entry(name).or_default() += 1;
    }

    /// Sections sorted by total time, slowest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, Duration, u64)> {
        let mut v: Vec<_> = self
            .timings
            .iter()
            .map(|(n, d)| (*n, *d, self.calls.get(n).copied().unwrap_or(0)))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
        self.calls.clear();
    }

    pub fn log_and_clear(&mut self) {
        for (name, dur, calls) in self.report_sorted() {
            info!("{:<16} {:.3?} over {} calls", name, dur, calls);
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

/// Start a profiling section. Returns a guard that will update the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard {
        name,
        start: Instant::now(),
    }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Macro helper to profile a scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}
