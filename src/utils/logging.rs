use log::{trace, warn};
use std::time::{Duration, Instant};

/// Times one solver phase and books the elapsed time into the solve profile.
pub struct PhaseTimer {
    phase: &'static str,
    start: Instant,
}

impl PhaseTimer {
    pub fn start(phase: &'static str) -> Self {
        trace!("{phase}: start");
        Self {
            phase,
            start: Instant::now(),
        }
    }

    /// Adds the elapsed time to `slot` and consumes the timer.
    pub fn finish(self, slot: &mut Duration) {
        let elapsed = self.start.elapsed();
        trace!("{}: {} µs", self.phase, elapsed.as_micros());
        *slot += elapsed;
    }
}

/// Logs a warning for every free direction that nothing restrains.
pub fn warn_unconstrained(labels: &[String]) {
    for label in labels {
        warn!("unconstrained mode: no element restores dof {label}");
    }
}
