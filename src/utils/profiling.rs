use log::{debug, log_enabled, Level};
use std::time::Duration;

/// Timing and evaluation counts of a single `solve_statics` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolveProfile {
    pub linear_time: Duration,
    pub newton_time: Duration,
    pub descent_time: Duration,
    pub global_time: Duration,
    pub total_time: Duration,

    pub dof_count: usize,
    pub residual_evaluations: usize,
    pub jacobian_evaluations: usize,
}

impl SolveProfile {
    pub fn report(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        let total_us = self.total_time.as_micros() as f64;
        if total_us < 1.0 {
            return;
        }
        let share = |d: Duration| d.as_micros() as f64 / total_us * 100.0;

        debug!(
            "solve profile: {} dofs, {} residuals, {} jacobians, {:.2} ms total",
            self.dof_count,
            self.residual_evaluations,
            self.jacobian_evaluations,
            self.total_time.as_secs_f64() * 1000.0
        );
        debug!(
            "  linear {:.1}% | newton {:.1}% | descent {:.1}% | global {:.1}%",
            share(self.linear_time),
            share(self.newton_time),
            share(self.descent_time),
            share(self.global_time)
        );
    }
}
