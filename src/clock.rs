// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Simulation Clock

use std::time::Duration;

/// Wall-clock time between ticks in the reference behavior.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Repeating fixed-period timer driven by elapsed time reported by the host.
///
/// The clock keeps no handle on real time. Hosts (a browser animation frame,
/// a native runtime interval) call [`advance`](Self::advance) with the time
/// that has passed and get back whether a tick signal fired.
///
/// At most one signal is pending at any time: if several periods elapse
/// between calls, one signal fires and the missed ones are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    period: Duration,
    phase: Option<Duration>,
}

impl SimulationClock {
    /// A stopped clock. A zero period is raised to one nanosecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_nanos(1)),
            phase: None,
        }
    }

    /// Begin emitting signals. The first one fires after a full period.
    /// Starting an active clock keeps its current phase.
    pub fn start(&mut self) {
        if self.phase.is_none() {
            self.phase = Some(Duration::ZERO);
        }
    }

    /// Stop immediately, discarding any partially elapsed period.
    pub fn stop(&mut self) {
        self.phase = None;
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time accumulated toward the next signal, or `None` while stopped.
    pub fn phase(&self) -> Option<Duration> {
        self.phase
    }

    /// Account for `elapsed` time. Returns `true` when a signal fires.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let Some(phase) = self.phase else {
            return false;
        };
        let total = phase.saturating_add(elapsed);
        if total < self.period {
            self.phase = Some(total);
            return false;
        }
        let remainder = total.as_nanos() % self.period.as_nanos();
        // Below the period, so the whole seconds always fit in a u64.
        let secs = (remainder / NANOS_PER_SEC) as u64;
        let nanos = (remainder % NANOS_PER_SEC) as u32;
        self.phase = Some(Duration::new(secs, nanos));
        true
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD)
    }
}
