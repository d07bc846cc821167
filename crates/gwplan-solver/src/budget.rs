use std::time::{Duration, Instant};

/// Wall-clock cap with an optional deterministic step cap.
///
/// When a step cap is set the clock is ignored, so capped runs reproduce
/// exactly across machines.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    started: Instant,
    time_cap: Option<Duration>,
    step_cap: Option<usize>,
    steps: usize,
}

impl SearchBudget {
    pub fn new(time_cap: Option<Duration>, step_cap: Option<usize>) -> Self {
        Self {
            started: Instant::now(),
            time_cap,
            step_cap,
            steps: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    pub fn tick(&mut self, steps: usize) {
        self.steps = self.steps.saturating_add(steps);
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn deterministic(&self) -> bool {
        self.step_cap.is_some()
    }

    pub fn exhausted(&self) -> bool {
        if let Some(cap) = self.step_cap {
            return self.steps >= cap;
        }
        match self.time_cap {
            Some(cap) => self.started.elapsed() >= cap,
            None => false,
        }
    }

    pub fn utilization_percent(&self) -> u8 {
        let ratio = if let Some(cap) = self.step_cap {
            if cap == 0 {
                return 100;
            }
            self.steps as f32 / cap as f32
        } else if let Some(cap) = self.time_cap {
            if cap.is_zero() {
                return 100;
            }
            self.started.elapsed().as_secs_f32() / cap.as_secs_f32()
        } else {
            return 0;
        };
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}
