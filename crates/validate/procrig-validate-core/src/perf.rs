use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Frame-time statistics against a budget, in milliseconds.
#[derive(Clone, Debug, Default)]
pub struct FrameTimer {
    budget_ms: f32,
    samples: Vec<f32>,
    mean_ms: f32,
    max_ms: f32,
    over_budget: usize,
}

/// Snapshot of a [`FrameTimer`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTimeStats {
    pub frames: usize,
    pub budget_ms: f32,
    pub avg_ms: f32,
    pub max_ms: f32,
    pub p95_ms: f32,
    pub over_budget: usize,
}

impl FrameTimer {
    pub fn new(budget_ms: f32) -> Self {
        Self {
            budget_ms,
            ..Self::default()
        }
    }

    pub fn budget_ms(&self) -> f32 {
        self.budget_ms
    }

    /// Run `f` and record how long it took. Returns its output and the elapsed time.
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> (R, f32) {
        let start = Instant::now();
        let out = f();
        let ms = start.elapsed().as_secs_f32() * 1000.0;
        self.record(ms);
        (out, ms)
    }

    /// Add one sample. Returns `true` when it exceeded the budget.
    pub fn record(&mut self, ms: f32) -> bool {
        if !ms.is_finite() {
            return false;
        }
        self.samples.push(ms);
        // Running mean.
        self.mean_ms += (ms - self.mean_ms) / self.samples.len() as f32;
        self.max_ms = self.max_ms.max(ms);
        let over = ms > self.budget_ms;
        if over {
            self.over_budget += 1;
        }
        over
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn average_ms(&self) -> f32 {
        self.mean_ms
    }

    pub fn max_ms(&self) -> f32 {
        self.max_ms
    }

    /// Nearest-rank 95th percentile; 0 with no samples.
    pub fn p95_ms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f32::total_cmp);
        let rank = (0.95 * sorted.len() as f32).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }

    pub fn over_budget(&self) -> usize {
        self.over_budget
    }

    pub fn stats(&self) -> FrameTimeStats {
        FrameTimeStats {
            frames: self.count(),
            budget_ms: self.budget_ms,
            avg_ms: self.mean_ms,
            max_ms: self.max_ms,
            p95_ms: self.p95_ms(),
            over_budget: self.over_budget,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.budget_ms);
    }
}
