//! Difficulty ramp
//!
//! Fall speed grows by a fixed ratio at every ramp, and ramps come closer
//! together until the period hits its floor. Difficulty never eases off
//! within a round.

use serde::{Deserialize, Serialize};

use crate::settings::{GameConfig, StageConfig};

/// Ramp tuning pulled from [`GameConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampParams {
    pub ratio: f64,
    pub initial_period_ms: u64,
    pub step_ms: u64,
    pub floor_ms: u64,
    pub spawn_lower_bound_ms: u64,
    pub step_floor_ms: u64,
}

impl RampParams {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            ratio: config.ramp_ratio,
            initial_period_ms: config.initial_ramp_period_ms,
            step_ms: config.ramp_step_ms,
            floor_ms: config.ramp_floor_ms,
            spawn_lower_bound_ms: config.spawn_lower_bound_ms,
            step_floor_ms: config.step_floor_ms,
        }
    }
}

impl Default for RampParams {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Scheduler output after the last `advance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub elapsed_ms: u64,
    pub acceleration_multiplier: f64,
    pub current_ramp_period_ms: u64,
    pub next_ramp_due_ms: u64,
    pub spawn_interval_ms: u64,
}

/// Converts cumulative play time into fall speed and spawn interval
#[derive(Debug, Clone)]
pub struct DifficultyScheduler {
    params: RampParams,
    base_steps_per_second: f64,
    base_spawn_ms: u64,
    state: DifficultyState,
    ramps: u32,
}

impl DifficultyScheduler {
    pub fn new(params: RampParams, stage: &StageConfig) -> Self {
        let period = params.initial_period_ms.max(params.floor_ms).max(1);
        let mut scheduler = Self {
            params,
            base_steps_per_second: stage.base_steps_per_second,
            base_spawn_ms: stage.base_spawn_ms,
            state: DifficultyState {
                elapsed_ms: 0,
                acceleration_multiplier: 1.0,
                current_ramp_period_ms: period,
                next_ramp_due_ms: period,
                spawn_interval_ms: 0,
            },
            ramps: 0,
        };
        scheduler.state.spawn_interval_ms = scheduler.compute_spawn_interval();
        scheduler
    }

    /// Move the clock to `elapsed_ms` (cumulative round time) and apply due ramps
    pub fn advance(&mut self, elapsed_ms: u64) -> &DifficultyState {
        self.state.elapsed_ms = self.state.elapsed_ms.max(elapsed_ms);

        // A long stall can cross several ramps at once
        while self.state.elapsed_ms >= self.state.next_ramp_due_ms {
            self.state.acceleration_multiplier *= self.params.ratio;
            self.state.current_ramp_period_ms = self
                .state
                .current_ramp_period_ms
                .saturating_sub(self.params.step_ms)
                .max(self.params.floor_ms)
                .max(1);
            self.state.next_ramp_due_ms += self.state.current_ramp_period_ms;
            self.ramps += 1;
            log::info!(
                "Ramp {} at {}ms: x{:.3}, next in {}ms",
                self.ramps,
                self.state.elapsed_ms,
                self.state.acceleration_multiplier,
                self.state.current_ramp_period_ms
            );
        }

        self.state.spawn_interval_ms = self.compute_spawn_interval();
        &self.state
    }

    pub fn state(&self) -> &DifficultyState {
        &self.state
    }

    /// Number of ramps applied so far
    pub fn ramps(&self) -> u32 {
        self.ramps
    }

    /// Current fall speed in rows per second
    pub fn effective_steps_per_second(&self) -> f64 {
        self.base_steps_per_second * self.state.acceleration_multiplier
    }

    pub fn spawn_interval_ms(&self) -> u64 {
        self.state.spawn_interval_ms
    }

    /// Time per discrete row at the current speed
    pub fn step_interval_ms(&self) -> u64 {
        step_interval_ms(self.effective_steps_per_second(), self.params.step_floor_ms)
    }

    fn compute_spawn_interval(&self) -> u64 {
        let scaled = (self.base_spawn_ms as f64 / self.state.acceleration_multiplier) as u64;
        scaled.max(self.params.spawn_lower_bound_ms)
    }
}

/// `max(floor, round(1000 / steps_per_second))`
pub fn step_interval_ms(steps_per_second: f64, floor_ms: u64) -> u64 {
    if steps_per_second.is_nan() || steps_per_second <= 0.0 {
        return u64::MAX;
    }
    ((1000.0 / steps_per_second).round() as u64).max(floor_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(sps: f64, spawn_ms: u64) -> DifficultyScheduler {
        DifficultyScheduler::new(RampParams::default(), &StageConfig::new(sps, spawn_ms))
    }

    #[test]
    fn test_initial_state() {
        let s = scheduler(1.0, 8000);
        assert_eq!(s.state().acceleration_multiplier, 1.0);
        assert_eq!(s.state().current_ramp_period_ms, 30_000);
        assert_eq!(s.state().next_ramp_due_ms, 30_000);
        assert_eq!(s.spawn_interval_ms(), 8000);
        assert_eq!(s.step_interval_ms(), 1000);
    }

    #[test]
    fn test_ramp_schedule_shrinks_to_floor() {
        let mut s = scheduler(1.0, 8000);
        s.advance(29_999);
        assert_eq!(s.ramps(), 0);

        s.advance(30_000);
        assert_eq!(s.ramps(), 1);
        assert!((s.state().acceleration_multiplier - 1.1).abs() < 1e-9);
        assert_eq!(s.state().current_ramp_period_ms, 25_000);
        assert_eq!(s.state().next_ramp_due_ms, 55_000);

        // 55_000 -> period 20_000 -> due 75_000; 75_000 -> 15_000 -> 90_000
        s.advance(90_000);
        assert_eq!(s.ramps(), 4);
        assert_eq!(s.state().current_ramp_period_ms, 10_000);
        assert_eq!(s.state().next_ramp_due_ms, 100_000);

        s.advance(100_000);
        assert_eq!(s.state().current_ramp_period_ms, 10_000);
        assert_eq!(s.state().next_ramp_due_ms, 110_000);
    }

    #[test]
    fn test_stall_applies_every_due_ramp() {
        let mut stepped = scheduler(1.0, 8000);
        for t in (0..=200_000).step_by(16) {
            stepped.advance(t);
        }
        let mut stalled = scheduler(1.0, 8000);
        stalled.advance(200_000);
        assert_eq!(stepped.ramps(), stalled.ramps());
        assert!(
            (stepped.state().acceleration_multiplier - stalled.state().acceleration_multiplier)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_spawn_interval_floor() {
        let mut s = scheduler(1.0, 2500);
        s.advance(10_000_000);
        assert_eq!(s.spawn_interval_ms(), 2250);
    }

    #[test]
    fn test_step_interval_floor() {
        assert_eq!(step_interval_ms(1.0, 60), 1000);
        assert_eq!(step_interval_ms(3.0, 60), 333);
        assert_eq!(step_interval_ms(1000.0, 60), 60);
        assert_eq!(step_interval_ms(0.0, 60), u64::MAX);
        assert_eq!(step_interval_ms(f64::INFINITY, 60), 60);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut s = scheduler(1.0, 8000);
        s.advance(40_000);
        let before = *s.state();
        s.advance(10);
        assert_eq!(s.state().elapsed_ms, before.elapsed_ms);
        assert_eq!(s.ramps(), 1);
    }
}
