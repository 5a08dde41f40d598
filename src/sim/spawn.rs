//! Safe obstacle placement
//!
//! Every committed obstacle must leave the player an escape route that can be
//! typed in time at the assumed throughput. Placement rolls a span, then
//! relaxes it (shift by one column, then shrink by one) before giving up and
//! deferring the spawn.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::{GameConfig, StageConfig};

/// Obstacle length range, clamped so a span never covers the whole field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthPolicy {
    pub min_len: u32,
    pub max_len: u32,
    pub columns: u32,
}

impl LengthPolicy {
    pub fn new(min_len: u32, max_len: u32, columns: u32) -> Self {
        let columns = columns.max(2);
        let max_len = max_len.clamp(1, columns - 1);
        let min_len = min_len.clamp(1, max_len);
        Self {
            min_len,
            max_len,
            columns,
        }
    }

    pub fn for_stage(stage: &StageConfig, columns: u32) -> Self {
        Self::new(stage.min_len, stage.max_len, columns)
    }

    pub fn roll_length<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.random_range(self.min_len..=self.max_len)
    }

    /// Uniform start column for a span of `length`
    pub fn roll_start<R: Rng + ?Sized>(&self, length: u32, rng: &mut R) -> u32 {
        rng.random_range(0..=self.columns - length)
    }
}

/// Throughput assumption behind the escape-time estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyParams {
    pub assumed_moves_per_second: f64,
    pub safety_margin_ms: u64,
    pub max_tries: u32,
}

impl SafetyParams {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            assumed_moves_per_second: config.assumed_moves_per_second,
            safety_margin_ms: config.safety_margin_ms,
            max_tries: config.max_spawn_tries,
        }
    }

    /// `ceil(moves / moves_per_second * 1000) + margin`
    pub fn required_escape_ms(&self, moves: u32) -> u64 {
        let typing_ms = (moves as f64 / self.assumed_moves_per_second * 1000.0).ceil() as u64;
        typing_ms + self.safety_margin_ms
    }
}

impl Default for SafetyParams {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Snapshot of the round a placement is judged against
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub player_col: u32,
    pub columns: u32,
    pub ground_rows: u32,
    /// Step interval at the current effective speed
    pub step_interval_ms: u64,
}

impl SpawnContext {
    /// Fall time of a freshly spawned obstacle
    pub fn time_to_ground_ms(&self) -> u64 {
        (self.ground_rows as u64).saturating_mul(self.step_interval_ms)
    }
}

/// Which relaxation stage produced the placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relaxation {
    Rolled,
    Shifted,
    Shrunk,
}

/// An accepted span with the numbers that justified it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub start_col: u32,
    pub length: u32,
    pub relaxation: Relaxation,
    pub required_escape_ms: u64,
    pub time_to_ground_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Placed(Placement),
    /// No safe span found; caller creates nothing and halves its spawn timer
    Deferred,
}

/// Column moves from `player_col` to the nearest column beside `[start, start+length-1]`.
///
/// Returns 0 when the player is already outside the span and `None` when the
/// span leaves no neighbor column inside the field.
pub fn safe_move_count(player_col: u32, start_col: u32, length: u32, columns: u32) -> Option<u32> {
    let end_col = start_col + length.max(1) - 1;
    if player_col < start_col || player_col > end_col {
        return Some(0);
    }
    let left = start_col.checked_sub(1).map(|safe| player_col - safe);
    let right = (end_col + 1 < columns).then(|| end_col + 1 - player_col);
    match (left, right) {
        (Some(l), Some(r)) => Some(l.min(r)),
        (l, r) => l.or(r),
    }
}

/// Judge one candidate span
pub fn check_span(
    ctx: &SpawnContext,
    params: &SafetyParams,
    start_col: u32,
    length: u32,
    relaxation: Relaxation,
) -> Option<Placement> {
    if length == 0 || start_col + length > ctx.columns {
        return None;
    }
    let moves = safe_move_count(ctx.player_col, start_col, length, ctx.columns)?;
    let required_escape_ms = params.required_escape_ms(moves);
    let time_to_ground_ms = ctx.time_to_ground_ms();
    (required_escape_ms <= time_to_ground_ms).then_some(Placement {
        start_col,
        length,
        relaxation,
        required_escape_ms,
        time_to_ground_ms,
    })
}

/// Roll and relax spans until one is escapable, or defer
pub fn try_spawn<R: Rng + ?Sized>(
    ctx: &SpawnContext,
    policy: &LengthPolicy,
    params: &SafetyParams,
    rng: &mut R,
) -> SpawnOutcome {
    for _ in 0..params.max_tries.max(1) {
        let length = policy.roll_length(rng);
        let start = policy.roll_start(length, rng);
        if let Some(placed) = check_span(ctx, params, start, length, Relaxation::Rolled) {
            return SpawnOutcome::Placed(placed);
        }

        let max_start = policy.columns - length;
        let shifts: [i64; 2] = if rng.random_bool(0.5) { [-1, 1] } else { [1, -1] };
        for shift in shifts {
            let shifted = (start as i64 + shift).clamp(0, max_start as i64) as u32;
            if shifted == start {
                continue;
            }
            if let Some(placed) = check_span(ctx, params, shifted, length, Relaxation::Shifted) {
                return SpawnOutcome::Placed(placed);
            }
        }

        if length > 1 {
            let shorter = length - 1;
            let start = policy.roll_start(shorter, rng);
            if let Some(placed) = check_span(ctx, params, start, shorter, Relaxation::Shrunk) {
                return SpawnOutcome::Placed(placed);
            }
        }
    }
    SpawnOutcome::Deferred
}
