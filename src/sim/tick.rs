//! Per-frame simulation tick
//!
//! Advances a round by one variable-length frame. Ordering matters: an
//! obstacle that lands this frame becomes a hazard and is checked against the
//! player before the frame ends.

use super::spawn::{self, SpawnContext, SpawnOutcome};
use super::state::{GameState, Hazard, Obstacle, RoundResult, RoundStatus};

/// Advance the round by `dt_ms` milliseconds
pub fn tick(state: &mut GameState, dt_ms: u64) {
    if state.is_over() {
        return;
    }

    // 1. Clock and difficulty
    state.elapsed_ms += dt_ms;
    state.difficulty.advance(state.elapsed_ms);
    let step_interval_ms = state.difficulty.step_interval_ms();

    // 2. Spawn timer. A new obstacle appears at the end of the frame and
    // does not descend until the next one.
    let existing = state.obstacles.len();
    state.spawn_acc_ms += dt_ms;
    if state.spawn_acc_ms >= state.difficulty.spawn_interval_ms() {
        spawn_obstacle(state, step_interval_ms);
    }

    // 3. Motion at the current speed
    for obstacle in &mut state.obstacles[..existing] {
        obstacle.advance(dt_ms, step_interval_ms);
    }

    // 4. Landed obstacles become hazards
    let ground_rows = state.config.ground_rows;
    let lifetime_ms = state.config.hazard_lifetime_ms;
    let mut landed = Vec::new();
    state.obstacles.retain(|obstacle| {
        if obstacle.hit_ground(ground_rows) {
            landed.push(Hazard::from_obstacle(obstacle, lifetime_ms));
            false
        } else {
            true
        }
    });
    state.stats.landed += landed.len() as u32;

    // 5. Hazard lifetimes and collision. Fresh hazards start their lifetime
    // now, so they are always checked at least once.
    for hazard in &mut state.hazards {
        hazard.advance(dt_ms);
    }
    state.hazards.extend(landed);
    state.hazards.retain(Hazard::alive);
    let player_col = state.player_col;
    let hit = state.hazards.iter().find(|h| h.covers(player_col));

    // 6. Game over, computed once
    if let Some(hazard) = hit {
        let result = RoundResult::from_survived(state.elapsed_ms);
        log::info!(
            "Game over at {}ms: hazard {} covers column {} (score {})",
            state.elapsed_ms,
            hazard.id,
            player_col,
            result.score
        );
        state.status = RoundStatus::Over(result);
    }
}

/// Try a safe placement; reset the timer on success, halve it on deferral
fn spawn_obstacle(state: &mut GameState, step_interval_ms: u64) {
    let ctx = SpawnContext {
        player_col: state.player_col,
        columns: state.config.columns,
        ground_rows: state.config.ground_rows,
        step_interval_ms,
    };
    match spawn::try_spawn(&ctx, &state.length_policy, &state.safety, &mut state.rng) {
        SpawnOutcome::Placed(placement) => {
            let id = state.next_entity_id();
            state.obstacles.push(Obstacle::new(
                id,
                placement.start_col,
                placement.length,
                step_interval_ms,
            ));
            state.spawn_acc_ms = 0;
            state.stats.spawned += 1;
            log::debug!(
                "Spawn {} at {}ms: cols {}..={} ({:?}, escape {}ms of {}ms)",
                id,
                state.elapsed_ms,
                placement.start_col,
                placement.start_col + placement.length - 1,
                placement.relaxation,
                placement.required_escape_ms,
                placement.time_to_ground_ms
            );
        }
        SpawnOutcome::Deferred => {
            state.spawn_acc_ms /= 2;
            state.stats.deferred += 1;
            log::debug!(
                "Spawn deferred at {}ms (player col {}, step {}ms)",
                state.elapsed_ms,
                ctx.player_col,
                step_interval_ms
            );
        }
    }
}
