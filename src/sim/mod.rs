//! Round simulation module
//!
//! All gameplay logic lives here:
//! - Difficulty ramp driven by elapsed round time
//! - Safe obstacle placement with relaxation and deferral
//! - Obstacle descent, hazards, and collision
//! - Word-match movement
//!
//! No rendering, menu, or platform dependencies.

pub mod autopilot;
pub mod difficulty;
pub mod input;
pub mod spawn;
pub mod state;
pub mod tick;

pub use difficulty::{DifficultyScheduler, DifficultyState, RampParams};
pub use input::{InputBuffer, InputEvent, MoveOutcome, TargetWords};
pub use spawn::{LengthPolicy, Placement, SafetyParams, SpawnContext, SpawnOutcome, try_spawn};
pub use state::{GameState, Hazard, Obstacle, RoundResult, RoundStats, RoundStatus};
pub use tick::tick;
