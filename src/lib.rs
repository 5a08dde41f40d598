//! Typing Dodge - falling-block typing game core
//!
//! Core modules:
//! - `sim`: Round simulation (difficulty ramp, safe spawning, obstacles, hazards, movement)
//! - `words`: Word sources for the two target words
//! - `settings`: Tunable game configuration and stage presets

pub mod settings;
pub mod sim;
pub mod words;

pub use settings::{GameConfig, STAGE_PRESETS, StageConfig, StagePreset};
pub use sim::{GameState, InputEvent, RoundResult, RoundStatus, tick};
pub use words::{CachedWords, RandomWords, WordList, WordProvider, WordSource};

/// Game configuration defaults
pub mod consts {
    /// Number of lanes in the play field
    pub const COLUMNS: u32 = 10;
    /// Discrete steps an obstacle takes from spawn until its leading edge meets the ground
    pub const GROUND_ROWS: u32 = 24;

    /// Multiplier applied to fall speed at each ramp
    pub const RAMP_RATIO: f64 = 1.10;
    /// Time until the first ramp (ms)
    pub const INITIAL_RAMP_PERIOD_MS: u64 = 30_000;
    /// Ramp period shrinks by this much at every ramp (ms)
    pub const RAMP_STEP_MS: u64 = 5_000;
    /// Ramp period never drops below this (ms)
    pub const RAMP_FLOOR_MS: u64 = 10_000;

    /// Spawn interval never drops below this (ms)
    pub const SPAWN_MS_MIN: u64 = 2_250;
    /// Shortest allowed obstacle step interval (ms)
    pub const STEP_FLOOR_MS: u64 = 60;

    /// How long a landed obstacle stays lethal (ms)
    pub const HAZARD_LIFETIME_MS: u64 = 380;

    /// Assumed player typing throughput (confirmed words per second)
    pub const ASSUMED_MOVES_PER_SECOND: f64 = 2.8;
    /// Extra escape time added on top of the typing estimate (ms)
    pub const SAFETY_MARGIN_MS: u64 = 400;
    /// Placement attempts before a spawn is deferred
    pub const MAX_SPAWN_TRIES: u32 = 12;

    /// Characters used by the local word generator
    pub const LETTERS: &str = "asdfjklghqwertyuiopzxcvbnm1234567890";
    /// Redraws allowed when a regenerated word collides with a target word
    pub const WORD_REDRAW_ATTEMPTS: u32 = 8;

    /// Score awarded per fully survived second
    pub const POINTS_PER_SECOND: u64 = 100;
}
