//! Round state and core simulation types
//!
//! All mutable round state lives in [`GameState`] and is only touched by
//! [`super::tick`] and the input methods below.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{DifficultyScheduler, DifficultyState, RampParams};
use super::input::{self, InputBuffer, InputEvent, MoveOutcome, TargetWords};
use super::spawn::{LengthPolicy, SafetyParams};
use crate::consts::POINTS_PER_SECOND;
use crate::settings::{GameConfig, StageConfig};
use crate::words::{RandomWords, WordSource};

/// A falling span of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub start_col: u32,
    pub length: u32,
    /// Whole rows descended since spawn
    pub rows_descended: u32,
    /// Time banked toward the next row (ms)
    pub acc_ms: u64,
    /// Step interval applied on the last advance (ms)
    pub step_interval_ms: u64,
}

impl Obstacle {
    pub fn new(id: u32, start_col: u32, length: u32, step_interval_ms: u64) -> Self {
        Self {
            id,
            start_col,
            length: length.max(1),
            rows_descended: 0,
            acc_ms: 0,
            step_interval_ms: step_interval_ms.max(1),
        }
    }

    pub fn end_col(&self) -> u32 {
        self.start_col + self.length - 1
    }

    pub fn covers(&self, col: u32) -> bool {
        (self.start_col..=self.end_col()).contains(&col)
    }

    /// Bank `dt_ms` at the current speed and step down one row per full interval.
    ///
    /// Returns the number of rows descended this call.
    pub fn advance(&mut self, dt_ms: u64, step_interval_ms: u64) -> u32 {
        self.step_interval_ms = step_interval_ms.max(1);
        self.acc_ms += dt_ms;
        let mut rows = 0;
        while self.acc_ms >= self.step_interval_ms {
            self.acc_ms -= self.step_interval_ms;
            rows += 1;
        }
        self.rows_descended += rows;
        rows
    }

    /// Leading edge has reached the ground line
    pub fn hit_ground(&self, ground_rows: u32) -> bool {
        self.rows_descended >= ground_rows
    }

    pub fn rows_to_ground(&self, ground_rows: u32) -> u32 {
        ground_rows.saturating_sub(self.rows_descended)
    }

    /// Time until ground contact at the current step interval
    pub fn time_to_ground_ms(&self, ground_rows: u32) -> u64 {
        (self.rows_to_ground(ground_rows) as u64)
            .saturating_mul(self.step_interval_ms)
            .saturating_sub(self.acc_ms)
    }

    /// Row position including progress toward the next step, for smooth drawing
    pub fn fractional_row(&self) -> f64 {
        self.rows_descended as f64 + self.acc_ms as f64 / self.step_interval_ms as f64
    }
}

/// Lethal zone left where an obstacle met the ground
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub start_col: u32,
    pub length: u32,
    pub remaining_ms: u64,
}

impl Hazard {
    pub fn from_obstacle(obstacle: &Obstacle, lifetime_ms: u64) -> Self {
        Self {
            id: obstacle.id,
            start_col: obstacle.start_col,
            length: obstacle.length,
            remaining_ms: lifetime_ms,
        }
    }

    /// Inclusive (start, end) danger columns
    pub fn danger_cols(&self) -> (u32, u32) {
        (self.start_col, self.start_col + self.length - 1)
    }

    pub fn advance(&mut self, dt_ms: u64) {
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);
    }

    pub fn alive(&self) -> bool {
        self.remaining_ms > 0
    }

    pub fn covers(&self, col: u32) -> bool {
        let (s, e) = self.danger_cols();
        (s..=e).contains(&col)
    }
}

/// Final outcome of a round, fixed at the tick it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub survived_ms: u64,
    pub score: u64,
}

impl RoundResult {
    /// `floor(survived_seconds) * 100`
    pub fn from_survived(survived_ms: u64) -> Self {
        Self {
            survived_ms,
            score: (survived_ms / 1000) * POINTS_PER_SECOND,
        }
    }
}

/// Round status polled by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Ongoing,
    /// Sticky until `reset`
    Over(RoundResult),
}

/// Per-round counters, for logs and tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub spawned: u32,
    pub deferred: u32,
    pub landed: u32,
    pub moves: u32,
    pub misses: u32,
}

/// Complete round state
pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) stage: StageConfig,
    pub(crate) round: u32,
    pub(crate) rng: Pcg32,
    pub(crate) difficulty: DifficultyScheduler,
    pub(crate) length_policy: LengthPolicy,
    pub(crate) safety: SafetyParams,
    pub(crate) player_col: u32,
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) hazards: Vec<Hazard>,
    pub(crate) words: TargetWords,
    pub(crate) buffer: InputBuffer,
    pub(crate) word_source: Box<dyn WordSource>,
    pub(crate) elapsed_ms: u64,
    pub(crate) spawn_acc_ms: u64,
    pub(crate) status: RoundStatus,
    pub(crate) stats: RoundStats,
    next_id: u32,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("stage", &self.stage)
            .field("round", &self.round)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("player_col", &self.player_col)
            .field("obstacles", &self.obstacles)
            .field("hazards", &self.hazards)
            .field("words", &self.words)
            .field("buffer", &self.buffer)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl GameState {
    /// New round using the local random word generator
    pub fn new(config: GameConfig, stage: StageConfig) -> Self {
        let config = config.sanitized();
        let words = RandomWords::new(&config.charset, config.seed ^ 0x9E37_79B9_7F4A_7C15);
        Self::with_word_source(config, stage, Box::new(words))
    }

    /// New round drawing target words from `word_source`
    pub fn with_word_source(
        config: GameConfig,
        stage: StageConfig,
        word_source: Box<dyn WordSource>,
    ) -> Self {
        let config = config.sanitized();
        let stage = stage.sanitized();
        let mut state = Self {
            difficulty: DifficultyScheduler::new(RampParams::from_config(&config), &stage),
            length_policy: LengthPolicy::for_stage(&stage, config.columns),
            safety: SafetyParams::from_config(&config),
            rng: Pcg32::seed_from_u64(config.seed),
            player_col: config.columns / 2,
            obstacles: Vec::new(),
            hazards: Vec::new(),
            words: TargetWords {
                left: String::new(),
                right: String::new(),
            },
            buffer: InputBuffer::new(),
            word_source,
            elapsed_ms: 0,
            spawn_acc_ms: 0,
            status: RoundStatus::Ongoing,
            stats: RoundStats::default(),
            round: 0,
            next_id: 1,
            config,
            stage,
        };
        state.reset();
        state
    }

    /// Begin a new round with a different stage
    pub fn start_round(&mut self, stage: StageConfig) {
        self.stage = stage.sanitized();
        self.reset();
    }

    /// Restart the current stage from time zero
    pub fn reset(&mut self) {
        self.round += 1;
        self.rng = Pcg32::seed_from_u64(self.config.seed.wrapping_add(self.round as u64 - 1));
        self.difficulty =
            DifficultyScheduler::new(RampParams::from_config(&self.config), &self.stage);
        self.length_policy = LengthPolicy::for_stage(&self.stage, self.config.columns);
        self.player_col = self.config.columns / 2;
        self.obstacles.clear();
        self.hazards.clear();
        self.buffer.clear();
        self.elapsed_ms = 0;
        self.spawn_acc_ms = 0;
        self.status = RoundStatus::Ongoing;
        self.stats = RoundStats::default();
        self.next_id = 1;

        self.word_source
            .set_length_range(self.stage.min_len, self.stage.max_len);
        if self.word_source.needs_refill() {
            self.word_source.refill();
        }
        self.words = TargetWords::generate(&mut *self.word_source);

        log::info!(
            "Round {} start (seed {}): {:.2} steps/s, spawn every {}ms, len {}-{}",
            self.round,
            self.config.seed,
            self.stage.base_steps_per_second,
            self.stage.base_spawn_ms,
            self.stage.min_len,
            self.stage.max_len
        );
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, RoundStatus::Over(_))
    }

    /// Forward one key event; ignored once the round is over
    pub fn handle_input(&mut self, event: InputEvent) -> Option<MoveOutcome> {
        match event {
            InputEvent::Char(ch) => {
                self.append_char(ch);
                None
            }
            InputEvent::Backspace => {
                self.backspace();
                None
            }
            InputEvent::Commit => Some(self.commit()),
        }
    }

    pub fn append_char(&mut self, ch: char) -> bool {
        !self.is_over() && self.buffer.append(ch, self.config.fold_case)
    }

    pub fn backspace(&mut self) {
        if !self.is_over() {
            self.buffer.backspace();
        }
    }

    /// Submit the buffer against the target words
    pub fn commit(&mut self) -> MoveOutcome {
        if self.is_over() {
            return MoveOutcome::Empty;
        }
        let outcome = input::commit(
            &mut self.buffer,
            &mut self.words,
            &mut self.player_col,
            self.config.columns,
            &mut *self.word_source,
        );
        match outcome {
            MoveOutcome::MovedLeft { .. } | MoveOutcome::MovedRight { .. } => {
                self.stats.moves += 1;
                log::debug!("{:?} at {}ms", outcome, self.elapsed_ms);
            }
            MoveOutcome::NoMatch => self.stats.misses += 1,
            MoveOutcome::Empty => {}
        }
        outcome
    }

    /// Allocate a new entity ID
    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn stage(&self) -> &StageConfig {
        &self.stage
    }

    pub fn player_col(&self) -> u32 {
        self.player_col
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    pub fn words(&self) -> &TargetWords {
        &self.words
    }

    pub fn input(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn spawn_timer_ms(&self) -> u64 {
        self.spawn_acc_ms
    }

    pub fn difficulty(&self) -> &DifficultyState {
        self.difficulty.state()
    }

    pub fn effective_steps_per_second(&self) -> f64 {
        self.difficulty.effective_steps_per_second()
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    /// Mutable access to the word source, e.g. to refill between frames
    pub fn word_source_mut(&mut self) -> &mut dyn WordSource {
        &mut *self.word_source
    }

    /// Place an obstacle directly, bypassing the safety check.
    ///
    /// The span is clamped into the field.
    #[doc(hidden)]
    pub fn debug_spawn(&mut self, start_col: u32, length: u32) -> u32 {
        let columns = self.config.columns;
        let length = length.clamp(1, columns);
        let start_col = start_col.min(columns - length);
        let id = self.next_entity_id();
        let step = self.difficulty.step_interval_ms();
        self.obstacles.push(Obstacle::new(id, start_col, length, step));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacle_advance_banks_remainder() {
        let mut ob = Obstacle::new(1, 2, 3, 1000);
        assert_eq!(ob.advance(999, 1000), 0);
        assert_eq!(ob.advance(1, 1000), 1);
        assert_eq!(ob.advance(2500, 1000), 2);
        assert_eq!(ob.rows_descended, 3);
        assert_eq!(ob.acc_ms, 500);
        assert!((ob.fractional_row() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_obstacle_speeds_up_mid_flight() {
        let mut ob = Obstacle::new(1, 0, 1, 1000);
        ob.advance(600, 1000);
        // Interval shrinks below the banked time: the banked time still counts
        assert_eq!(ob.advance(0, 300), 2);
        assert_eq!(ob.acc_ms, 0);
    }

    #[test]
    fn test_obstacle_time_to_ground() {
        let mut ob = Obstacle::new(1, 5, 3, 1000);
        assert_eq!(ob.time_to_ground_ms(24), 24_000);
        ob.advance(1500, 1000);
        assert_eq!(ob.time_to_ground_ms(24), 22_500);
        assert!(!ob.hit_ground(24));
        ob.advance(22_500, 1000);
        assert!(ob.hit_ground(24));
        assert_eq!(ob.time_to_ground_ms(24), 0);
    }

    #[test]
    fn test_obstacle_columns() {
        let ob = Obstacle::new(1, 5, 3, 100);
        assert_eq!(ob.end_col(), 7);
        assert!(!ob.covers(4));
        assert!(ob.covers(5));
        assert!(ob.covers(7));
        assert!(!ob.covers(8));
    }

    #[test]
    fn test_hazard_lifetime() {
        let ob = Obstacle::new(4, 1, 2, 100);
        let mut hz = Hazard::from_obstacle(&ob, 380);
        assert_eq!(hz.danger_cols(), (1, 2));
        assert!(hz.covers(2) && !hz.covers(3));
        hz.advance(379);
        assert!(hz.alive());
        hz.advance(16);
        assert!(!hz.alive());
        assert_eq!(hz.remaining_ms, 0);
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(RoundResult::from_survived(42_317).score, 4200);
        assert_eq!(RoundResult::from_survived(999).score, 0);
        assert_eq!(RoundResult::from_survived(1000).score, 100);
    }

    #[test]
    fn test_new_round_layout() {
        let state = GameState::new(GameConfig::default(), StageConfig::default());
        assert_eq!(state.player_col(), 5);
        assert_eq!(state.status(), RoundStatus::Ongoing);
        assert!(!state.words().left.is_empty());
        assert!(!state.words().right.is_empty());
        assert_ne!(state.words().left, state.words().right);
        assert!(state.obstacles().is_empty());
    }

    #[test]
    fn test_input_ignored_after_game_over() {
        let mut state = GameState::new(GameConfig::default(), StageConfig::default());
        state.status = RoundStatus::Over(RoundResult::from_survived(10));
        assert!(!state.append_char('a'));
        assert_eq!(state.commit(), MoveOutcome::Empty);
        assert_eq!(state.input(), "");
    }

    #[test]
    fn test_debug_spawn_stays_in_field() {
        let mut state = GameState::new(GameConfig::default(), StageConfig::default());
        state.debug_spawn(8, 5);
        state.debug_spawn(3, 40);
        state.debug_spawn(2, 0);
        let spans: Vec<_> = state
            .obstacles()
            .iter()
            .map(|o| (o.start_col, o.length))
            .collect();
        assert_eq!(spans, vec![(5, 5), (0, 10), (2, 1)]);
    }

    #[test]
    fn test_uppercase_charset_words_are_typeable() {
        let config = GameConfig {
            charset: "ABCD".to_string(),
            ..Default::default()
        };
        let mut state = GameState::new(config, StageConfig::default());
        let left = state.words().left.clone();
        assert!(left.chars().all(|c| "abcd".contains(c)), "unfolded: {}", left);
        for ch in left.chars() {
            state.handle_input(InputEvent::Char(ch.to_ascii_uppercase()));
        }
        assert_eq!(
            state.handle_input(InputEvent::Commit),
            Some(MoveOutcome::MovedLeft { from: 5, to: 4 })
        );
    }

    #[test]
    fn test_handle_input_typing_session() {
        let mut state = GameState::new(GameConfig::default(), StageConfig::default());
        let right = state.words().right.clone();
        state.handle_input(InputEvent::Char('!'));
        state.handle_input(InputEvent::Backspace);
        for ch in right.chars() {
            state.handle_input(InputEvent::Char(ch.to_ascii_uppercase()));
        }
        let outcome = state.handle_input(InputEvent::Commit);
        assert_eq!(outcome, Some(MoveOutcome::MovedRight { from: 5, to: 6 }));
        assert_eq!(state.player_col(), 6);
        assert_eq!(state.input(), "");
        assert_eq!(state.stats().moves, 1);
    }
}
