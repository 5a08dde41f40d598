//! Game configuration and stage presets
//!
//! Loaded from JSON; every field falls back to the defaults in [`crate::consts`].

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Starting stages offered by the stage-select menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StagePreset {
    #[default]
    Stage1,
    Stage2,
    Stage3,
    Stage4,
    Stage5,
    Stage6,
}

/// All presets in menu order
pub const STAGE_PRESETS: [StagePreset; 6] = [
    StagePreset::Stage1,
    StagePreset::Stage2,
    StagePreset::Stage3,
    StagePreset::Stage4,
    StagePreset::Stage5,
    StagePreset::Stage6,
];

impl StagePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagePreset::Stage1 => "Stage 1  (len 1-3, slow)",
            StagePreset::Stage2 => "Stage 2  (len 1-5)",
            StagePreset::Stage3 => "Stage 3  (len 2-7)",
            StagePreset::Stage4 => "Stage 4  (len 3-9)",
            StagePreset::Stage5 => "Stage 5  (len 4-9, fast)",
            StagePreset::Stage6 => "Stage 6  (len 5-9, faster)",
        }
    }

    /// Preset for a 1-based menu number
    pub fn from_number(n: u32) -> Option<Self> {
        STAGE_PRESETS.get((n as usize).checked_sub(1)?).copied()
    }

    /// Stage parameters seeded into the difficulty scheduler
    pub fn config(&self) -> StageConfig {
        let (min_len, max_len, base_steps_per_second, base_spawn_ms) = match self {
            StagePreset::Stage1 => (1, 3, 0.40, 6_500),
            StagePreset::Stage2 => (1, 5, 0.56, 5_500),
            StagePreset::Stage3 => (2, 7, 0.72, 4_500),
            StagePreset::Stage4 => (3, 9, 0.88, 3_600),
            StagePreset::Stage5 => (4, 9, 1.04, 2_900),
            StagePreset::Stage6 => (5, 9, 1.20, 2_500),
        };
        StageConfig {
            base_steps_per_second,
            base_spawn_ms,
            min_len,
            max_len,
        }
    }
}

/// Per-round stage parameters chosen by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Obstacle fall speed before any ramp (rows per second)
    pub base_steps_per_second: f64,
    /// Spawn interval before any ramp (ms)
    pub base_spawn_ms: u64,
    /// Shortest word / obstacle length
    pub min_len: u32,
    /// Longest word / obstacle length
    pub max_len: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        StagePreset::default().config()
    }
}

impl StageConfig {
    pub fn new(base_steps_per_second: f64, base_spawn_ms: u64) -> Self {
        Self {
            base_steps_per_second,
            base_spawn_ms,
            ..Self::default()
        }
    }

    /// Clamp nonsensical values into a playable range
    pub fn sanitized(mut self) -> Self {
        if !self.base_steps_per_second.is_finite() || self.base_steps_per_second < 0.01 {
            log::warn!(
                "Stage speed {} out of range, using 0.01",
                self.base_steps_per_second
            );
            self.base_steps_per_second = 0.01;
        }
        self.base_spawn_ms = self.base_spawn_ms.max(1);
        self.min_len = self.min_len.max(1);
        self.max_len = self.max_len.max(self.min_len);
        self
    }
}

/// Tunable game rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Field ===
    /// Lane count
    pub columns: u32,
    /// Steps from spawn to ground contact
    pub ground_rows: u32,

    // === Difficulty ramp ===
    pub ramp_ratio: f64,
    pub initial_ramp_period_ms: u64,
    pub ramp_step_ms: u64,
    pub ramp_floor_ms: u64,
    pub spawn_lower_bound_ms: u64,
    pub step_floor_ms: u64,

    // === Hazards ===
    pub hazard_lifetime_ms: u64,

    // === Spawn safety ===
    /// Guess at player throughput, not a measured rate
    pub assumed_moves_per_second: f64,
    pub safety_margin_ms: u64,
    pub max_spawn_tries: u32,

    // === Words / input ===
    pub charset: String,
    /// Lowercase typed characters before buffering
    pub fold_case: bool,

    /// RNG seed for spawns and generated words
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: COLUMNS,
            ground_rows: GROUND_ROWS,

            ramp_ratio: RAMP_RATIO,
            initial_ramp_period_ms: INITIAL_RAMP_PERIOD_MS,
            ramp_step_ms: RAMP_STEP_MS,
            ramp_floor_ms: RAMP_FLOOR_MS,
            spawn_lower_bound_ms: SPAWN_MS_MIN,
            step_floor_ms: STEP_FLOOR_MS,

            hazard_lifetime_ms: HAZARD_LIFETIME_MS,

            assumed_moves_per_second: ASSUMED_MOVES_PER_SECOND,
            safety_margin_ms: SAFETY_MARGIN_MS,
            max_spawn_tries: MAX_SPAWN_TRIES,

            charset: LETTERS.to_string(),
            fold_case: true,

            seed: 0xC0FFEE,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write config as pretty JSON
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing config {}", path.display()))?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Clamp values that would break the round invariants
    pub fn sanitized(mut self) -> Self {
        // A span needs at least one free neighbor column
        if self.columns < 2 {
            log::warn!("columns={} too small, using 2", self.columns);
            self.columns = 2;
        }
        self.ground_rows = self.ground_rows.max(1);

        // Difficulty must never ease off
        if !self.ramp_ratio.is_finite() || self.ramp_ratio < 1.0 {
            log::warn!("ramp_ratio={} would reverse difficulty, using 1.0", self.ramp_ratio);
            self.ramp_ratio = 1.0;
        }
        self.ramp_floor_ms = self.ramp_floor_ms.max(1);
        self.initial_ramp_period_ms = self.initial_ramp_period_ms.max(self.ramp_floor_ms);
        self.spawn_lower_bound_ms = self.spawn_lower_bound_ms.max(1);
        self.step_floor_ms = self.step_floor_ms.max(1);

        // A landing must live for at least one collision check
        if self.hazard_lifetime_ms == 0 {
            log::warn!("hazard_lifetime_ms=0 would skip collision, using 1");
            self.hazard_lifetime_ms = 1;
        }

        if !self.assumed_moves_per_second.is_finite() || self.assumed_moves_per_second <= 0.0 {
            log::warn!(
                "assumed_moves_per_second={} invalid, using {}",
                self.assumed_moves_per_second,
                ASSUMED_MOVES_PER_SECOND
            );
            self.assumed_moves_per_second = ASSUMED_MOVES_PER_SECOND;
        }
        self.max_spawn_tries = self.max_spawn_tries.max(1);

        if !self.charset.chars().any(|c| !c.is_control() && !c.is_whitespace()) {
            log::warn!("Empty charset, using default letters");
            self.charset = LETTERS.to_string();
        }
        // Typed input is folded, so generated words must be too
        if self.fold_case {
            let folded = self.charset.to_lowercase();
            if folded != self.charset {
                log::warn!("charset {:?} lowercased to match case folding", self.charset);
                self.charset = folded;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_preset_from_number() {
        assert_eq!(StagePreset::from_number(1), Some(StagePreset::Stage1));
        assert_eq!(StagePreset::from_number(6), Some(StagePreset::Stage6));
        assert_eq!(StagePreset::from_number(0), None);
        assert_eq!(StagePreset::from_number(7), None);
    }

    #[test]
    fn test_presets_get_harder() {
        let configs: Vec<_> = STAGE_PRESETS.iter().map(|p| p.config()).collect();
        for pair in configs.windows(2) {
            assert!(pair[1].base_steps_per_second > pair[0].base_steps_per_second);
            assert!(pair[1].base_spawn_ms < pair[0].base_spawn_ms);
            assert!(pair[1].base_spawn_ms >= SPAWN_MS_MIN);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "columns": 12, "seed": 7 }"#).unwrap();
        assert_eq!(config.columns, 12);
        assert_eq!(config.seed, 7);
        assert_eq!(config.ground_rows, GROUND_ROWS);
        assert_eq!(config.hazard_lifetime_ms, HAZARD_LIFETIME_MS);
        assert!(config.fold_case);
    }

    #[test]
    fn test_sanitize_rejects_unwinnable_values() {
        let config = GameConfig {
            columns: 1,
            ramp_ratio: 0.5,
            assumed_moves_per_second: 0.0,
            charset: " ".to_string(),
            max_spawn_tries: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.columns, 2);
        assert_eq!(config.ramp_ratio, 1.0);
        assert_eq!(config.assumed_moves_per_second, ASSUMED_MOVES_PER_SECOND);
        assert_eq!(config.charset, LETTERS);
        assert_eq!(config.max_spawn_tries, 1);
    }

    #[test]
    fn test_stage_config_sanitize() {
        let stage = StageConfig {
            base_steps_per_second: -3.0,
            base_spawn_ms: 0,
            min_len: 0,
            max_len: 0,
        }
        .sanitized();
        assert_eq!(stage.base_steps_per_second, 0.01);
        assert_eq!(stage.base_spawn_ms, 1);
        assert_eq!(stage.min_len, 1);
        assert_eq!(stage.max_len, 1);
    }

    #[test]
    fn test_sanitize_floors_hazard_lifetime() {
        let config = GameConfig {
            hazard_lifetime_ms: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.hazard_lifetime_ms, 1);
    }

    #[test]
    fn test_sanitize_folds_charset_with_input() {
        let folded = GameConfig {
            charset: "ABcD".to_string(),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(folded.charset, "abcd");

        let kept = GameConfig {
            charset: "ABcD".to_string(),
            fold_case: false,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(kept.charset, "ABcD");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "typing-dodge-config-{}.json",
            std::process::id()
        ));
        let config = GameConfig {
            columns: 14,
            hazard_lifetime_ms: 500,
            charset: "xyz".to_string(),
            seed: 99,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = GameConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.columns, 14);
        assert_eq!(loaded.hazard_lifetime_ms, 500);
        assert_eq!(loaded.charset, "xyz");
        assert_eq!(loaded.seed, 99);
        assert_eq!(loaded.ground_rows, GROUND_ROWS);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("typing-dodge-no-such-config.json");
        assert!(GameConfig::load(&path).is_err());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(GameConfig::from_json("{ not json").is_err());
        assert!(GameConfig::from_json(r#"{ "columns": "ten" }"#).is_err());
    }
}
