//! Demo-mode typist
//!
//! Picks the word that walks the player toward the nearest column no
//! obstacle or hazard currently covers.

use super::state::GameState;

/// Word to commit right now, or `None` if the player should stay put
pub fn suggest_commit(state: &GameState) -> Option<String> {
    let col = state.player_col();
    if !is_threatened(state, col) {
        return None;
    }

    let columns = state.config().columns;
    for distance in 1..columns {
        let left = col.checked_sub(distance).filter(|&c| !is_threatened(state, c));
        let right = Some(col + distance).filter(|&c| c < columns && !is_threatened(state, c));
        match (left, right) {
            (Some(_), _) => return Some(state.words().left.clone()),
            (None, Some(_)) => return Some(state.words().right.clone()),
            (None, None) => {}
        }
    }
    None
}

/// Column is under a falling obstacle or a live hazard
pub fn is_threatened(state: &GameState, col: u32) -> bool {
    state.obstacles().iter().any(|o| o.covers(col))
        || state.hazards().iter().any(|h| h.covers(col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GameConfig, StageConfig};

    fn state() -> GameState {
        GameState::new(GameConfig::default(), StageConfig::new(1.0, 1_000_000))
    }

    #[test]
    fn test_idle_when_safe() {
        let mut state = state();
        state.debug_spawn(0, 2);
        assert_eq!(suggest_commit(&state), None);
    }

    #[test]
    fn test_escapes_toward_nearest_free_column() {
        // Player at 5; span 5..=6 leaves column 4 one step away
        let mut near_left = state();
        near_left.debug_spawn(5, 2);
        assert_eq!(suggest_commit(&near_left), Some(near_left.words().left.clone()));

        // Span 0..=5 only opens up to the right
        let mut wall_left = state();
        wall_left.debug_spawn(0, 6);
        assert_eq!(suggest_commit(&wall_left), Some(wall_left.words().right.clone()));

        // Span 3..=7 ties at distance 3; left wins
        let mut tie = state();
        tie.debug_spawn(3, 5);
        assert_eq!(suggest_commit(&tie), Some(tie.words().left.clone()));
    }

    #[test]
    fn test_hazards_count_as_threats() {
        let mut state = state();
        state.debug_spawn(7, 2);
        crate::sim::tick(&mut state, 24_000);
        assert!(state.obstacles().is_empty());
        assert_eq!(state.hazards().len(), 1);
        assert!(is_threatened(&state, 7));
        assert!(is_threatened(&state, 8));
        assert!(!is_threatened(&state, 6));
        assert_eq!(suggest_commit(&state), None);
    }
}
