//! Typed input and word-match movement
//!
//! The host forwards key events; a commit compares the buffer against the two
//! target words and moves the player one column on an exact match.

use serde::{Deserialize, Serialize};

use crate::consts::WORD_REDRAW_ATTEMPTS;
use crate::words::WordSource;

/// Key events forwarded by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Backspace,
    /// Submit the buffer (Enter)
    Commit,
}

/// Characters typed since the last commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a printable character; returns false if it was ignored
    pub fn append(&mut self, ch: char, fold_case: bool) -> bool {
        if !is_printable(ch) {
            return false;
        }
        if fold_case {
            self.text.extend(ch.to_lowercase());
        } else {
            self.text.push(ch);
        }
        true
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Visible characters only: no controls, zero-width marks or line separators
fn is_printable(ch: char) -> bool {
    !ch.is_control()
        && !matches!(ch, '\u{200b}'..='\u{200f}' | '\u{2028}' | '\u{2029}' | '\u{feff}')
}

/// The two words currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWords {
    /// Typing this moves the player toward column 0
    pub left: String,
    /// Typing this moves the player toward the last column
    pub right: String,
}

impl TargetWords {
    /// Draw a fresh pair, kept distinct where the source allows
    pub fn generate<W: WordSource + ?Sized>(source: &mut W) -> Self {
        let left = source.next_word();
        let right = draw_distinct(source, &left, &left);
        Self { left, right }
    }
}

/// Result of one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Buffer was empty; nothing happened
    Empty,
    /// Buffer matched neither word
    NoMatch,
    MovedLeft { from: u32, to: u32 },
    MovedRight { from: u32, to: u32 },
}

impl MoveOutcome {
    pub fn matched(&self) -> bool {
        matches!(self, MoveOutcome::MovedLeft { .. } | MoveOutcome::MovedRight { .. })
    }
}

/// Compare the buffer against both words, move on an exact match, clear the buffer.
///
/// Left is checked first, so it wins if both words are equal.
pub fn commit<W: WordSource + ?Sized>(
    buffer: &mut InputBuffer,
    words: &mut TargetWords,
    player_col: &mut u32,
    columns: u32,
    source: &mut W,
) -> MoveOutcome {
    if buffer.is_empty() {
        return MoveOutcome::Empty;
    }

    let from = *player_col;
    let outcome = if buffer.as_str() == words.left {
        *player_col = from.saturating_sub(1);
        words.left = draw_distinct(source, &words.left, &words.right);
        MoveOutcome::MovedLeft {
            from,
            to: *player_col,
        }
    } else if buffer.as_str() == words.right {
        *player_col = (from + 1).min(columns.saturating_sub(1));
        words.right = draw_distinct(source, &words.right, &words.left);
        MoveOutcome::MovedRight {
            from,
            to: *player_col,
        }
    } else {
        MoveOutcome::NoMatch
    };

    buffer.clear();
    outcome
}

/// Next word from `source` that differs from both `consumed` and `other`.
///
/// Gives up after a bounded number of redraws and keeps the last draw.
fn draw_distinct<W: WordSource + ?Sized>(source: &mut W, consumed: &str, other: &str) -> String {
    let mut word = source.next_word();
    for _ in 1..WORD_REDRAW_ATTEMPTS {
        if word != consumed && word != other {
            break;
        }
        word = source.next_word();
    }
    word
}
