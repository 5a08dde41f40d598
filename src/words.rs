//! Word sources for the left/right target words
//!
//! The round only ever calls [`WordSource::next_word`], which must not block.
//! Bulk refills from an external list go through [`CachedWords::refill`] and
//! happen ahead of need, never during a movement commit.

use std::collections::VecDeque;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Supplies target words on demand
pub trait WordSource {
    /// Next word; never empty
    fn next_word(&mut self) -> String;

    /// Stage word length range (sources may ignore it)
    fn set_length_range(&mut self, _min_len: u32, _max_len: u32) {}

    /// Top up any internal buffer from a slow backing store
    fn refill(&mut self) {}

    /// True when `refill` would be worthwhile
    fn needs_refill(&self) -> bool {
        false
    }
}

impl<W: WordSource + ?Sized> WordSource for Box<W> {
    fn next_word(&mut self) -> String {
        (**self).next_word()
    }

    fn set_length_range(&mut self, min_len: u32, max_len: u32) {
        (**self).set_length_range(min_len, max_len)
    }

    fn refill(&mut self) {
        (**self).refill()
    }

    fn needs_refill(&self) -> bool {
        (**self).needs_refill()
    }
}

/// Local generator: random length in range, characters from a fixed charset
#[derive(Debug, Clone)]
pub struct RandomWords {
    rng: Pcg32,
    charset: Vec<char>,
    min_len: u32,
    max_len: u32,
}

impl RandomWords {
    pub fn new(charset: &str, seed: u64) -> Self {
        let mut charset: Vec<char> = charset
            .chars()
            .filter(|c| !c.is_control() && !c.is_whitespace())
            .collect();
        if charset.is_empty() {
            charset = crate::consts::LETTERS.chars().collect();
        }
        Self {
            rng: Pcg32::seed_from_u64(seed),
            charset,
            min_len: 1,
            max_len: 3,
        }
    }

    pub fn with_length_range(mut self, min_len: u32, max_len: u32) -> Self {
        self.set_length_range(min_len, max_len);
        self
    }

    pub fn length_range(&self) -> (u32, u32) {
        (self.min_len, self.max_len)
    }
}

impl WordSource for RandomWords {
    fn next_word(&mut self) -> String {
        let len = self.rng.random_range(self.min_len..=self.max_len);
        (0..len)
            .filter_map(|_| self.charset.choose(&mut self.rng).copied())
            .collect()
    }

    fn set_length_range(&mut self, min_len: u32, max_len: u32) {
        self.min_len = min_len.max(1);
        self.max_len = max_len.max(self.min_len);
    }
}

/// Bulk supplier of words (e.g. a downloaded word list)
pub trait WordProvider {
    /// Up to `count` words; may return fewer, or none when exhausted
    fn fetch(&mut self, count: usize) -> Vec<String>;
}

/// In-memory word list handed out in shuffled order
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
    cursor: usize,
    rng: Pcg32,
}

impl WordList {
    /// Keeps only non-empty alphabetic words, lowercased
    pub fn new<I, S>(words: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty() && w.chars().all(char::is_alphabetic))
            .collect();
        let mut list = Self {
            words,
            cursor: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        list.shuffle();
        list
    }

    /// Whitespace separated words
    pub fn from_text(text: &str, seed: u64) -> Self {
        Self::new(text.split_whitespace(), seed)
    }

    /// JSON array of strings
    pub fn from_json(json: &str, seed: u64) -> Result<Self, serde_json::Error> {
        let words: Vec<String> = serde_json::from_str(json)?;
        Ok(Self::new(words, seed))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn shuffle(&mut self) {
        self.words.shuffle(&mut self.rng);
        self.cursor = 0;
    }
}

impl WordProvider for WordList {
    fn fetch(&mut self, count: usize) -> Vec<String> {
        if self.words.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            if self.cursor >= self.words.len() {
                self.shuffle();
            }
            out.push(self.words[self.cursor].clone());
            self.cursor += 1;
        }
        out
    }
}

/// Owned word cache in front of a [`WordProvider`], with local fallback
#[derive(Debug, Clone)]
pub struct CachedWords<P> {
    provider: P,
    cache: VecDeque<String>,
    capacity: usize,
    low_water: usize,
    fallback: RandomWords,
    fallback_served: u64,
}

impl<P: WordProvider> CachedWords<P> {
    pub fn new(provider: P, capacity: usize, fallback: RandomWords) -> Self {
        let capacity = capacity.max(1);
        Self {
            provider,
            cache: VecDeque::with_capacity(capacity),
            capacity,
            low_water: capacity / 4,
            fallback,
            fallback_served: 0,
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Words served by the local generator because the cache ran dry
    pub fn fallback_served(&self) -> u64 {
        self.fallback_served
    }

    fn in_range(&self, word: &str) -> bool {
        let (min_len, max_len) = self.fallback.length_range();
        let len = word.chars().count() as u32;
        (min_len..=max_len).contains(&len)
    }
}

impl<P: WordProvider> WordSource for CachedWords<P> {
    fn next_word(&mut self) -> String {
        match self.cache.pop_front() {
            Some(word) => word,
            None => {
                self.fallback_served += 1;
                log::debug!("Word cache empty, using local generator");
                self.fallback.next_word()
            }
        }
    }

    fn set_length_range(&mut self, min_len: u32, max_len: u32) {
        self.fallback.set_length_range(min_len, max_len);
        let before = self.cache.len();
        let (min_len, max_len) = self.fallback.length_range();
        self.cache.retain(|w| {
            let len = w.chars().count() as u32;
            (min_len..=max_len).contains(&len)
        });
        if self.cache.len() != before {
            log::debug!(
                "Dropped {} cached words outside {}-{}",
                before - self.cache.len(),
                min_len,
                max_len
            );
        }
    }

    fn refill(&mut self) {
        let wanted = self.capacity - self.cache.len();
        if wanted == 0 {
            return;
        }
        let fetched = self.provider.fetch(wanted);
        let count = fetched.len();
        for word in fetched {
            if self.in_range(&word) {
                self.cache.push_back(word);
            }
        }
        log::debug!(
            "Word cache refill: fetched {}, cached {}/{}",
            count,
            self.cache.len(),
            self.capacity
        );
    }

    fn needs_refill(&self) -> bool {
        self.cache.len() <= self.low_water
    }
}
