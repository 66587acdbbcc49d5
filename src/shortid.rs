use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{fmt, sync::Mutex};

/// Symbols a generated short id is drawn from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_LENGTH: usize = 6;
pub const MAX_LENGTH: usize = 32;

/// First path segments owned by static routes. A short id spelled like one of
/// these would be shadowed by the route and never redirect.
pub const RESERVED: &[&str] = &["health", "shorten", "stats", "urls", "delete", "todo"];

/// A short identifier whose characters all come from [`ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortId(String);

impl ShortId {
    /// Accepts `s` if it is non-empty, at most [`MAX_LENGTH`] long and
    /// alphanumeric ASCII.
    pub fn parse(s: &str) -> Option<Self> {
        let ok = !s.is_empty() && s.len() <= MAX_LENGTH && s.bytes().all(|b| ALPHABET.contains(&b));
        ok.then(|| Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        RESERVED.contains(&self.0.as_str())
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of candidate short ids.
///
/// Generators know nothing about storage; the allocator checks each
/// candidate against the store.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self) -> ShortId;
}

/// Samples each character independently and uniformly from [`ALPHABET`].
///
/// Not cryptographically secure. Short ids are public path segments, not
/// access tokens.
#[derive(Debug)]
pub struct RandomGenerator {
    rng: Mutex<StdRng>,
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Self {
        Self::with_rng(StdRng::from_entropy(), length)
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64, length: usize) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), length)
    }

    fn with_rng(rng: StdRng, length: usize) -> Self {
        Self {
            rng: Mutex::new(rng),
            length: length.clamp(1, MAX_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH)
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortId {
        // A poisoned lock still holds a usable RNG.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let id = (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        ShortId(id)
    }
}
