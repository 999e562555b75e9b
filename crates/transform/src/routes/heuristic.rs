//! Heuristic route generalization
//!
//! Paths that match no template are reduced to a shape: every segment that
//! looks like a generated identifier (numbers, UUIDs, hashes, random
//! tokens) becomes the wildcard text, everything that reads like a word is
//! kept.
//!
//! ```text
//! /customer/1/job/2           → /customer/*/job/*
//! /customer/lfdsjd/job/erwejre → /customer/*/job/*
//! /api/v1/orders              → /api/v1/orders
//! ```
//!
//! # Memo
//!
//! Generalization runs once per distinct path. Two LRU levels keep the
//! results:
//!
//! 1. **Paths**: path hash → (path, label)
//! 2. **Shapes**: shape hash → label, so every path of one shape shares a
//!    single allocation
//!
//! Generalization is deterministic, so eviction only costs recomputation.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use xxhash_rust::xxh3::xxh3_64;

use super::strip_query;

#[cfg(test)]
#[path = "heuristic_test.rs"]
mod tests;

/// Segments kept before the rest of the path collapses into one wildcard
pub const MAX_SEGMENTS: usize = 10;

/// Alphabetic segments up to this length are always kept
const SHORT_WORD_LEN: usize = 3;

/// Longest alphabetic segment that can still be a word
const MAX_WORD_LEN: usize = 32;

/// Longest consonant run in a word
const MAX_CONSONANT_RUN: usize = 4;

/// Shortest hex token treated as an identifier
const MIN_HEX_LEN: usize = 12;

/// Memo statistics
#[derive(Debug, Default)]
pub struct HeuristicStats {
    /// Total lookups
    pub lookups: AtomicU64,

    /// Path level hits
    pub path_hits: AtomicU64,

    /// Misses whose shape was already known
    pub shape_hits: AtomicU64,

    /// Distinct shapes interned
    pub shapes: AtomicU64,
}

impl HeuristicStats {
    /// Fraction of lookups answered without generalizing (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.path_hits.load(Ordering::Relaxed);
        let total = self.lookups.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Generalizes unmatched paths into low-cardinality labels
pub struct HeuristicClassifier {
    wildcard: String,

    /// Path hash → (path, label); the path is compared on hit
    paths: Mutex<LruCache<u64, (Box<str>, Arc<str>)>>,

    /// Shape hash → label
    shapes: Mutex<LruCache<u64, Arc<str>>>,

    /// Bound of each level, 0 for unbounded
    capacity: usize,

    stats: HeuristicStats,
}

impl HeuristicClassifier {
    /// Create a classifier; `capacity == 0` leaves the memo unbounded
    pub fn new(wildcard: impl Into<String>, capacity: usize) -> Self {
        Self {
            wildcard: wildcard.into(),
            paths: Mutex::new(new_cache(capacity)),
            shapes: Mutex::new(new_cache(capacity)),
            capacity,
            stats: HeuristicStats::default(),
        }
    }

    /// Label for a path, memoized
    pub fn classify(&self, path: &str) -> Arc<str> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);

        let path = strip_query(path);
        let path_hash = xxh3_64(path.as_bytes());

        if let Some((memoized, label)) = self.paths.lock().get(&path_hash)
            && **memoized == *path
        {
            self.stats.path_hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(label);
        }

        let shape = self.generalize(path);
        let label = self.intern(shape);

        self.paths
            .lock()
            .put(path_hash, (Box::from(path), Arc::clone(&label)));
        label
    }

    /// Shape of a path, without touching the memo
    pub fn generalize(&self, path: &str) -> String {
        let path = strip_query(path);
        let mut out = String::with_capacity(path.len());
        let mut kept = 0;

        for (i, segment) in path.split('/').enumerate() {
            if i > 0 {
                out.push('/');
            }
            if segment.is_empty() {
                continue;
            }
            if kept == MAX_SEGMENTS {
                out.push_str(&self.wildcard);
                break;
            }
            kept += 1;
            if is_identifier(segment) {
                out.push_str(&self.wildcard);
            } else {
                out.push_str(segment);
            }
        }
        out
    }

    fn intern(&self, shape: String) -> Arc<str> {
        let shape_hash = xxh3_64(shape.as_bytes());
        let mut shapes = self.shapes.lock();

        if let Some(label) = shapes.get(&shape_hash)
            && **label == *shape
        {
            self.stats.shape_hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(label);
        }

        self.stats.shapes.fetch_add(1, Ordering::Relaxed);
        let label: Arc<str> = Arc::from(shape);
        shapes.put(shape_hash, Arc::clone(&label));
        label
    }

    /// Wildcard text substituted for identifiers
    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    /// Memo statistics
    pub fn stats(&self) -> &HeuristicStats {
        &self.stats
    }

    /// Paths currently memoized
    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shapes currently interned
    pub fn shape_count(&self) -> usize {
        self.shapes.lock().len()
    }

    /// Memo bound, 0 for unbounded
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for HeuristicClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicClassifier")
            .field("wildcard", &self.wildcard)
            .field("capacity", &self.capacity)
            .field("paths", &self.len())
            .field("shapes", &self.shape_count())
            .finish()
    }
}

fn new_cache<V>(capacity: usize) -> LruCache<u64, V> {
    match NonZeroUsize::new(capacity) {
        Some(capacity) => LruCache::new(capacity),
        None => LruCache::unbounded(),
    }
}

/// Whether a path segment looks like a generated identifier
pub fn is_identifier(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    if bytes.len() >= MIN_HEX_LEN && bytes.iter().all(u8::is_ascii_hexdigit) {
        return true;
    }

    let mut non_letters = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.is_ascii_alphabetic());
    match (non_letters.next(), non_letters.next()) {
        (None, _) => !looks_like_word(bytes),
        // v1, v2, h2c
        (Some((1, b)), None) if b.is_ascii_digit() => false,
        _ => true,
    }
}

/// Phonotactic check on an alphabetic segment
fn looks_like_word(letters: &[u8]) -> bool {
    if letters.len() <= SHORT_WORD_LEN {
        return true;
    }
    if letters.len() > MAX_WORD_LEN {
        return false;
    }

    let mut has_vowel = false;
    let mut consonant_run = 0;
    let mut same_run = 0;
    let mut prev = 0u8;

    for (i, &b) in letters.iter().enumerate() {
        let c = b.to_ascii_lowercase();

        if is_vowel(c) {
            has_vowel = true;
            consonant_run = 0;
        } else {
            consonant_run += 1;
            if consonant_run > MAX_CONSONANT_RUN {
                return false;
            }
        }

        same_run = if c == prev { same_run + 1 } else { 1 };
        if same_run >= 3 {
            return false;
        }
        prev = c;

        if c == b'j' && i > 0 {
            let next = letters.get(i + 1).map(u8::to_ascii_lowercase);
            if !next.is_some_and(is_vowel) {
                return false;
            }
        }
    }

    has_vowel
}

#[inline]
fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u' | b'y')
}
