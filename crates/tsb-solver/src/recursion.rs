//! Recursion guard for cycle detection, depth limiting and iteration
//! bounding in recursive type computations.
//!
//! Symbols carry their own `Resolving` marker for lazy resolution; this guard
//! covers the computations that are keyed by something other than a single
//! symbol, such as a `(source, target, relation)` triple or a pair of types
//! walked during inference.
//!
//! [`RecursionProfile`] names the limit presets so call sites say what they
//! are guarding rather than repeating numbers:
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::Inference);
//! ```

use std::hash::Hash;

use rustc_hash::FxHashMap;
use tsb_common::limits;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Structural relation of recursive types. Legitimately nests deeply
    /// before the in-progress cache catches a cycle.
    ///
    /// depth = 100, iterations = 100,000
    Relation,

    /// Walking argument and parameter types in parallel during inference.
    ///
    /// depth = 50, iterations = 100,000
    Inference,

    /// Collecting the free type parameters of an anonymous type.
    ///
    /// depth = 20
    ShallowTraversal,

    /// Expression resolution in the checker.
    ///
    /// depth = 500
    ExpressionCheck,

    /// Custom limits, e.g. from analysis options.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::Relation => limits::MAX_RELATION_DEPTH,
            Self::Inference => limits::MAX_INSTANTIATION_DEPTH,
            Self::ShallowTraversal => 20,
            Self::ExpressionCheck => limits::MAX_EXPRESSION_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::Relation | Self::Inference | Self::ShallowTraversal | Self::ExpressionCheck => {
                limits::MAX_RELATION_ITERATIONS
            }
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Visiting set plus depth and iteration counters.
///
/// Each key being visited remembers the depth it was entered at, so callers
/// can tell how far up the stack a cycle closes. Every successful
/// [`enter`](Self::enter) must be paired with exactly one
/// [`leave`](Self::leave) of the same key.
#[derive(Debug)]
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashMap<K, u32>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashMap::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.max_iterations {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        if self.visiting.contains_key(&key) {
            return RecursionResult::Cycle;
        }
        self.visiting.insert(key, self.depth);
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key).is_some();
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not being visited"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Depth at which `key` was entered, while it is being visited.
    #[inline]
    pub fn entered_at(&self, key: &K) -> Option<u32> {
        self.visiting.get(key).copied()
    }

    /// Number of keys currently being visited.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard for computations that may revisit the same key, such as
/// resolving one expression under different contextual types.
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
}

impl DepthCounter {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            depth: 0,
            max_depth: profile.max_depth(),
        }
    }

    /// Returns `false` (and enters nothing) when the limit is reached.
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() called at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
