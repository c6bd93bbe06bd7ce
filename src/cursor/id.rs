use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use rand::Rng;

/// A cursor identifier, unique among the cursors currently registered with a given
/// [`ClusterCursorManager`](super::ClusterCursorManager).
///
/// `0` is reserved to mean "no cursor" and is never returned by [`registerCursor`][1]; it is the
/// id reported by a default-constructed [`PinnedCursor`](super::PinnedCursor).
///
/// [1]: super::ClusterCursorManager::register_cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(u64);

impl CursorId {
    /// The reserved "no cursor" id.
    pub const NONE: CursorId = CursorId(0);

    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value of this id.
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CursorId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

/// Generates fresh, process-unique cursor ids.
///
/// A monotonic counter is XORed with a per-process random seed, per the original system's
/// guidance that ids need not be unguessable but must not collide with recently-issued live ids.
/// Collisions (including the reserved `0`) are handled by re-rolling the seed and trying again.
pub(crate) struct CursorIdGenerator {
    counter: AtomicU64,
    seed: u64,
}

impl CursorIdGenerator {
    pub(crate) fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            seed: rand::rng().random(),
        }
    }

    /// Produces an id not equal to `CursorId::NONE` and for which `is_taken` returns `false`.
    pub(crate) fn generate(&self, is_taken: impl Fn(CursorId) -> bool) -> CursorId {
        loop {
            let counter = self.counter.fetch_add(1, Ordering::Relaxed);
            let candidate = CursorId::new(counter ^ self.seed);
            if candidate.is_none() || is_taken(candidate) {
                continue;
            }
            return candidate;
        }
    }
}

impl fmt::Debug for CursorIdGenerator {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("CursorIdGenerator")
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
