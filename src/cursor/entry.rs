use std::time::Instant;

use super::{id::CursorId, Cursor};
use crate::Namespace;

/// The statistics bucket a cursor contributes to. Drives counters only; it does not change the
/// manager's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorType {
    /// The cursor fans out across multiple shards.
    Sharded,
    /// The cursor targets a single, unsharded collection.
    NotSharded,
}

/// Whether a cursor is eligible for idle-timeout reaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorLifetime {
    /// Eligible for idle-timeout reaping via [`reap_with_timeout`][1].
    ///
    /// [1]: super::ClusterCursorManager::reap_with_timeout
    Mortal,
    /// Never reclaimed on idleness; only an explicit kill or exhaustion removes it.
    Immortal,
}

/// The manager's per-cursor record.
///
/// `cursor` is `Some` iff the underlying cursor currently lives in the registry (i.e. `pinned`
/// is `false`); exactly one of "`cursor` present" or "`pinned`" holds at all times, matching
/// invariant (I3).
pub(super) struct Entry {
    pub(super) id: CursorId,
    pub(super) namespace: Namespace,
    pub(super) cursor_type: CursorType,
    pub(super) lifetime: CursorLifetime,
    pub(super) cursor: Option<Box<dyn Cursor>>,
    pub(super) pinned: bool,
    pub(super) kill_pending: bool,
    /// Cleared atomically (under the registry lock) on the first counter decrement, so a
    /// double-kill or a kill racing an exhausting return can never double-decrement the category
    /// counter for this entry.
    pub(super) counted: bool,
    pub(super) last_active: Instant,
}

impl Entry {
    /// Creates an entry that is immediately pinned: the freshly registered cursor is handed
    /// straight to the caller's [`PinnedCursor`](super::PinnedCursor), never stored here.
    pub(super) fn new_pinned(
        id: CursorId,
        namespace: Namespace,
        cursor_type: CursorType,
        lifetime: CursorLifetime,
        now: Instant,
    ) -> Self {
        Self {
            id,
            namespace,
            cursor_type,
            lifetime,
            cursor: None,
            pinned: true,
            kill_pending: false,
            counted: true,
            last_active: now,
        }
    }

    pub(super) fn is_reapable(&self) -> bool {
        self.kill_pending && !self.pinned
    }
}
