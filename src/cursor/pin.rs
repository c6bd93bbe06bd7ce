use bson::Document;

use super::{id::CursorId, manager::ClusterCursorManager, Cursor};
use crate::error::{Error, ErrorKind, Result};

/// The disposition a caller reports when returning a checked-out cursor to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The cursor has more results; return it to the registry for a later checkout.
    NotExhausted,
    /// The cursor has been fully drained (or the caller is discarding it); remove its entry.
    Exhausted,
}

/// What happens to the underlying cursor when a [`PinnedCursor`] is consumed.
pub(super) enum ReturnDisposition {
    NotExhausted,
    Exhausted,
    /// The pin was dropped (or move-assigned over) without an explicit
    /// [`return_cursor`](PinnedCursor::return_cursor) call.
    ImplicitKill,
}

/// Scoped, move-only exclusive ownership of a checked-out cursor.
///
/// Obtained from [`ClusterCursorManager::register_cursor`] or
/// [`ClusterCursorManager::check_out_cursor`]. While a `PinnedCursor` is alive, no other caller
/// can check out the same cursor id; dropping it without calling
/// [`return_cursor`](Self::return_cursor) guarantees the cursor is not leaked (see the type-level
/// docs on [`Drop`] below).
///
/// A default-constructed `PinnedCursor` (via [`Default::default`]) owns no cursor and reports id
/// [`CursorId::NONE`].
pub struct PinnedCursor {
    id: CursorId,
    cursor: Option<Box<dyn Cursor>>,
    manager: Option<ClusterCursorManager>,
}

impl PinnedCursor {
    pub(super) fn new(id: CursorId, cursor: Box<dyn Cursor>, manager: ClusterCursorManager) -> Self {
        Self {
            id,
            cursor: Some(cursor),
            manager: Some(manager),
        }
    }

    /// Returns the id of the pinned cursor, or `CursorId::NONE` if this pin owns no cursor.
    pub fn get_cursor_id(&self) -> CursorId {
        self.id
    }

    /// Advances the underlying cursor by one result.
    ///
    /// `Ok(None)` means the cursor is exhausted. Errors are forwarded from the underlying
    /// cursor's `advance` capability unchanged; they do not implicitly kill the cursor, so the
    /// caller may retry or call [`return_cursor`](Self::return_cursor) with
    /// [`CursorState::Exhausted`] to discard it.
    ///
    /// # Panics
    ///
    /// Panics if this pin owns no cursor (i.e. it is default-constructed or has already been
    /// returned).
    pub fn next(&mut self) -> Result<Option<Document>> {
        let cursor = self
            .cursor
            .as_mut()
            .expect("PinnedCursor::next called on a pin holding no cursor");
        cursor.advance().map_err(|err| Error::new(ErrorKind::advance(err)))
    }

    /// Returns the cursor to the registry.
    ///
    /// If `state` is [`CursorState::Exhausted`], the entry is removed from the registry and its
    /// category counter decremented (unless a concurrent kill already decremented it). If
    /// [`CursorState::NotExhausted`], the entry's pin is cleared so a later caller can check it
    /// out again.
    pub fn return_cursor(mut self, state: CursorState) {
        let id = self.id;
        if let (Some(cursor), Some(manager)) = (self.cursor.take(), self.manager.take()) {
            let disposition = match state {
                CursorState::NotExhausted => ReturnDisposition::NotExhausted,
                CursorState::Exhausted => ReturnDisposition::Exhausted,
            };
            manager.handle_return(id, cursor, disposition);
        }
    }
}

impl Default for PinnedCursor {
    fn default() -> Self {
        Self {
            id: CursorId::NONE,
            cursor: None,
            manager: None,
        }
    }
}

/// Dropping (or move-assigning over) a `PinnedCursor` that still owns a cursor performs an
/// implicit kill-and-return: the underlying entry is marked killed, its counter decremented, and
/// the cursor handle restored to the registry for the next [`reap_zombie_cursors`][1] pass to
/// finalize. This is the mechanism that guarantees no cursor is ever leaked, even on an error
/// path that bypasses [`return_cursor`](PinnedCursor::return_cursor).
///
/// [1]: super::ClusterCursorManager::reap_zombie_cursors
impl Drop for PinnedCursor {
    fn drop(&mut self) {
        let id = self.id;
        if let (Some(cursor), Some(manager)) = (self.cursor.take(), self.manager.take()) {
            manager.handle_return(id, cursor, ReturnDisposition::ImplicitKill);
        }
    }
}
