//! The cluster cursor manager: the registry that owns long-lived, paginated query cursors on a
//! routing node.
//!
//! See [`ClusterCursorManager`] for the entry point.

mod entry;
mod id;
mod manager;
mod pin;

use bson::Document;

pub use self::{
    entry::{CursorLifetime, CursorType},
    id::CursorId,
    manager::{ClusterCursorManager, ClusterCursorManagerOptions, CursorStats},
    pin::{CursorState, PinnedCursor},
};

/// A type-erased error from an external [`Cursor`]'s [`advance`](Cursor::advance) call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The capability the manager needs from an opaque, externally supplied cursor.
///
/// A `Cursor` produces a finite or terminating lazy sequence of result documents. The manager
/// invokes only this capability set on it; everything else about the underlying query plan,
/// snapshot, or network fan-out is invisible to the manager.
pub trait Cursor: Send {
    /// Produces the next result document, or `Ok(None)` if the cursor is exhausted.
    ///
    /// May block the calling thread, e.g. while awaiting data from a remote node. Errors are
    /// forwarded to the caller unchanged; they do not implicitly kill the cursor.
    fn advance(&mut self) -> std::result::Result<Option<Document>, BoxError>;

    /// Releases any resources held by this cursor.
    ///
    /// Must be idempotent and infallible. The manager invokes this at most once per cursor, and
    /// only once no caller can still be holding it pinned.
    fn kill(&mut self);
}
