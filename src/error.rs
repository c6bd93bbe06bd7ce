//! Contains the `Error` and `Result` types that the cluster cursor manager uses.

use std::sync::Arc;

use thiserror::Error;

/// The result type for all methods that can return an error in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while registering, checking out, killing, or reaping a cursor.
///
/// The inner [`ErrorKind`] is wrapped in an `Arc` to allow the error to be cloned, mirroring the
/// way the manager's own errors are surfaced to multiple concurrent callers.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    pub(crate) fn cursor_not_found() -> Self {
        ErrorKind::CursorNotFound.into()
    }

    pub(crate) fn cursor_in_use() -> Self {
        ErrorKind::CursorInUse.into()
    }

    /// Whether this is a [`ErrorKind::CursorNotFound`] error.
    pub fn is_cursor_not_found(&self) -> bool {
        matches!(*self.kind, ErrorKind::CursorNotFound)
    }

    /// Whether this is a [`ErrorKind::CursorInUse`] error.
    pub fn is_cursor_in_use(&self) -> bool {
        matches!(*self.kind, ErrorKind::CursorInUse)
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Error::new(err.into())
    }
}

/// The types of errors that can occur.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No cursor matches the given namespace and id, or a cursor matched but has already been
    /// killed. The two cases are indistinguishable on purpose: a client that "get more"s a killed
    /// cursor should not be able to tell the difference from an id that never existed.
    #[error("cursor not found")]
    CursorNotFound,

    /// A cursor matching the given namespace and id exists, but is currently pinned by another
    /// caller.
    #[error("cursor already in use")]
    CursorInUse,

    /// An error returned by the external cursor's `advance` capability. Forwarded unchanged,
    /// aside from the wrapping necessary to give it a uniform type across every kind of cursor
    /// the manager can hold.
    #[error("error advancing cursor: {0}")]
    Advance(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl ErrorKind {
    pub(crate) fn advance(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Advance(Arc::from(err))
    }
}
