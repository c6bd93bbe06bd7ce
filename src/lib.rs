#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::cast_possible_wrap)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod cursor;
pub mod error;
mod namespace;

pub use crate::{
    cursor::{
        BoxError,
        ClusterCursorManager,
        ClusterCursorManagerOptions,
        Cursor,
        CursorId,
        CursorLifetime,
        CursorStats,
        CursorState,
        PinnedCursor,
    },
    namespace::Namespace,
};

pub use ::bson;
