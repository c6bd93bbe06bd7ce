use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use typed_builder::TypedBuilder;

use super::{
    entry::{CursorLifetime, CursorType, Entry},
    id::{CursorId, CursorIdGenerator},
    pin::{PinnedCursor, ReturnDisposition},
    Cursor,
};
use crate::{
    error::{Error, Result},
    Namespace,
};

/// A snapshot of the live cursor counts per [`CursorType`] bucket.
///
/// Each of these is the exact number of `Entry`s with the matching category that are neither
/// exhausted-and-removed nor marked killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorStats {
    /// Live cursors whose `CursorType` is `Sharded`.
    pub cursors_sharded: u64,
    /// Live cursors whose `CursorType` is `NotSharded`.
    pub cursors_not_sharded: u64,
}

impl CursorStats {
    fn increment(&mut self, cursor_type: CursorType) {
        match cursor_type {
            CursorType::Sharded => self.cursors_sharded += 1,
            CursorType::NotSharded => self.cursors_not_sharded += 1,
        }
    }

    fn decrement(&mut self, cursor_type: CursorType) {
        match cursor_type {
            CursorType::Sharded => self.cursors_sharded -= 1,
            CursorType::NotSharded => self.cursors_not_sharded -= 1,
        }
    }
}

/// Options controlling the optional idle-timeout sweep ([`ClusterCursorManager::reap_with_timeout`]).
///
/// The manager itself has no other tunables: every other behavior in spec.md's data model is
/// driven entirely by the per-cursor `CursorType`/`CursorLifetime` supplied at registration.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ClusterCursorManagerOptions {
    /// How long a `Mortal` cursor may sit idle (unpinned, unkilled) before
    /// [`reap_with_timeout`](ClusterCursorManager::reap_with_timeout) kills it.
    #[builder(default = Duration::from_secs(10 * 60))]
    pub cursor_timeout: Duration,
}

impl Default for ClusterCursorManagerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

struct State {
    entries: HashMap<CursorId, Entry>,
    stats: CursorStats,
}

struct Inner {
    state: Mutex<State>,
    id_generator: CursorIdGenerator,
    options: ClusterCursorManagerOptions,
}

/// The namespace-partitioned registry owning every live cursor on this routing node.
///
/// `ClusterCursorManager` is cheaply cloneable (it is a thin handle around a shared, mutex-guarded
/// registry, the same way the rest of this codebase's handles wrap an `Arc`'d inner state); every
/// clone refers to the same underlying registry. A single mutex protects the entire map and its
/// statistics counters; no registry operation holds that mutex while performing external work —
/// see [`reap_zombie_cursors`](Self::reap_zombie_cursors) for the one case (destroying a cursor)
/// where that distinction matters.
#[derive(Clone)]
pub struct ClusterCursorManager {
    inner: Arc<Inner>,
}

impl ClusterCursorManager {
    /// Creates an empty manager with default options.
    pub fn new() -> Self {
        Self::with_options(ClusterCursorManagerOptions::default())
    }

    /// Creates an empty manager with the given options.
    pub fn with_options(options: ClusterCursorManagerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    stats: CursorStats::default(),
                }),
                id_generator: CursorIdGenerator::new(),
                options,
            }),
        }
    }

    /// Registers a freshly created cursor and returns a [`PinnedCursor`] granting exclusive
    /// access to it.
    ///
    /// Never fails for a valid `cursor`. The returned pin's id is guaranteed nonzero and distinct
    /// from every id currently registered with this manager.
    pub fn register_cursor(
        &self,
        cursor: Box<dyn Cursor>,
        namespace: Namespace,
        cursor_type: CursorType,
        lifetime: CursorLifetime,
    ) -> PinnedCursor {
        let now = Instant::now();
        let mut state = self.lock();

        let id = self
            .inner
            .id_generator
            .generate(|candidate| state.entries.contains_key(&candidate));

        let entry = Entry::new_pinned(id, namespace.clone(), cursor_type, lifetime, now);
        state.stats.increment(cursor_type);
        state.entries.insert(id, entry);
        drop(state);

        self.log_transition("registered", id, &namespace);
        PinnedCursor::new(id, cursor, self.clone())
    }

    /// Checks out a previously registered, currently idle cursor.
    ///
    /// Returns [`ErrorKind::CursorNotFound`](crate::error::ErrorKind::CursorNotFound) if no entry
    /// matches `namespace` and `id`, or if a matching entry has already been killed.  Returns
    /// [`ErrorKind::CursorInUse`](crate::error::ErrorKind::CursorInUse) if a matching entry is
    /// currently pinned by another caller.
    pub fn check_out_cursor(&self, namespace: &Namespace, id: CursorId) -> Result<PinnedCursor> {
        let mut state = self.lock();
        let entry = Self::live_entry_mut(&mut state.entries, namespace, id)?;

        if entry.pinned {
            return Err(Error::cursor_in_use());
        }

        let cursor = entry
            .cursor
            .take()
            .expect("invariant violated: live, unpinned entry has no cursor");
        entry.pinned = true;
        entry.last_active = Instant::now();
        drop(state);

        self.log_transition("checked out", id, namespace);
        Ok(PinnedCursor::new(id, cursor, self.clone()))
    }

    /// Marks a cursor killed. Idempotent in the sense that a second call on the same id returns
    /// `CursorNotFound`, matching a lookup on an id that was never registered — this avoids
    /// leaking lifecycle information to the caller.
    ///
    /// Does not invoke the cursor's `kill` capability synchronously, since another caller may
    /// currently be pinning it; actual destruction happens in
    /// [`reap_zombie_cursors`](Self::reap_zombie_cursors).
    pub fn kill_cursor(&self, namespace: &Namespace, id: CursorId) -> Result<()> {
        let mut state = self.lock();
        let State { entries, stats } = &mut *state;
        let entry = Self::live_entry_mut(entries, namespace, id)?;
        entry.kill_pending = true;
        let cursor_type = entry.cursor_type;
        decrement_if_counted(entry, cursor_type, stats);
        drop(state);
        self.log_transition("killed", id, namespace);
        Ok(())
    }

    /// Marks every currently live cursor killed. Returns immediately; actual destruction happens
    /// on the next [`reap_zombie_cursors`](Self::reap_zombie_cursors) call.
    pub fn kill_all_cursors(&self) {
        let mut state = self.lock();
        let ids: Vec<CursorId> = state.entries.keys().copied().collect();
        for id in ids {
            if let Some(entry) = state.entries.get_mut(&id) {
                if entry.kill_pending {
                    continue;
                }
                entry.kill_pending = true;
                let cursor_type = entry.cursor_type;
                decrement_if_counted(entry, cursor_type, &mut state.stats);
            }
        }
        #[cfg(feature = "tracing-unstable")]
        tracing::debug!("killed all cursors");
    }

    /// Destroys every currently reapable zombie: an entry that is `kill_pending` and not
    /// `pinned`. Pinned zombies are skipped; they are reaped the next time they are returned or
    /// this is called again.
    ///
    /// Owning cursor handles are extracted from the registry under the lock, but `kill()` is
    /// invoked, and the cursors dropped, only after the lock is released.
    pub fn reap_zombie_cursors(&self) {
        let mut zombies: Vec<(CursorId, Box<dyn Cursor>)> = Vec::new();
        {
            let mut state = self.lock();
            let reapable_ids: Vec<CursorId> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_reapable())
                .map(|(id, _)| *id)
                .collect();
            for id in reapable_ids {
                if let Some(entry) = state.entries.remove(&id) {
                    if let Some(cursor) = entry.cursor {
                        zombies.push((id, cursor));
                    }
                }
            }
        }

        for (id, mut cursor) in zombies {
            cursor.kill();
            #[cfg(feature = "tracing-unstable")]
            tracing::debug!(cursor.id = %id, "reaped zombie cursor");
            #[cfg(not(feature = "tracing-unstable"))]
            let _ = id;
        }
    }

    /// Marks every `Mortal` cursor that has been idle (unpinned, unkilled) since before `now -
    /// cursor_timeout` as killed, then runs an ordinary [`reap_zombie_cursors`](Self::reap_zombie_cursors)
    /// pass.
    ///
    /// A periodic caller outside this crate is expected to invoke this on a schedule; the manager
    /// has no timer of its own.
    pub fn reap_with_timeout(&self, now: Instant) {
        let timeout = self.inner.options.cursor_timeout;
        {
            let mut state = self.lock();
            let idle_mortal_ids: Vec<CursorId> = state
                .entries
                .iter()
                .filter(|(_, entry)| {
                    entry.lifetime == CursorLifetime::Mortal
                        && !entry.kill_pending
                        && !entry.pinned
                        && now.saturating_duration_since(entry.last_active) >= timeout
                })
                .map(|(id, _)| *id)
                .collect();
            for id in idle_mortal_ids {
                if let Some(entry) = state.entries.get_mut(&id) {
                    entry.kill_pending = true;
                    let cursor_type = entry.cursor_type;
                    decrement_if_counted(entry, cursor_type, &mut state.stats);
                }
            }
        }
        self.reap_zombie_cursors();
    }

    /// Returns the namespace of the entry with the given id, regardless of whether it is killed
    /// or pinned, or `None` if no such entry exists.
    pub fn get_namespace_for_cursor_id(&self, id: CursorId) -> Option<Namespace> {
        let state = self.lock();
        state.entries.get(&id).map(|entry| entry.namespace.clone())
    }

    /// A snapshot of the live cursor counts per category.
    pub fn stats(&self) -> CursorStats {
        self.lock().stats
    }

    /// Kills every live cursor and reaps them. A convenience for graceful shutdown and test
    /// teardown, matching the original system's cleanup pattern.
    pub fn shutdown(&self) {
        self.kill_all_cursors();
        self.reap_zombie_cursors();
    }

    pub(super) fn handle_return(
        &self,
        id: CursorId,
        cursor: Box<dyn Cursor>,
        disposition: ReturnDisposition,
    ) {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(&id) else {
            // The entry was already reaped out from under this pin (e.g. killAllCursors raced
            // with a concurrent reap). There is nothing left to update; the cursor is simply
            // dropped here, which is safe since kill() is only guaranteed "at most once", not
            // "always".
            drop(state);
            drop(cursor);
            return;
        };

        match disposition {
            ReturnDisposition::NotExhausted => {
                entry.cursor = Some(cursor);
                entry.pinned = false;
                entry.last_active = Instant::now();
            }
            ReturnDisposition::Exhausted => {
                let cursor_type = entry.cursor_type;
                decrement_if_counted(entry, cursor_type, &mut state.stats);
                state.entries.remove(&id);
                drop(state);
                drop(cursor);
                return;
            }
            ReturnDisposition::ImplicitKill => {
                let cursor_type = entry.cursor_type;
                decrement_if_counted(entry, cursor_type, &mut state.stats);
                entry.cursor = Some(cursor);
                entry.pinned = false;
                entry.kill_pending = true;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Looks up an entry by `(namespace, id)`, treating a namespace mismatch or a killed entry
    /// the same as "does not exist" — matching invariant (I2) and the contract that a client
    /// cannot distinguish a killed cursor from one that never existed.
    fn live_entry_mut<'a>(
        entries: &'a mut HashMap<CursorId, Entry>,
        namespace: &Namespace,
        id: CursorId,
    ) -> Result<&'a mut Entry> {
        match entries.get_mut(&id) {
            Some(entry) if entry.namespace == *namespace && !entry.kill_pending => Ok(entry),
            _ => Err(Error::cursor_not_found()),
        }
    }

    #[cfg_attr(not(feature = "tracing-unstable"), allow(unused_variables))]
    fn log_transition(&self, event: &str, id: CursorId, namespace: &Namespace) {
        #[cfg(feature = "tracing-unstable")]
        tracing::debug!(cursor.id = %id, namespace = %namespace, "{event}");
    }
}

impl Default for ClusterCursorManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements `entry`'s category counter exactly once: `counted` is cleared atomically (under
/// the registry lock) on the first decrement, so a double-kill or a kill racing an exhausting
/// return can never double-decrement.
fn decrement_if_counted(entry: &mut Entry, cursor_type: CursorType, stats: &mut CursorStats) {
    if entry.counted {
        entry.counted = false;
        stats.decrement(cursor_type);
    }
}
