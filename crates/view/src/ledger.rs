//! Shared consumption ledger for a view family.
//!
//! The ledger owns the family's source and records which positions have been
//! claimed. Items pulled from the source are kept in a materialization buffer
//! until every live view has either claimed them or moved past them, so that
//! views reading at different speeds all see the same item at a position.
//!
//! Every view registers its cursor with the ledger. The minimum live cursor
//! (the floor) bounds which buffered positions can still be revisited.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;
use core::cell::{RefCell, RefMut};
use hashbrown::{HashMap, HashSet};
use picky_core::{Error, Position, Result, ViewId, ROOT_VIEW_ID};
use picky_source::Source;

/// Snapshot of a ledger's bookkeeping, for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerStats {
    /// Number of buffer slots currently held, claimed or not.
    pub buffered: usize,
    /// Number of registered views.
    pub live_views: usize,
    /// Number of positions claimed so far.
    pub consumed: usize,
    /// Number of items pulled from the source so far.
    pub emitted: Position,
    /// Minimum cursor across live views.
    pub floor: Option<Position>,
    /// Whether the source has reported exhaustion.
    pub exhausted: bool,
}

/// Consumption record and materialization buffer shared by a view family.
pub struct Ledger<T> {
    source: Box<dyn Source<Item = T>>,
    /// Every position ever claimed by a view of this family.
    consumed: HashSet<Position>,
    /// Slots for positions `base..emitted`. `None` once the item was claimed.
    buffer: VecDeque<Option<T>>,
    base: Position,
    emitted: Position,
    exhausted: bool,
    cursors: HashMap<ViewId, Position>,
    /// Multiset of live cursors: cursor -> number of views sitting on it.
    floors: BTreeMap<Position, usize>,
    next_view_id: ViewId,
}

impl<T> Ledger<T> {
    /// Creates an empty ledger over the given source.
    pub fn new<S>(source: S) -> Self
    where
        S: Source<Item = T> + 'static,
    {
        Self {
            source: Box::new(source),
            consumed: HashSet::new(),
            buffer: VecDeque::new(),
            base: 0,
            emitted: 0,
            exhausted: false,
            cursors: HashMap::new(),
            floors: BTreeMap::new(),
            next_view_id: ROOT_VIEW_ID,
        }
    }

    /// Registers a view whose cursor starts at `cursor`.
    pub fn register(&mut self, cursor: Position) -> ViewId {
        let id = self.next_view_id;
        self.next_view_id += 1;
        self.cursors.insert(id, cursor);
        *self.floors.entry(cursor).or_insert(0) += 1;
        tracing::trace!(view = id, cursor, "view registered");
        id
    }

    /// Records that view `id` moved its cursor to `cursor`.
    ///
    /// Views that are not registered are ignored.
    pub fn advance(&mut self, id: ViewId, cursor: Position) {
        let Some(slot) = self.cursors.get_mut(&id) else {
            return;
        };
        let previous = core::mem::replace(slot, cursor);
        if previous == cursor {
            return;
        }
        self.release_floor(previous);
        *self.floors.entry(cursor).or_insert(0) += 1;
        self.prune();
    }

    /// Removes view `id` from the family.
    pub fn deregister(&mut self, id: ViewId) {
        if let Some(cursor) = self.cursors.remove(&id) {
            self.release_floor(cursor);
            tracing::trace!(view = id, cursor, "view deregistered");
            self.prune();
        }
    }

    fn release_floor(&mut self, cursor: Position) {
        if let Some(count) = self.floors.get_mut(&cursor) {
            *count -= 1;
            if *count == 0 {
                self.floors.remove(&cursor);
            }
        }
    }

    /// Returns the minimum cursor across live views.
    #[inline]
    pub fn floor(&self) -> Option<Position> {
        self.floors.keys().next().copied()
    }

    /// Returns true if some view has claimed the item at `position`.
    #[inline]
    pub fn is_consumed(&self, position: Position) -> bool {
        self.consumed.contains(&position)
    }

    /// Makes the item at `position` available in the buffer and borrows it.
    ///
    /// Pulls from the source only when `position` has not been emitted yet.
    /// Returns `Ok(None)` when the source is exhausted before `position`, or
    /// when the position was already claimed or pruned. A source error leaves
    /// the ledger unchanged.
    pub fn materialize(&mut self, position: Position) -> Result<Option<&T>> {
        while self.emitted <= position {
            if self.exhausted {
                return Ok(None);
            }
            match self.source.pull() {
                Ok(Some(item)) => {
                    self.buffer.push_back(Some(item));
                    self.emitted += 1;
                }
                Ok(None) => {
                    tracing::debug!(emitted = self.emitted, "source exhausted");
                    self.exhausted = true;
                    return Ok(None);
                }
                Err(err) => {
                    tracing::debug!(position, error = %err, "source pull failed");
                    return Err(err);
                }
            }
        }
        Ok(self.item(position))
    }

    /// Borrows a buffered, unclaimed item.
    pub fn item(&self, position: Position) -> Option<&T> {
        let offset = self.offset(position)?;
        self.buffer.get(offset).and_then(Option::as_ref)
    }

    /// Marks `position` consumed and moves its item out of the buffer.
    ///
    /// Returns `None` if the position was already consumed or never buffered.
    pub fn claim(&mut self, position: Position) -> Option<T> {
        if !self.consumed.insert(position) {
            return None;
        }
        let item = self
            .offset(position)
            .and_then(|offset| self.buffer.get_mut(offset))
            .and_then(Option::take);
        self.prune();
        item
    }

    /// Marks `position` consumed, dropping its item if buffered.
    pub fn mark_consumed(&mut self, position: Position) {
        self.claim(position);
    }

    fn offset(&self, position: Position) -> Option<usize> {
        position
            .checked_sub(self.base)
            .and_then(|offset| usize::try_from(offset).ok())
    }

    /// Drops leading buffer slots that no live view can claim any more.
    fn prune(&mut self) {
        let floor = self.floor().unwrap_or(Position::MAX);
        let mut pruned = 0usize;
        while let Some(front) = self.buffer.front() {
            if front.is_some() && self.base >= floor {
                break;
            }
            self.buffer.pop_front();
            self.base += 1;
            pruned += 1;
        }
        if pruned > 0 {
            tracing::trace!(pruned, base = self.base, "ledger buffer pruned");
        }
    }

    /// Returns the number of buffer slots currently held.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the number of registered views.
    #[inline]
    pub fn live_views(&self) -> usize {
        self.cursors.len()
    }

    /// Returns the number of items pulled from the source.
    #[inline]
    pub fn emitted(&self) -> Position {
        self.emitted
    }

    /// Returns the number of claimed positions.
    #[inline]
    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Returns true once the source has reported exhaustion.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns a snapshot of the ledger's bookkeeping.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            buffered: self.buffered(),
            live_views: self.live_views(),
            consumed: self.consumed_count(),
            emitted: self.emitted,
            floor: self.floor(),
            exhausted: self.exhausted,
        }
    }
}

/// A family's ledger together with the views dropped while it was borrowed.
///
/// A view dropped from inside a predicate cannot reach the ledger, so its id is
/// parked here and deregistered on the next mutable access.
pub(crate) struct Family<T> {
    ledger: RefCell<Ledger<T>>,
    orphans: RefCell<Vec<ViewId>>,
}

impl<T> Family<T> {
    pub(crate) fn new(ledger: Ledger<T>) -> Self {
        Self {
            ledger: RefCell::new(ledger),
            orphans: RefCell::new(Vec::new()),
        }
    }

    /// Borrows the ledger mutably, or fails with `Error::Reentrant`.
    pub(crate) fn lock(&self) -> Result<RefMut<'_, Ledger<T>>> {
        let mut ledger = self.ledger.try_borrow_mut().map_err(|_| Error::Reentrant)?;
        self.settle(&mut ledger);
        Ok(ledger)
    }

    /// Borrows the ledger mutably.
    ///
    /// # Panics
    ///
    /// Panics if the ledger is already borrowed.
    pub(crate) fn enter(&self) -> RefMut<'_, Ledger<T>> {
        let mut ledger = self.ledger.borrow_mut();
        self.settle(&mut ledger);
        ledger
    }

    /// Runs `f` on the ledger under a shared borrow.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Ledger<T>) -> R) -> Result<R> {
        let ledger = self.ledger.try_borrow().map_err(|_| Error::Reentrant)?;
        Ok(f(&ledger))
    }

    /// Deregisters view `id`, now if the ledger is free or on its next access.
    pub(crate) fn release(&self, id: ViewId) {
        if let Ok(mut ledger) = self.lock() {
            ledger.deregister(id);
            return;
        }
        match self.orphans.try_borrow_mut() {
            Ok(mut orphans) => {
                orphans.push(id);
                tracing::trace!(view = id, "view deregistration deferred");
            }
            Err(_) => tracing::warn!(view = id, "view dropped while its family was settling"),
        }
    }

    /// Returns a snapshot of the ledger, settling deferred drops when possible.
    pub(crate) fn stats(&self) -> LedgerStats {
        match self.lock() {
            Ok(ledger) => ledger.stats(),
            Err(_) => self.ledger.borrow().stats(),
        }
    }

    fn settle(&self, ledger: &mut Ledger<T>) {
        let pending = match self.orphans.try_borrow_mut() {
            Ok(mut orphans) => core::mem::take(&mut *orphans),
            Err(_) => return,
        };
        for id in pending {
            ledger.deregister(id);
        }
    }
}
