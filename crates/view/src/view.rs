//! Consumption-sharing views.
//!
//! A `View` is a lazy, forward-only window over a source. Views derived from
//! one another form a family that shares a single `Ledger`: an element claimed
//! by any view of the family is never yielded by another one. Rejecting an
//! element does not consume it, so `numbers.filter(even)` drains the even
//! numbers and leaves the odd ones on `numbers`.
//!
//! A derived view starts at its parent's current cursor and accepts an element
//! only if every predicate along its derivation path accepts it, ancestors
//! first.

use crate::history::History;
use crate::ledger::{Family, Ledger, LedgerStats};
use crate::merge::MergeSource;
use crate::window::{Stride, Window};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;
use picky_core::{Error, Position, Result, ViewId};
use picky_source::{IterSource, ListSource, Source};

/// A shared element test. Errors propagate to the caller of the pull.
pub type Predicate<T> = Rc<dyn Fn(&T) -> Result<bool>>;

fn lift<T, F>(test: F) -> Predicate<T>
where
    F: Fn(&T) -> bool + 'static,
{
    Rc::new(move |item: &T| -> Result<bool> { Ok(test(item)) })
}

/// A take-while condition and the latch shared by every view below it.
struct Boundary<T> {
    condition: Predicate<T>,
    reached: Rc<Cell<bool>>,
}

/// One link of a view's derivation path.
enum Condition<T> {
    Filter(Predicate<T>),
    Until(Boundary<T>),
}

impl<T> Clone for Condition<T> {
    fn clone(&self) -> Self {
        match self {
            Condition::Filter(predicate) => Condition::Filter(Rc::clone(predicate)),
            Condition::Until(boundary) => Condition::Until(Boundary {
                condition: Rc::clone(&boundary.condition),
                reached: Rc::clone(&boundary.reached),
            }),
        }
    }
}

/// Outcome of testing one element against a view's conditions.
enum Verdict {
    Accept,
    Reject,
    Halt,
}

/// A lazy view over a shared source. See the module documentation.
pub struct View<T: 'static> {
    id: ViewId,
    family: Rc<Family<T>>,
    /// Ancestors' conditions first, then this view's own.
    conditions: Vec<Condition<T>>,
    stride: Stride,
    cursor: Position,
    /// Accepted position the cursor rests on, not yet claimed.
    candidate: Option<Position>,
    /// Deregistered for good: spent, or stopped at a take-while boundary.
    retired: bool,
    claimed: usize,
    last: Option<Position>,
    last_item: Option<T>,
    history: Option<History<T>>,
    /// Histories of the ancestors that kept one when this view was derived.
    upstream: Vec<History<T>>,
    error: Option<Error>,
}

impl<T: 'static> View<T> {
    /// Creates the root view of a new family over `source`.
    pub fn wrap<S>(source: S) -> Self
    where
        S: Source<Item = T> + 'static,
    {
        let mut ledger = Ledger::new(source);
        let id = ledger.register(0);
        Self {
            id,
            family: Rc::new(Family::new(ledger)),
            conditions: Vec::new(),
            stride: Stride::new(Window::new()),
            cursor: 0,
            candidate: None,
            retired: false,
            claimed: 0,
            last: None,
            last_item: None,
            history: None,
            upstream: Vec::new(),
            error: None,
        }
    }

    /// Creates a root view over anything iterable, finite or unbounded.
    pub fn over<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::wrap(IterSource::new(iterable))
    }

    /// Creates a root view over a list.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::wrap(ListSource::new(items))
    }

    fn derive(&self, condition: Option<Condition<T>>, window: Window) -> Self {
        let mut conditions = self.conditions.clone();
        conditions.extend(condition);
        let mut upstream = self.upstream.clone();
        upstream.extend(self.history.iter().cloned());

        let id = {
            let mut ledger = self.family.enter();
            let id = ledger.register(self.cursor);
            // Children of a retired view are born exhausted.
            if self.retired {
                ledger.deregister(id);
            }
            id
        };
        Self {
            id,
            family: Rc::clone(&self.family),
            conditions,
            stride: Stride::new(window),
            cursor: self.cursor,
            candidate: None,
            retired: self.retired,
            claimed: 0,
            last: None,
            last_item: None,
            history: self.history.as_ref().map(History::fresh),
            upstream,
            error: None,
        }
    }

    /// Derives a view that yields only elements matching `predicate`.
    ///
    /// The child starts at this view's cursor and shares its family.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a predicate of the same family.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.derive(Some(Condition::Filter(lift(predicate))), Window::new())
    }

    /// Derives a view with a fallible predicate.
    ///
    /// A predicate error is returned from the pull. The element under test is
    /// neither consumed nor passed, so the next pull tests it again.
    pub fn try_filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> Result<bool> + 'static,
    {
        let predicate: Predicate<T> = Rc::new(predicate);
        self.derive(Some(Condition::Filter(predicate)), Window::new())
    }

    /// Derives a view that yields elements while `condition` holds.
    ///
    /// The first unconsumed element failing the condition ends the view for
    /// good; that element stays unclaimed. The boundary is shared with every
    /// view derived from the result: once any of them reaches it, all of them
    /// are exhausted.
    pub fn take_while<F>(&self, condition: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        let boundary = Boundary {
            condition: lift(condition),
            reached: Rc::new(Cell::new(false)),
        };
        self.derive(Some(Condition::Until(boundary)), Window::new())
    }

    /// Derives a view constrained by `window`.
    pub fn window(&self, window: Window) -> Result<Self> {
        window.validate()?;
        Ok(self.derive(None, window))
    }

    /// Derives a view from slice-style bounds. See [`Window::slice`].
    pub fn slice(&self, start: Option<usize>, stop: Option<usize>, step: Option<usize>) -> Result<Self> {
        self.window(Window::slice(start, stop, step)?)
    }

    /// Derives a view that yields at most `n` elements.
    pub fn take_up_to(&self, n: usize) -> Self {
        self.derive(None, Window::new().with_limit(n))
    }

    /// Derives a view that passes over its first `n` elements without claiming them.
    pub fn skip_over(&self, n: usize) -> Self {
        self.derive(None, Window::new().with_skip(n))
    }

    /// Derives a view that claims every `n`-th element and leaves the rest.
    pub fn step(&self, n: usize) -> Result<Self> {
        self.window(Window::new().with_step(n))
    }

    /// Merges two views into the root of a new family.
    ///
    /// `pick_left(a, b)` is called with the next element of each side and
    /// returns true to yield from `self`. Once one side is exhausted the other
    /// is drained. Elements yielded by the merge are claimed in their
    /// original families.
    pub fn merge<F>(self, other: View<T>, pick_left: F) -> View<T>
    where
        F: FnMut(&T, &T) -> bool + 'static,
    {
        View::wrap(MergeSource::new(self, other, pick_left))
    }

    /// Yields every element of `self`, then every element of `other`.
    pub fn concat(self, other: View<T>) -> View<T> {
        self.merge(other, |_, _| true)
    }

    fn judge(&self, item: &T) -> Result<Verdict> {
        for condition in &self.conditions {
            match condition {
                Condition::Filter(predicate) => {
                    if !predicate(item)? {
                        return Ok(Verdict::Reject);
                    }
                }
                Condition::Until(boundary) => {
                    if boundary.reached.get() {
                        return Ok(Verdict::Halt);
                    }
                    if !(boundary.condition)(item)? {
                        boundary.reached.set(true);
                        return Ok(Verdict::Halt);
                    }
                }
            }
        }
        Ok(Verdict::Accept)
    }

    fn is_halted(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| matches!(condition, Condition::Until(boundary) if boundary.reached.get()))
    }

    /// Leaves the family's cursor registry once nothing more can be claimed,
    /// so the buffer is no longer held back for this view.
    fn retire(&mut self, ledger: &mut Ledger<T>) {
        if !self.retired {
            self.retired = true;
            self.candidate = None;
            ledger.deregister(self.id);
        }
    }

    fn step_past(&mut self, ledger: &mut Ledger<T>) {
        self.cursor += 1;
        ledger.advance(self.id, self.cursor);
    }

    /// Moves the cursor to the next element this view would claim.
    fn seek(&mut self, ledger: &mut Ledger<T>) -> Result<Option<Position>> {
        loop {
            if self.retired {
                return Ok(None);
            }
            if self.stride.is_spent() || self.is_halted() {
                self.retire(ledger);
                return Ok(None);
            }
            let position = self.cursor;
            if ledger.is_consumed(position) {
                self.candidate = None;
                self.step_past(ledger);
                continue;
            }
            if self.candidate == Some(position) {
                return Ok(Some(position));
            }

            let verdict = match ledger.materialize(position)? {
                Some(item) => self.judge(item)?,
                None => return Ok(None),
            };
            match verdict {
                Verdict::Reject => self.step_past(ledger),
                Verdict::Halt => {
                    tracing::trace!(view = self.id, position, "view halted");
                    self.retire(ledger);
                    return Ok(None);
                }
                Verdict::Accept => {
                    if self.stride.admit() {
                        self.candidate = Some(position);
                        return Ok(Some(position));
                    }
                    self.step_past(ledger);
                }
            }
        }
    }

    fn shared(&self) -> Rc<Family<T>> {
        Rc::clone(&self.family)
    }

    /// Positions the cursor on the next candidate without claiming it.
    pub(crate) fn seek_head(&mut self) -> Result<Option<Position>> {
        let family = self.shared();
        let mut ledger = family.lock()?;
        self.seek(&mut ledger)
    }

    /// Borrows the buffered item at `position`, which must be a candidate
    /// found by `seek_head`.
    pub(crate) fn inspect<R>(&self, position: Position, f: impl FnOnce(&T) -> R) -> Result<Option<R>> {
        self.family.read(|ledger| ledger.item(position).map(f))
    }

    fn record(&mut self, item: &T) {
        for history in &self.upstream {
            history.record(item);
        }
        if let Some(history) = &self.history {
            history.record(item);
            self.last_item = Some(history.copy_of(item));
        }
    }

    /// Claims and returns the next element.
    ///
    /// Returns `Ok(None)` once the view is exhausted; further calls keep
    /// returning `Ok(None)`. On a predicate or source error nothing is
    /// consumed and the cursor stays put.
    pub fn try_next(&mut self) -> Result<Option<T>> {
        let family = self.shared();
        let mut ledger = family.lock()?;
        loop {
            let Some(position) = self.seek(&mut ledger)? else {
                return Ok(None);
            };
            self.candidate = None;
            if let Some(item) = ledger.claim(position) {
                self.claimed += 1;
                self.last = Some(position);
                self.stride.record_claim();
                self.record(&item);
                tracing::trace!(view = self.id, position, "position claimed");
                self.step_past(&mut ledger);
                if self.stride.is_spent() {
                    self.retire(&mut ledger);
                }
                return Ok(Some(item));
            }
            self.step_past(&mut ledger);
        }
    }

    /// Claims and returns the next element.
    ///
    /// An error ends the pull with `None` and is kept for [`View::take_error`].
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<T> {
        match self.try_next() {
            Ok(item) => item,
            Err(err) => {
                tracing::debug!(view = self.id, error = %err, "pull failed");
                self.error = Some(err);
                None
            }
        }
    }

    /// Takes the error that ended the last `next` call, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Applies `f` to the next element without claiming it.
    pub fn with_peek<R>(&mut self, f: impl FnOnce(&T) -> R) -> Result<Option<R>> {
        match self.seek_head()? {
            Some(position) => self.inspect(position, f),
            None => Ok(None),
        }
    }

    /// Returns true if another element is available to this view.
    pub fn has_more(&mut self) -> Result<bool> {
        Ok(self.seek_head()?.is_some())
    }

    /// Claims up to `n` elements.
    pub fn take_some(&mut self, n: usize) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(n);
        while items.len() < n {
            match self.try_next()? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }

    /// Claims only the `n`-th (0-based) element, leaving the earlier ones.
    pub fn pick(&self, n: usize) -> Result<Option<T>> {
        self.slice(Some(n), Some(1), None)?.try_next()
    }

    /// Claims every remaining element.
    pub fn drain_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.try_next()? {
            items.push(item);
        }
        Ok(items)
    }

    /// Returns an iterator that claims elements from this view.
    pub fn iter(&mut self) -> Iter<'_, T> {
        Iter { view: self }
    }

    /// Returns an iterator of fallible pulls.
    pub fn try_iter(&mut self) -> TryIter<'_, T> {
        TryIter { view: self }
    }

    /// Appends this view's claims to `history`, along with the claims of
    /// views derived from it afterwards.
    ///
    /// A predicate may hold a clone of `history` to read what its own view
    /// has yielded so far.
    pub fn record_into(&mut self, history: &History<T>) {
        self.history = Some(history.clone());
    }

    /// Returns a handle to this view's history, if it keeps one.
    pub fn history(&self) -> Option<History<T>> {
        self.history.clone()
    }

    /// Returns the element this view yielded last, if it keeps a history.
    ///
    /// Only this view's own claims count, not those of its descendants.
    pub fn last(&self) -> Option<&T> {
        self.last_item.as_ref()
    }

    /// Returns this view's id within its family.
    #[inline]
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Returns the next position this view will examine.
    #[inline]
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Returns the number of elements this view has yielded.
    #[inline]
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// Returns the position of the element this view yielded last.
    #[inline]
    pub fn last_position(&self) -> Option<Position> {
        self.last
    }

    /// Returns true if both views share a family.
    pub fn same_family(&self, other: &View<T>) -> bool {
        Rc::ptr_eq(&self.family, &other.family)
    }

    /// Returns a snapshot of the family's ledger.
    pub fn ledger_stats(&self) -> LedgerStats {
        self.family.stats()
    }
}

impl<T: Clone + 'static> View<T> {
    /// Returns a copy of the next element without claiming it.
    pub fn peek(&mut self) -> Result<Option<T>> {
        self.with_peek(T::clone)
    }

    /// Starts recording claimed elements and returns the history handle.
    ///
    /// Views derived afterwards keep their own history too, and their claims
    /// also land in this one. Claims made before the call are not recorded.
    pub fn keep_history(&mut self) -> History<T> {
        self.history.get_or_insert_with(History::new).clone()
    }

    /// Returns the elements claimed by this view and its descendants so far.
    pub fn consumed(&self) -> Vec<T> {
        self.history.as_ref().map(History::to_vec).unwrap_or_default()
    }
}

impl<T: Clone + PartialEq + 'static> View<T> {
    /// Derives a view that skips every element `other` has claimed.
    ///
    /// The test is live: elements `other` claims later are skipped as well.
    /// `other` starts keeping a history if it did not already.
    pub fn intercepted(&self, other: &mut View<T>) -> Self {
        let seen = other.keep_history();
        self.filter(move |item| !seen.contains(item))
    }

    /// Like [`View::intercepted`], comparing elements by `key`.
    pub fn intercepted_by_key<K, F>(&self, other: &mut View<T>, key: F) -> Self
    where
        K: PartialEq,
        F: Fn(&T) -> K + 'static,
    {
        let seen = other.keep_history();
        self.filter(move |item| {
            let wanted = key(item);
            seen.with(|items| items.iter().all(|x| key(x) != wanted))
        })
    }
}

impl<T: 'static> Drop for View<T> {
    fn drop(&mut self) {
        if !self.retired {
            self.family.release(self.id);
        }
    }
}

impl<T: 'static> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("cursor", &self.cursor)
            .field("conditions", &self.conditions.len())
            .field("claimed", &self.claimed)
            .field("retired", &self.retired)
            .finish()
    }
}

impl<T: 'static> From<Vec<T>> for View<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: 'static> FromIterator<T> for View<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Borrowing iterator returned by [`View::iter`].
pub struct Iter<'a, T: 'static> {
    view: &'a mut View<T>,
}

impl<T: 'static> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.view.next()
    }
}

/// Borrowing iterator of fallible pulls returned by [`View::try_iter`].
pub struct TryIter<'a, T: 'static> {
    view: &'a mut View<T>,
}

impl<T: 'static> Iterator for TryIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        self.view.try_next().transpose()
    }
}

/// Owning iterator over a view.
pub struct IntoIter<T: 'static> {
    view: View<T>,
}

impl<T: 'static> IntoIter<T> {
    /// Returns the view, for example to inspect an error that ended iteration.
    pub fn into_view(self) -> View<T> {
        self.view
    }
}

impl<T: 'static> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.view.next()
    }
}

impl<T: 'static> IntoIterator for View<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { view: self }
    }
}

impl<'a, T: 'static> IntoIterator for &'a mut View<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::cell::RefCell;

    fn even(n: &u32) -> bool {
        n % 2 == 0
    }

    #[test]
    fn test_root_yields_everything() {
        let mut root = View::over(0u32..5);
        assert_eq!(root.drain_all().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(root.claimed(), 5);
        assert_eq!(root.last_position(), Some(4));
    }

    #[test]
    fn test_filter_leaves_rejected_for_parent() {
        let mut root = View::over(0u32..10);
        let mut evens = root.filter(even);

        assert_eq!(evens.drain_all().unwrap(), vec![0, 2, 4, 6, 8]);
        assert_eq!(root.drain_all().unwrap(), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_child_starts_at_parent_cursor() {
        let mut root = View::over(0u32..10);
        assert_eq!(root.take_some(3).unwrap(), vec![0, 1, 2]);

        let mut evens = root.filter(even);
        assert_eq!(evens.cursor(), 3);
        assert_eq!(evens.next(), Some(4));
    }

    #[test]
    fn test_child_inherits_parent_predicates() {
        let root = View::over(0u32..30);
        let evens = root.filter(even);
        let mut sixes = evens.filter(|n| n % 3 == 0);

        assert_eq!(sixes.drain_all().unwrap(), vec![0, 6, 12, 18, 24]);
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let mut root = View::from_vec(vec!['x']);
        assert_eq!(root.next(), Some('x'));
        for _ in 0..5 {
            assert_eq!(root.next(), None);
            assert_eq!(root.try_next().unwrap(), None);
        }
        assert!(root.take_error().is_none());
    }

    #[test]
    fn test_peek_does_not_claim() {
        let mut root = View::over(0u32..);
        assert_eq!(root.peek().unwrap(), Some(0));
        assert_eq!(root.peek().unwrap(), Some(0));
        assert_eq!(root.next(), Some(0));
        assert_eq!(root.peek().unwrap(), Some(1));
        assert_eq!(root.next(), Some(1));
    }

    #[test]
    fn test_peeked_candidate_stolen_by_sibling() {
        let mut root = View::over(0u32..6);
        let mut evens = root.filter(even);

        assert_eq!(root.peek().unwrap(), Some(0));
        assert_eq!(evens.next(), Some(0));
        assert_eq!(root.next(), Some(1));
    }

    #[test]
    fn test_predicate_evaluated_once_per_peeked_position() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let root = View::over(0u32..);
        let mut view = root.filter(move |_| {
            counter.set(counter.get() + 1);
            true
        });

        view.peek().unwrap();
        view.peek().unwrap();
        view.next();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_has_more() {
        let mut root = View::over(0u32..3);
        assert_eq!(root.take_some(2).unwrap(), vec![0, 1]);
        assert!(root.has_more().unwrap());
        assert_eq!(root.next(), Some(2));
        assert!(!root.has_more().unwrap());
    }

    #[test]
    fn test_predicate_error_is_retryable() {
        let armed = Rc::new(Cell::new(true));
        let trigger = Rc::clone(&armed);
        let root = View::over(0u32..4);
        let mut view = root.try_filter(move |n| {
            if *n == 2 && trigger.get() {
                return Err(Error::predicate("two is unlucky"));
            }
            Ok(true)
        });

        assert_eq!(view.take_some(2).unwrap(), vec![0, 1]);
        assert_eq!(view.try_next(), Err(Error::predicate("two is unlucky")));
        assert_eq!(view.cursor(), 2);
        assert_eq!(view.try_next(), Err(Error::predicate("two is unlucky")));

        armed.set(false);
        assert_eq!(view.try_next().unwrap(), Some(2));
        assert_eq!(view.try_next().unwrap(), Some(3));
    }

    #[test]
    fn test_next_stashes_error() {
        let root = View::over(0u32..2);
        let mut view = root.try_filter(|_| Err(Error::predicate("boom")));

        assert_eq!(view.next(), None);
        assert_eq!(view.take_error(), Some(Error::predicate("boom")));
        assert_eq!(view.take_error(), None);
    }

    #[test]
    fn test_reentrant_pull_is_an_error() {
        let root = View::over(0u32..4);
        let sibling = Rc::new(RefCell::new(root.filter(|_| true)));
        let inner = Rc::clone(&sibling);
        let mut view = root.try_filter(move |_| {
            inner.borrow_mut().try_next()?;
            Ok(true)
        });

        assert_eq!(view.try_next(), Err(Error::Reentrant));
        assert_eq!(sibling.borrow_mut().try_next().unwrap(), Some(0));
    }

    #[test]
    fn test_take_while_halts() {
        let root = View::from_vec(vec![4, 1, 6, 3, 8, 0, 11, 9, 3, 13]);
        let mut small = root.take_while(|n| *n < 10);

        assert_eq!(small.drain_all().unwrap(), vec![4, 1, 6, 3, 8, 0]);
        assert_eq!(small.next(), None);

        let mut root = root;
        assert_eq!(root.drain_all().unwrap(), vec![11, 9, 3, 13]);
    }

    #[test]
    fn test_step_leaves_gaps() {
        let mut root = View::over(0u32..10);
        let mut every_other = root.step(2).unwrap();

        assert_eq!(every_other.drain_all().unwrap(), vec![0, 2, 4, 6, 8]);
        assert_eq!(root.drain_all().unwrap(), vec![1, 3, 5, 7, 9]);
        assert!(matches!(root.step(0), Err(Error::InvalidWindow { .. })));
    }

    #[test]
    fn test_slice_walkthrough() {
        let mut p = View::over(0u32..10);

        assert_eq!(p.slice(None, Some(3), Some(2)).unwrap().drain_all().unwrap(), vec![0, 2, 4]);
        assert_eq!(p.pick(1).unwrap(), Some(3));
        assert_eq!(p.slice(None, Some(2), Some(5)).unwrap().drain_all().unwrap(), vec![1, 9]);
        assert_eq!(p.slice(Some(2), Some(4), None).unwrap().drain_all().unwrap(), vec![7, 8]);
        assert_eq!(p.drain_all().unwrap(), vec![5, 6]);
        assert!(p.slice(None, None, None).is_err());
    }

    #[test]
    fn test_take_up_to_and_skip_over() {
        let mut root = View::over(0u32..8);

        assert_eq!(root.take_up_to(2).drain_all().unwrap(), vec![0, 1]);
        assert_eq!(root.skip_over(3).take_some(2).unwrap(), vec![5, 6]);
        assert_eq!(root.drain_all().unwrap(), vec![2, 3, 4, 7]);
    }

    #[test]
    fn test_iterators() {
        let mut root = View::over(0u32..6);
        let evens: Vec<u32> = root.filter(even).into_iter().collect();
        assert_eq!(evens, vec![0, 2, 4]);

        let mut odds = Vec::new();
        for n in &mut root {
            odds.push(n);
        }
        assert_eq!(odds, vec![1, 3, 5]);

        let mut fresh = View::over(0u32..3);
        let all: Result<Vec<u32>> = fresh.try_iter().collect();
        assert_eq!(all.unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dropping_views_releases_buffer() {
        let root = View::over(0u32..100);
        let mut evens = root.filter(even);
        evens.take_some(10).unwrap();

        // The root still sits at 0, so only the claimed front slot is gone.
        assert_eq!(root.ledger_stats().buffered, 18);
        assert_eq!(root.ledger_stats().live_views, 2);

        drop(root);
        let stats = evens.ledger_stats();
        assert_eq!(stats.live_views, 1);
        assert_eq!(stats.buffered, 0);
    }

    #[test]
    fn test_spent_view_releases_buffer() {
        let root = View::over(0u32..);
        let mut evens = root.filter(even);
        let mut first_two = evens.take_up_to(2);

        assert_eq!(first_two.take_some(2).unwrap(), vec![0, 2]);
        assert_eq!(first_two.next(), None);
        drop(root);

        for _ in 0..1000 {
            assert!(evens.next().is_some());
        }
        let stats = evens.ledger_stats();
        assert_eq!(stats.live_views, 1);
        assert_eq!(stats.buffered, 0);
        assert_eq!(stats.floor, Some(evens.cursor()));
    }

    #[test]
    fn test_halted_view_releases_buffer() {
        let mut root = View::over(0u32..);
        let mut small = root.take_while(|n| *n < 3);

        assert_eq!(small.drain_all().unwrap(), vec![0, 1, 2]);
        assert_eq!(root.ledger_stats().live_views, 1);

        assert_eq!(root.take_some(5).unwrap(), vec![3, 4, 5, 6, 7]);
        assert_eq!(root.ledger_stats().buffered, 0);
        drop(small);
        assert_eq!(root.ledger_stats().live_views, 1);
    }

    #[test]
    fn test_child_of_spent_view_is_exhausted() {
        let mut root = View::over(0u32..10);
        let mut first = root.take_up_to(1);
        assert_eq!(first.next(), Some(0));
        assert_eq!(root.take_some(3).unwrap(), vec![1, 2, 3]);

        let mut child = first.filter(|_| true);
        assert_eq!(child.next(), None);
        assert_eq!(root.ledger_stats().live_views, 1);
        drop(child);
        assert_eq!(root.next(), Some(4));
    }

    #[test]
    fn test_take_while_boundary_stops_descendants() {
        let root = View::from_vec(vec![4, 1, 6, 3, 8, 0, 11, 9, 3, 13]);
        let small = root.take_while(|n| *n < 10);
        let mut child = small.filter(|_| true);

        assert_eq!(child.drain_all().unwrap(), vec![4, 1, 6, 3, 8, 0]);

        let mut small = small;
        assert_eq!(small.next(), None);
        let mut late = small.filter(|_| true);
        assert_eq!(late.next(), None);

        let mut root = root;
        assert_eq!(root.drain_all().unwrap(), vec![11, 9, 3, 13]);
    }

    #[test]
    fn test_take_while_under_filter_sees_only_accepted() {
        let root = View::from_vec(vec![1, 2, 30, 4, 5, 6]);
        let evens = root.filter(|n: &i32| n % 2 == 0);
        let mut small = evens.take_while(|n| *n < 10);

        // 1 and 5 are rejected before the boundary test; 30 stops the view.
        assert_eq!(small.drain_all().unwrap(), vec![2]);
        let mut evens = evens;
        assert_eq!(evens.drain_all().unwrap(), vec![30, 4, 6]);
    }

    #[test]
    fn test_history_and_last() {
        let mut p = View::over(0u32..);
        p.keep_history();
        assert_eq!(p.last(), None);

        assert_eq!(p.next(), Some(0));
        assert_eq!(p.next(), Some(1));
        assert_eq!(p.last(), Some(&1));
        assert_eq!(p.peek().unwrap(), Some(2));
        assert_eq!(p.next(), Some(2));
        assert_eq!(p.consumed(), vec![0, 1, 2]);

        let mut evens = p.filter(even);
        assert_eq!(evens.next(), Some(4));
        assert_eq!(evens.consumed(), vec![4]);
        assert_eq!(evens.last(), Some(&4));
        assert_eq!(p.consumed(), vec![0, 1, 2, 4]);
        assert_eq!(p.last(), Some(&2));
    }

    #[test]
    fn test_view_without_history() {
        let mut root = View::over(0u32..3);
        assert_eq!(root.next(), Some(0));
        assert!(root.history().is_none());
        assert_eq!(root.last(), None);
        assert!(root.consumed().is_empty());
    }

    #[test]
    fn test_history_feeds_own_predicate() {
        let found = History::new();
        let seen = found.clone();
        let numbers = View::over(2u64..);
        let mut primes = numbers.filter(move |n| seen.with(|ps| ps.iter().all(|p| n % p != 0)));
        primes.record_into(&found);

        assert_eq!(primes.take_some(8).unwrap(), vec![2, 3, 5, 7, 11, 13, 17, 19]);
        assert_eq!(found.len(), 8);
        assert!(primes.history().is_some_and(|h| h.ptr_eq(&found)));
    }

    #[test]
    fn test_intercepted() {
        let mut a = View::from_vec(vec![1, 3, 7, 0]);
        a.keep_history();
        assert_eq!(a.take_up_to(2).drain_all().unwrap(), vec![1, 3]);

        let mut b = View::over(0..10).intercepted(&mut a);
        assert_eq!(b.drain_all().unwrap(), vec![0, 2, 4, 5, 6, 7, 8, 9]);

        let mut a = View::from_vec(vec![9, 8, 7, 6]);
        let b = View::from_vec(vec![3, 4, 5, 6]).intercepted(&mut a);
        assert_eq!(b.pick(3).unwrap(), Some(6));
        assert_eq!(a.drain_all().unwrap(), vec![9, 8, 7, 6]);
    }

    #[test]
    fn test_intercepted_is_live() {
        let mut taken = View::from_vec(vec![5, 6]);
        let root = View::over(0..8);
        let mut rest = root.intercepted(&mut taken);

        assert_eq!(rest.take_some(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(taken.drain_all().unwrap(), vec![5, 6]);
        assert_eq!(rest.drain_all().unwrap(), vec![3, 4, 7]);
    }

    #[test]
    fn test_intercepted_by_key() {
        let mut words = View::from_vec(vec!["apple", "kiwi"]);
        words.keep_history();
        assert_eq!(words.next(), Some("apple"));

        let root = View::from_vec(vec!["avocado", "banana", "kumquat"]);
        let mut fresh = root.intercepted_by_key(&mut words, |w| w.as_bytes()[0]);
        assert_eq!(fresh.drain_all().unwrap(), vec!["banana", "kumquat"]);
    }

    #[test]
    fn test_drop_inside_predicate_is_deferred() {
        let root = View::over(0u32..10);
        let doomed = Rc::new(RefCell::new(Some(root.filter(|_| false))));
        let slot = Rc::clone(&doomed);
        let mut view = root.filter(move |_| {
            slot.borrow_mut().take();
            true
        });
        drop(root);

        assert_eq!(view.next(), Some(0));
        assert!(doomed.borrow().is_none());

        let stats = view.ledger_stats();
        assert_eq!(stats.live_views, 1);
        assert_eq!(stats.buffered, 0);
        assert_eq!(stats.floor, Some(1));
    }

    #[test]
    fn test_from_conversions() {
        let mut view: View<u8> = vec![1, 2].into();
        assert_eq!(view.next(), Some(1));

        let mut collected: View<u8> = (5..7).collect();
        assert_eq!(collected.drain_all().unwrap(), vec![5, 6]);
    }

    #[test]
    fn test_same_family() {
        let root = View::over(0u32..);
        let child = root.filter(even);
        let stranger = View::over(0u32..);

        assert!(root.same_family(&child));
        assert!(!root.same_family(&stranger));
        assert_ne!(root.id(), child.id());
    }
}
