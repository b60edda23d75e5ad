//! Value history of claimed elements.
//!
//! A view that keeps a history appends a copy of every element it claims,
//! and of every element claimed by views derived from it afterwards. Handles
//! are shared, so a predicate can read the history of the very view it
//! filters for.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// A shared, append-only record of claimed elements.
pub struct History<T> {
    items: Rc<RefCell<Vec<T>>>,
    copy: fn(&T) -> T,
}

impl<T: Clone> History<T> {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self {
            items: Rc::new(RefCell::new(Vec::new())),
            copy: T::clone,
        }
    }

    /// Returns a copy of the recorded elements, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// Returns the most recently recorded element.
    pub fn last(&self) -> Option<T> {
        self.items.borrow().last().cloned()
    }
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    /// An empty history that copies elements the same way.
    pub(crate) fn fresh(&self) -> Self {
        Self {
            items: Rc::new(RefCell::new(Vec::new())),
            copy: self.copy,
        }
    }

    pub(crate) fn copy_of(&self, item: &T) -> T {
        (self.copy)(item)
    }

    pub(crate) fn record(&self, item: &T) {
        match self.items.try_borrow_mut() {
            Ok(mut items) => items.push((self.copy)(item)),
            Err(_) => tracing::warn!("history is being read, claim not recorded"),
        }
    }

    /// Runs `f` over the recorded elements.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.borrow())
    }

    /// Returns the number of recorded elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns true if nothing was recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Returns true if both handles share one record.
    pub fn ptr_eq(&self, other: &History<T>) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: PartialEq> History<T> {
    /// Returns true if an element equal to `item` was recorded.
    pub fn contains(&self, item: &T) -> bool {
        self.items.borrow().contains(item)
    }
}

impl<T> Clone for History<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            copy: self.copy,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for History<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}
