//! List backed source.

use crate::Source;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use picky_core::Result;

/// A source that drains an owned list from the front.
#[derive(Clone, Debug, Default)]
pub struct ListSource<T> {
    items: VecDeque<T>,
}

impl<T> ListSource<T> {
    /// Creates a source over the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Returns the number of items not yet pulled.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl<T> From<Vec<T>> for ListSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> Source for ListSource<T> {
    type Item = T;

    #[inline]
    fn pull(&mut self) -> Result<Option<T>> {
        Ok(self.items.pop_front())
    }
}
