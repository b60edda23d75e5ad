//! Iterator and closure backed sources.

use crate::Source;
use core::iter::Fuse;
use picky_core::Result;

/// A source over any iterator.
///
/// The iterator is fused, so exhaustion stays terminal even for iterators
/// that would resume after returning `None`.
#[derive(Clone, Debug)]
pub struct IterSource<I: Iterator> {
    iter: Fuse<I>,
}

impl<I: Iterator> IterSource<I> {
    /// Creates a source from anything iterable.
    pub fn new<It>(iterable: It) -> Self
    where
        It: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: iterable.into_iter().fuse(),
        }
    }
}

impl<I: Iterator> Source for IterSource<I> {
    type Item = I::Item;

    #[inline]
    fn pull(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.iter.next())
    }
}

/// A source over a producer closure.
///
/// The closure is not called again once it has returned `None`.
pub struct FnSource<F> {
    produce: F,
    done: bool,
}

impl<T, F> FnSource<F>
where
    F: FnMut() -> Option<T>,
{
    /// Creates a source that calls `produce` for every pull.
    pub fn new(produce: F) -> Self {
        Self {
            produce,
            done: false,
        }
    }
}

impl<T, F> Source for FnSource<F>
where
    F: FnMut() -> Option<T>,
{
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        if self.done {
            return Ok(None);
        }
        let item = (self.produce)();
        if item.is_none() {
            tracing::debug!("closure source exhausted");
            self.done = true;
        }
        Ok(item)
    }
}
