//! Picky Source - Pull-based element producers for Picky views.
//!
//! A `Source` is an ordered, forward-only producer. Every pull returns either
//! the next item, `Ok(None)` once the source is exhausted, or an error when the
//! producer itself failed. Exhaustion is terminal: once a source has returned
//! `Ok(None)` it keeps doing so.
//!
//! # Adapters
//!
//! - `IterSource`: any Rust iterator, finite or unbounded
//! - `ListSource`: an owned list drained from the front
//! - `FnSource`: a closure producing `Option<T>`
//! - `ChunkedSource`: a paged loader with a page limit
//!
//! # Example
//!
//! ```rust
//! use picky_source::{IterSource, ListSource, Source};
//!
//! let mut naturals = IterSource::new(0u64..);
//! assert_eq!(naturals.pull().unwrap(), Some(0));
//! assert_eq!(naturals.pull().unwrap(), Some(1));
//!
//! let mut list = ListSource::new(vec!['a']);
//! assert_eq!(list.pull().unwrap(), Some('a'));
//! assert_eq!(list.pull().unwrap(), None);
//! assert_eq!(list.pull().unwrap(), None);
//! ```

#![no_std]

extern crate alloc;

pub mod chunked;
pub mod iter;
pub mod list;

pub use chunked::{ChunkedConfig, ChunkedSource};
pub use iter::{FnSource, IterSource};
pub use list::ListSource;

use alloc::boxed::Box;
use picky_core::Result;

/// An ordered, forward-only producer of items.
pub trait Source {
    /// The type of item produced.
    type Item;

    /// Pulls the next item.
    ///
    /// Returns `Ok(None)` when exhausted. Implementations must keep returning
    /// `Ok(None)` after the first exhaustion. A failed pull must not skip an
    /// item: the next successful pull returns the item that would have been
    /// produced.
    fn pull(&mut self) -> Result<Option<Self::Item>>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    type Item = S::Item;

    #[inline]
    fn pull(&mut self) -> Result<Option<Self::Item>> {
        (**self).pull()
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    type Item = S::Item;

    #[inline]
    fn pull(&mut self) -> Result<Option<Self::Item>> {
        (**self).pull()
    }
}
