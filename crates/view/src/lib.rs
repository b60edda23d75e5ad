//! Picky View - Lazy views that share consumption across a family.
//!
//! A `View` wraps a pull-based source and can derive filtered sub-views. All
//! views derived from one root form a *family* that shares a single `Ledger`:
//! an element yielded by any view of the family is never yielded again by any
//! other view, whether ancestor, descendant or sibling. Rejecting an element
//! does not consume it, so it stays available to the rest of the family.
//!
//! # Core Concepts
//!
//! - `View`: A lazy, forward-only window over a shared source
//! - `Ledger`: The family's consumed positions and materialization buffer
//! - `Window`: Skip, limit and step constraints for derived views
//! - `History`: A shared record of the elements a view has claimed
//! - `MergeSource`: A source interleaving two views
//!
//! Views are single-threaded: a family lives behind `Rc<RefCell<..>>`.
//!
//! # Example
//!
//! ```rust
//! use picky_view::View;
//!
//! let mut numbers = View::over(0u32..10);
//! let mut evens = numbers.filter(|n| n % 2 == 0);
//!
//! assert_eq!(evens.drain_all().unwrap(), vec![0, 2, 4, 6, 8]);
//! assert_eq!(numbers.drain_all().unwrap(), vec![1, 3, 5, 7, 9]);
//! ```
//!
//! Rebinding a view to a filter of itself gives a sieve:
//!
//! ```rust
//! use picky_view::View;
//!
//! let mut view = View::over(2u64..);
//! let mut primes = Vec::new();
//! for _ in 0..6 {
//!     let p = view.next().unwrap();
//!     primes.push(p);
//!     view = view.filter(move |n| n % p != 0);
//! }
//! assert_eq!(primes, vec![2, 3, 5, 7, 11, 13]);
//! ```

#![no_std]

extern crate alloc;

pub mod history;
pub mod ledger;
pub mod merge;
pub mod view;
pub mod window;

pub use history::History;
pub use ledger::{Ledger, LedgerStats};
pub use merge::MergeSource;
pub use view::{IntoIter, Iter, Predicate, TryIter, View};
pub use window::Window;

// Re-export commonly used types from dependencies
pub use picky_core::{Error, Position, Result, ViewId};
pub use picky_source::{ChunkedConfig, ChunkedSource, FnSource, IterSource, ListSource, Source};
