//! Picky Core - Core types and error definitions shared by the Picky crates.
//!
//! This crate provides the foundational vocabulary for consumption-sharing views:
//!
//! - `Position`: Index of an element in source emission order
//! - `ViewId`: Identifier of a live view registered with a ledger
//! - `Error`: Error types raised by sources, predicates and view derivations
//!
//! # Example
//!
//! ```rust
//! use picky_core::{Error, Position};
//!
//! let position: Position = 3;
//! let err = Error::predicate("division by zero");
//!
//! assert_eq!(position + 1, 4);
//! assert!(err.is_retryable());
//! ```

#![no_std]

extern crate alloc;

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Position, ViewId, ROOT_VIEW_ID};
