//! Identifier types shared across a view family.

/// Index of an element in the order a source emitted it, starting at 0.
pub type Position = u64;

/// Identifier of a view registered with a family's ledger.
///
/// Ids are assigned by the ledger in registration order and are never reused
/// within a family.
pub type ViewId = u64;

/// The id handed to the first view registered with a fresh ledger.
pub const ROOT_VIEW_ID: ViewId = 0;
