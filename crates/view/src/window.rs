//! Windows over the elements a view accepts.
//!
//! A window limits which accepted elements a derived view actually claims:
//! it can pass over a number of them first (`skip`), claim only every n-th
//! (`step`), and stop after a number of claims (`limit`). Elements passed over
//! by a window stay unclaimed and remain visible to the rest of the family.

use picky_core::{Error, Result};

/// Window configuration for a derived view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    skip: usize,
    limit: Option<usize>,
    step: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    /// Creates a window that claims every accepted element.
    pub const fn new() -> Self {
        Self {
            skip: 0,
            limit: None,
            step: 1,
        }
    }

    /// Builds a window from slice-style bounds.
    ///
    /// `start` accepted elements are passed over, at most `stop` elements are
    /// claimed, and only every `step`-th accepted element is claimed.
    pub fn slice(start: Option<usize>, stop: Option<usize>, step: Option<usize>) -> Result<Self> {
        if start.is_none() && stop.is_none() && step.is_none() {
            return Err(Error::invalid_window("slice needs a start, stop or step"));
        }
        let window = Self {
            skip: start.unwrap_or(0),
            limit: stop,
            step: step.unwrap_or(1),
        };
        window.validate()?;
        Ok(window)
    }

    /// Sets how many accepted elements are passed over before the first claim.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of claims.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the stride between claims.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Checks the window for arguments no view can honor.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::invalid_window("step must be at least 1"));
        }
        Ok(())
    }

    /// Returns how many accepted elements are passed over before the first claim.
    #[inline]
    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Returns the maximum number of claims, if bounded.
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the stride between claims.
    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }
}

/// Running state of a window inside a view.
#[derive(Clone, Debug)]
pub(crate) struct Stride {
    remaining: Option<usize>,
    pass: usize,
    step: usize,
}

impl Stride {
    pub(crate) fn new(window: Window) -> Self {
        Self {
            remaining: window.limit,
            pass: window.skip,
            step: window.step.max(1),
        }
    }

    /// True once the claim limit is used up.
    #[inline]
    pub(crate) fn is_spent(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Decides whether an accepted element is a claim candidate. Elements that
    /// are passed over count down the gap to the next candidate.
    pub(crate) fn admit(&mut self) -> bool {
        if self.pass > 0 {
            self.pass -= 1;
            false
        } else {
            true
        }
    }

    pub(crate) fn record_claim(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.pass = self.step - 1;
    }
}
