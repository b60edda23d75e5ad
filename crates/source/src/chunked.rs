//! Paged source.
//!
//! `ChunkedSource` loads items page by page through a loader closure, for
//! producers that fetch in batches (database cursors, paginated APIs). A page
//! limit guards against a loader that never runs dry.

use crate::Source;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use picky_core::{Error, Result};

/// Default number of items requested per page.
pub const DEFAULT_CHUNK_SIZE: usize = 25;

/// Default number of pages loaded before the source is considered runaway.
pub const DEFAULT_MAX_PAGES: usize = 8;

/// Configuration for a `ChunkedSource`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkedConfig {
    chunk_size: usize,
    max_pages: usize,
}

impl Default for ChunkedConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedConfig {
    /// Creates a configuration with the default chunk size and page limit.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Sets the number of items requested per page. Zero is raised to one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets the maximum number of pages to load.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Returns the chunk size.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the page limit.
    #[inline]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

/// A source that refills from a page loader.
///
/// The loader is called as `loader(page, chunk_size)` with `page` counting
/// from 0. An empty page marks the end of the data. A loader error leaves the
/// page counter untouched, so the next pull asks for the same page again.
pub struct ChunkedSource<T, F> {
    loader: F,
    config: ChunkedConfig,
    page: usize,
    pending: VecDeque<T>,
    exhausted: bool,
}

impl<T, F> ChunkedSource<T, F>
where
    F: FnMut(usize, usize) -> Result<Vec<T>>,
{
    /// Creates a chunked source with the default configuration.
    pub fn new(loader: F) -> Self {
        Self::with_config(loader, ChunkedConfig::default())
    }

    /// Creates a chunked source with the given configuration.
    pub fn with_config(loader: F, config: ChunkedConfig) -> Self {
        Self {
            loader,
            config,
            page: 0,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Returns the number of pages loaded so far.
    #[inline]
    pub fn pages_loaded(&self) -> usize {
        self.page
    }

    fn refill(&mut self) -> Result<()> {
        if self.page == self.config.max_pages {
            return Err(Error::runaway_source(self.config.max_pages));
        }
        let rows = (self.loader)(self.page, self.config.chunk_size)?;
        if rows.is_empty() {
            tracing::debug!(page = self.page, "chunked source exhausted");
            self.exhausted = true;
        } else {
            tracing::trace!(page = self.page, rows = rows.len(), "chunked source page loaded");
            self.page += 1;
            self.pending.extend(rows);
        }
        Ok(())
    }
}

impl<T, F> Source for ChunkedSource<T, F>
where
    F: FnMut(usize, usize) -> Result<Vec<T>>,
{
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        if self.pending.is_empty() && !self.exhausted {
            self.refill()?;
        }
        Ok(self.pending.pop_front())
    }
}
