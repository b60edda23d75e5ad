//! Merging two views into one source.

use crate::view::View;
use picky_core::Result;
use picky_source::Source;

/// A source that interleaves the elements of two views.
///
/// Each pull positions both views on their next element and asks the
/// comparator which one goes first. Only the chosen element is claimed; the
/// other side keeps its head for the next pull. The two views may belong to
/// different families or to the same one.
pub struct MergeSource<T: 'static, F> {
    left: View<T>,
    right: View<T>,
    pick_left: F,
}

impl<T: 'static, F> MergeSource<T, F>
where
    F: FnMut(&T, &T) -> bool,
{
    /// Creates a merge of `left` and `right`.
    pub fn new(left: View<T>, right: View<T>, pick_left: F) -> Self {
        Self {
            left,
            right,
            pick_left,
        }
    }

    /// Returns the merged views.
    pub fn into_parts(self) -> (View<T>, View<T>) {
        (self.left, self.right)
    }
}

impl<T: 'static, F> Source for MergeSource<T, F>
where
    F: FnMut(&T, &T) -> bool,
{
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        let left = self.left.seek_head()?;
        let right = self.right.seek_head()?;
        match (left, right) {
            (None, None) => Ok(None),
            (Some(_), None) => self.left.try_next(),
            (None, Some(_)) => self.right.try_next(),
            (Some(a), Some(b)) => {
                let pick_left = &mut self.pick_left;
                let right = &self.right;
                let choice = self
                    .left
                    .inspect(a, |x| right.inspect(b, |y| pick_left(x, y)))?
                    .transpose()?
                    .flatten();
                match choice {
                    Some(false) => self.right.try_next(),
                    _ => self.left.try_next(),
                }
            }
        }
    }
}
