use crate::dpi::Dpi;
use crate::rect::Size;
use crate::tree::ItemId;
use std::collections::HashMap;

/// Pass-scoped layout state shared by every item of a [`LayoutTree`](crate::tree::LayoutTree).
///
/// The effective minimum size map is filled in a single-threaded pre-pass before any subtree is
/// laid out concurrently. Once the tree has been moved behind an `Arc` it can no longer be written
/// to, so concurrent readers never observe a partially populated map.
#[derive(Debug, Clone)]
pub struct LayoutContext {
    dpi: Dpi,
    min_sizes: HashMap<ItemId, Size>,
}

impl LayoutContext {
    pub fn new(dpi: Dpi) -> LayoutContext {
        LayoutContext {
            dpi,
            min_sizes: HashMap::new(),
        }
    }

    /// The resolution used for every conversion in this pass.
    pub fn dpi(&self) -> Dpi {
        self.dpi
    }

    /// Returns the cached effective minimum size of an item, if the pre-pass has visited it.
    pub fn min_size_effective(&self, item: ItemId) -> Option<Size> {
        self.min_sizes.get(&item).copied()
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.min_sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min_sizes.is_empty()
    }

    pub(crate) fn insert(&mut self, item: ItemId, size: Size) {
        self.min_sizes.insert(item, size);
    }
}
