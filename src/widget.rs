//! Capability traits implemented by live widgets.

use crate::dpi::Dpi;
use crate::flags::{Alignment2D, LayoutFlags};
use crate::layout::Layout;
use crate::rect::{size, Rect, Size};
use cgmath::{Vector2, Zero};
use core::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Widget identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32, u16, u16, [u8; 8]);

impl Handle {
    /// Creates a new random handle.
    pub fn new() -> Handle {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        Handle(a, b, c, *d)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::new()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08x}-{:04x}-{:04x}", self.0, self.1, self.2)
    }
}

/// Measures the height an item needs for a given width, in device pixels.
pub type HeightForWidth = Arc<dyn Fn(i32) -> i32 + Send + Sync>;

/// How a leaf item takes part in the tie-break rules of the sizing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafRole {
    Regular,
    /// Empty space; sorted after non-spacers and never counted as visible content.
    Spacer { greedy_locally_only: bool },
    /// The draggable separator between two splitter panes.
    SplitterHandle,
}

impl Default for LeafRole {
    fn default() -> Self {
        LeafRole::Regular
    }
}

/// Size negotiation state a leaf widget hands to the layout system.
#[derive(Clone)]
pub struct LeafItem {
    pub flags: LayoutFlags,
    /// In device pixels.
    pub ideal_size: Size,
    /// Own minimum size in device pixels; falls back to the ideal size.
    pub min_size: Option<Size>,
    pub height_for_width: Option<HeightForWidth>,
    pub role: LeafRole,
}

impl LeafItem {
    /// An item that wants all the space it can get.
    pub fn greedy(dpi: Dpi) -> LeafItem {
        LeafItem {
            flags: LayoutFlags::all(),
            ideal_size: dpi.size_from_96(size(100, 100)),
            min_size: Some(dpi.size_from_96(size(50, 50))),
            height_for_width: None,
            role: LeafRole::Regular,
        }
    }
}

impl Default for LeafItem {
    fn default() -> Self {
        LeafItem {
            flags: LayoutFlags::empty(),
            ideal_size: Vector2::zero(),
            min_size: None,
            height_for_width: None,
            role: LeafRole::Regular,
        }
    }
}

impl fmt::Debug for LeafItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LeafItem")
            .field("flags", &self.flags)
            .field("ideal_size", &self.ideal_size)
            .field("min_size", &self.min_size)
            .field("height_for_width", &self.height_for_width.is_some())
            .field("role", &self.role)
            .finish()
    }
}

/// A live widget, as seen by the layout system.
///
/// Widgets are only ever touched on the UI thread that owns them. Layout computations work on
/// snapshots taken through this trait.
pub trait Widget: fmt::Debug {
    fn handle(&self) -> Handle;

    fn visible(&self) -> bool {
        true
    }

    /// Alignment inside the space the enclosing layout assigns.
    fn alignment(&self) -> Alignment2D {
        Alignment2D::Default
    }

    /// If true, the widget keeps its space while hidden.
    fn always_consume_space(&self) -> bool {
        false
    }

    /// Explicit minimum size in 1/96" units; zero means none.
    fn min_size(&self) -> Size {
        Vector2::zero()
    }

    /// Explicit maximum size in 1/96" units; zero means unbounded.
    fn max_size(&self) -> Size {
        Vector2::zero()
    }

    /// Current bounds in device pixels, relative to the parent's client area.
    fn bounds(&self) -> Rect;

    /// Describes how this widget negotiates its size. Widgets that don't say otherwise take all
    /// the space they are given.
    fn create_layout_item(&self, dpi: Dpi) -> LeafItem {
        LeafItem::greedy(dpi)
    }

    /// Returns the container interface if this widget has children.
    fn as_container(&self) -> Option<&dyn Container> {
        None
    }
}

/// A widget with children.
pub trait Container {
    fn as_widget(&self) -> &dyn Widget;

    /// Children in insertion order.
    fn children(&self) -> Vec<&dyn Widget>;

    fn layout(&self) -> Option<&dyn Layout>;

    /// Size of the area children are laid out in, in device pixels.
    fn client_size(&self) -> Size {
        self.as_widget().bounds().size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaf_item_is_inert() {
        let leaf = LeafItem::default();
        assert!(leaf.flags.is_empty());
        assert_eq!(leaf.ideal_size, size(0, 0));
        assert_eq!(leaf.min_size, None);
        assert!(leaf.height_for_width.is_none());
        assert_eq!(leaf.role, LeafRole::Regular);
    }

    #[test]
    fn greedy_leaf_item_scales_with_dpi() {
        let leaf = LeafItem::greedy(Dpi(144));
        assert_eq!(leaf.flags, LayoutFlags::all());
        assert_eq!(leaf.ideal_size, size(150, 150));
        assert_eq!(leaf.min_size, Some(size(75, 75)));
    }
}
