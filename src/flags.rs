//! Layout flags, orientation and alignment.

use crate::rect::{size, Size};
use bitflags::bitflags;

bitflags! {
    /// Specifies how a widget wants to be treated by a layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayoutFlags: u8 {
        /// May be shrunk horizontally.
        const SHRINKABLE_HORZ = 1 << 0;
        /// May be shrunk vertically.
        const SHRINKABLE_VERT = 1 << 1;
        /// May be enlarged horizontally.
        const GROWABLE_HORZ = 1 << 2;
        /// May be enlarged vertically.
        const GROWABLE_VERT = 1 << 3;
        /// Wants to take up as much horizontal space as possible.
        const GREEDY_HORZ = 1 << 4;
        /// Wants to take up as much vertical space as possible.
        const GREEDY_VERT = 1 << 5;
    }
}

impl LayoutFlags {
    pub fn shrinkable(self, orientation: Orientation) -> bool {
        self.contains(match orientation {
            Orientation::Horizontal => LayoutFlags::SHRINKABLE_HORZ,
            Orientation::Vertical => LayoutFlags::SHRINKABLE_VERT,
        })
    }

    pub fn growable(self, orientation: Orientation) -> bool {
        self.contains(match orientation {
            Orientation::Horizontal => LayoutFlags::GROWABLE_HORZ,
            Orientation::Vertical => LayoutFlags::GROWABLE_VERT,
        })
    }

    pub fn greedy(self, orientation: Orientation) -> bool {
        self.contains(match orientation {
            Orientation::Horizontal => LayoutFlags::GREEDY_HORZ,
            Orientation::Vertical => LayoutFlags::GREEDY_VERT,
        })
    }
}

/// The primary axis of a box, flow or splitter layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other axis.
    pub fn cross(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// The component of `s` along this axis.
    pub fn primary(self, s: Size) -> i32 {
        match self {
            Orientation::Horizontal => s.x,
            Orientation::Vertical => s.y,
        }
    }

    /// The component of `s` across this axis.
    pub fn secondary(self, s: Size) -> i32 {
        self.cross().primary(s)
    }

    /// Builds a size from primary and secondary components.
    pub fn size(self, primary: i32, secondary: i32) -> Size {
        match self {
            Orientation::Horizontal => size(primary, secondary),
            Orientation::Vertical => size(secondary, primary),
        }
    }
}

/// Placement along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    Near,
    Center,
    Far,
}

/// Two-dimensional alignment of an item inside the space assigned to it.
///
/// `Default` defers to the alignment of the enclosing layout; a layout with default alignment
/// centers along the primary axis and fills or centers along the secondary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment2D {
    Default,
    Aligned { horizontal: Align, vertical: Align },
}

impl Alignment2D {
    pub fn new(horizontal: Align, vertical: Align) -> Alignment2D {
        Alignment2D::Aligned {
            horizontal,
            vertical,
        }
    }

    /// Returns this alignment, or `fallback` if this is the default alignment.
    pub fn or(self, fallback: Alignment2D) -> Alignment2D {
        match self {
            Alignment2D::Default => fallback,
            aligned => aligned,
        }
    }

    /// Horizontal placement; default alignment centers.
    pub fn horizontal(self) -> Align {
        match self {
            Alignment2D::Default => Align::Center,
            Alignment2D::Aligned { horizontal, .. } => horizontal,
        }
    }

    /// Vertical placement; default alignment centers.
    pub fn vertical(self) -> Align {
        match self {
            Alignment2D::Default => Align::Center,
            Alignment2D::Aligned { vertical, .. } => vertical,
        }
    }

    /// Placement along the given axis.
    pub fn along(self, orientation: Orientation) -> Align {
        match orientation {
            Orientation::Horizontal => self.horizontal(),
            Orientation::Vertical => self.vertical(),
        }
    }
}

impl Default for Alignment2D {
    fn default() -> Self {
        Alignment2D::Default
    }
}
