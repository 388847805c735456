//! Layout core for native widget toolkits.
//!
//! # Conceptual overview
//! Perch lays out a tree of live, platform-owned widgets without blocking the UI thread for the
//! whole computation.
//!
//! ## Layout items
//! At the start of every layout pass the widget hierarchy is snapshotted into a [`LayoutTree`]:
//! an arena with one item per widget. Leaf items carry layout flags, an ideal size, an optional
//! minimum size and an optional height-for-width measurer. Container items carry margins,
//! spacing, alignment and the state of one sizing algorithm (box, grid, flow or splitter). The
//! snapshot never refers back to the live widgets, so it can be handed to other threads.
//!
//! Items negotiate sizes through a small protocol: a container's minimum size for a given client
//! size is derived from its children's effective minimum sizes, and laying out a container yields
//! bounds for its direct children only.
//!
//! ## Pipeline
//! A [`LayoutPerformer`] runs one coordination thread per form. Each request first fills the
//! tree's [`LayoutContext`] with effective minimum sizes on a single thread, then lays out every
//! container as a separate task on a thread pool. A newer request cancels the one in flight;
//! results of superseded requests are dropped. All performers of an application share one pool,
//! built from a [`PerformerConfig`].
//!
//! ## Window groups
//! Widgets may only be touched by the thread that owns them. Finished layouts are queued on that
//! thread's [`WindowGroup`], which keeps only the latest result per form, and applied when the
//! thread calls [`WindowGroup::run_synchronized`]. While the user resizes a form, results are
//! instead returned to the waiting UI thread directly so the window never shows a stale layout.
//!
//! ## Coordinate system
//! Sizes in layout configuration (margins, spacing, minimum and maximum sizes) are in 1/96"
//! units and converted to device pixels with the pass's [`Dpi`]. Layout results are in device
//! pixels, relative to the client area of the enclosing container. Positive y points down.
//!
//! ## Backends
//! Results reach the screen through a [`Backend`], which moves all widgets of a pass in one
//! deferred transaction.

pub mod apply;
pub mod backend;
mod box_layout;
mod context;
mod dpi;
mod error;
mod flags;
mod flow;
mod grid;
mod host;
mod layout;
pub mod performer;
mod rect;
mod spacer;
mod splitter;
#[cfg(test)]
mod testing;
mod tree;
mod widget;
pub mod window_group;

pub use apply::apply_layout_results;
pub use backend::{Backend, WindowState};
pub use box_layout::BoxLayout;
pub use context::LayoutContext;
pub use dpi::Dpi;
pub use error::{ConfigError, PerformerError};
pub use flags::{Align, Alignment2D, LayoutFlags, Orientation};
pub use flow::FlowLayout;
pub use grid::{GridLayout, GridRange};
pub use host::Host;
pub use layout::{build_layout_tree, ChildItem, Layout, LayoutBase};
pub use performer::{LayoutPerformer, PerformerConfig};
pub use rect::{size, Margins, Point, Rect, Size};
pub use spacer::Spacer;
pub use splitter::{SplitterHandle, SplitterLayout};
pub use tree::{
    ContainerLayout, ContainerView, Geometry, ItemId, LayoutItem, LayoutResult, LayoutResultItem,
    LayoutTree,
};
pub use widget::{Container, Handle, HeightForWidth, LeafItem, LeafRole, Widget};
pub use window_group::{FormLayoutResult, GroupResource, WindowGroup, WindowGroupManager};
