//! Layout configuration objects and layout tree construction.

use crate::box_layout::BoxLayout;
use crate::context::LayoutContext;
use crate::dpi::Dpi;
use crate::error::ConfigError;
use crate::flags::Alignment2D;
use crate::rect::Margins;
use crate::tree::{ContainerItem, ContainerLayout, Geometry, ItemId, ItemKind, Leaf, LayoutItem, LayoutTree};
use crate::widget::{Container, Handle, Widget};
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A child of a container, as seen when its layout item is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildItem {
    pub handle: Handle,
    pub item: ItemId,
}

/// The layout of a container.
///
/// Implementors hold live configuration (margins, spacing, stretch factors, …) and hand out a
/// snapshot of it for every layout pass.
pub trait Layout: fmt::Debug {
    /// Margins in 1/96" units.
    fn margins(&self) -> Margins;

    /// Spacing between items in 1/96" units.
    fn spacing(&self) -> i32;

    fn alignment(&self) -> Alignment2D;

    /// Creates the algorithm-specific state of the container item for one pass.
    fn create_layout_item(&self, children: &[ChildItem]) -> Box<dyn ContainerLayout>;
}

/// Configuration shared by all layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBase {
    margins: Margins,
    spacing: i32,
    alignment: Alignment2D,
}

impl LayoutBase {
    pub const DEFAULT_MARGINS: i32 = 9;
    pub const DEFAULT_SPACING: i32 = 6;

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Sets the margins in 1/96" units.
    pub fn set_margins(&mut self, margins: Margins) -> Result<(), ConfigError> {
        if margins.is_negative() {
            return Err(ConfigError::NegativeMargins);
        }
        self.margins = margins;
        Ok(())
    }

    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    /// Sets the spacing in 1/96" units.
    pub fn set_spacing(&mut self, spacing: i32) -> Result<(), ConfigError> {
        if spacing < 0 {
            return Err(ConfigError::NegativeSpacing);
        }
        self.spacing = spacing;
        Ok(())
    }

    pub fn alignment(&self) -> Alignment2D {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment2D) {
        self.alignment = alignment;
    }
}

impl Default for LayoutBase {
    fn default() -> Self {
        LayoutBase {
            margins: Margins::uniform(LayoutBase::DEFAULT_MARGINS),
            spacing: LayoutBase::DEFAULT_SPACING,
            alignment: Alignment2D::Default,
        }
    }
}

/// Returns an error unless `widget` is a child of `container`.
pub(crate) fn ensure_child(container: &dyn Container, widget: Handle) -> Result<(), ConfigError> {
    if container.children().iter().any(|child| child.handle() == widget) {
        Ok(())
    } else {
        Err(ConfigError::UnknownWidget(widget))
    }
}

/// Snapshots a container and all of its descendants for one layout pass.
///
/// Must be called on the thread that owns the widgets.
pub fn build_layout_tree(root: &dyn Container, dpi: Dpi) -> LayoutTree {
    let mut items = Vec::new();
    let root_id = push_container(&mut items, root, None, dpi);
    LayoutTree::new(items, root_id, LayoutContext::new(dpi))
}

fn geometry(widget: &dyn Widget, dpi: Dpi) -> Geometry {
    let bounds = widget.bounds();
    Geometry {
        alignment: widget.alignment(),
        min_size: dpi.size_from_96(widget.min_size()),
        max_size: dpi.size_from_96(widget.max_size()),
        ideal_size: bounds.size,
        size: bounds.size,
        client_size: bounds.size,
        consuming_space_when_invisible: widget.always_consume_space(),
    }
}

fn push_widget(
    items: &mut Vec<LayoutItem>,
    widget: &dyn Widget,
    parent: ItemId,
    dpi: Dpi,
) -> ItemId {
    if let Some(container) = widget.as_container() {
        return push_container(items, container, Some(parent), dpi);
    }

    let leaf = widget.create_layout_item(dpi);
    let mut geometry = geometry(widget, dpi);
    geometry.ideal_size = leaf.ideal_size;

    let id = ItemId(items.len());
    items.push(LayoutItem {
        handle: widget.handle(),
        geometry,
        visible: widget.visible(),
        parent: Some(parent),
        kind: ItemKind::Leaf(Leaf {
            flags: leaf.flags,
            min_size: leaf.min_size,
            height_for_width: leaf.height_for_width,
            role: leaf.role,
        }),
    });
    id
}

fn push_container(
    items: &mut Vec<LayoutItem>,
    container: &dyn Container,
    parent: Option<ItemId>,
    dpi: Dpi,
) -> ItemId {
    let widget = container.as_widget();
    let mut geometry = geometry(widget, dpi);
    geometry.client_size = container.client_size();

    // the slot is reserved so children can refer to it; the kind is filled in below
    let id = ItemId(items.len());
    items.push(LayoutItem {
        handle: widget.handle(),
        geometry,
        visible: widget.visible(),
        parent,
        kind: ItemKind::Leaf(Leaf {
            flags: Default::default(),
            min_size: None,
            height_for_width: None,
            role: Default::default(),
        }),
    });

    let children: Vec<_> = container
        .children()
        .into_iter()
        .map(|child| ChildItem {
            handle: child.handle(),
            item: push_widget(items, child, id, dpi),
        })
        .collect();

    let fallback;
    let layout: &dyn Layout = match container.layout() {
        Some(layout) if !children.is_empty() => layout,
        _ => {
            let mut hbox = BoxLayout::horizontal();
            let _ = hbox.base_mut().set_margins(Margins::default());
            fallback = hbox;
            &fallback
        }
    };

    items[id.0].kind = ItemKind::Container(ContainerItem {
        children: children.iter().map(|child| child.item).collect(),
        margins: layout.margins(),
        spacing: layout.spacing(),
        alignment: layout.alignment(),
        layout: layout.create_layout_item(&children),
        min_sizes: Mutex::new(HashMap::new()),
    });
    id
}
