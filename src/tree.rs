use crate::context::LayoutContext;
use crate::dpi::Dpi;
use crate::flags::{Alignment2D, LayoutFlags};
use crate::rect::{max_size, Margins, Rect, Size};
use crate::widget::{Handle, HeightForWidth, LeafRole};
use cgmath::{Vector2, Zero};
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Index of an item in a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub(crate) usize);

/// Size constraints of an item, captured when the layout pass starts. All sizes are in device
/// pixels; a zero component of `max_size` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub alignment: Alignment2D,
    pub min_size: Size,
    pub max_size: Size,
    pub ideal_size: Size,
    pub size: Size,
    pub client_size: Size,
    pub consuming_space_when_invisible: bool,
}

/// A snapshot of a widget's size negotiation state for one layout pass.
#[derive(Debug)]
pub struct LayoutItem {
    pub(crate) handle: Handle,
    pub(crate) geometry: Geometry,
    pub(crate) visible: bool,
    pub(crate) parent: Option<ItemId>,
    pub(crate) kind: ItemKind,
}

impl LayoutItem {
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// The container this item belongs to; `None` for the root.
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }
}

#[derive(Debug)]
pub(crate) enum ItemKind {
    Leaf(Leaf),
    Container(ContainerItem),
}

pub(crate) struct Leaf {
    pub(crate) flags: LayoutFlags,
    pub(crate) min_size: Option<Size>,
    pub(crate) height_for_width: Option<HeightForWidth>,
    pub(crate) role: LeafRole,
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("flags", &self.flags)
            .field("min_size", &self.min_size)
            .field("height_for_width", &self.height_for_width.is_some())
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct ContainerItem {
    pub(crate) children: Vec<ItemId>,
    /// In 1/96" units.
    pub(crate) margins: Margins,
    /// In 1/96" units.
    pub(crate) spacing: i32,
    pub(crate) alignment: Alignment2D,
    pub(crate) layout: Box<dyn ContainerLayout>,
    /// Memoized `min_size_for_size` results.
    pub(crate) min_sizes: Mutex<HashMap<Size, Size>>,
}

/// Algorithm-specific state of a container item (box, grid, flow or splitter).
pub trait ContainerLayout: fmt::Debug + Send + Sync {
    /// Layout flags of the container, derived from its children.
    fn layout_flags(&self, container: &ContainerView<'_>) -> LayoutFlags;

    /// Preferred size of the container.
    fn ideal_size(&self, container: &ContainerView<'_>) -> Size {
        container.min_size()
    }

    /// Minimum size required to lay out the children in the given client size.
    fn min_size_for_size(&self, container: &ContainerView<'_>, size: Size) -> Size;

    /// Computes the bounds of the direct children inside the given client size.
    fn perform_layout(
        &self,
        container: &ContainerView<'_>,
        client_size: Size,
    ) -> Vec<LayoutResultItem>;
}

/// Bounds assigned to one item, relative to its container's client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutResultItem {
    pub(crate) item: ItemId,
    pub handle: Handle,
    pub bounds: Rect,
}

impl LayoutResultItem {
    pub fn item(&self) -> ItemId {
        self.item
    }
}

/// The output of one container's sizing algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutResult {
    pub container: Handle,
    pub items: Vec<LayoutResultItem>,
}

/// A read-only view of a container item, handed to [`ContainerLayout`] implementations.
pub struct ContainerView<'a> {
    tree: &'a LayoutTree,
    id: ItemId,
    item: &'a LayoutItem,
    container: &'a ContainerItem,
}

impl<'a> ContainerView<'a> {
    pub fn tree(&self) -> &'a LayoutTree {
        self.tree
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn handle(&self) -> Handle {
        self.item.handle
    }

    pub fn geometry(&self) -> &'a Geometry {
        &self.item.geometry
    }

    pub fn client_size(&self) -> Size {
        self.item.geometry.client_size
    }

    pub fn children(&self) -> &'a [ItemId] {
        &self.container.children
    }

    pub fn dpi(&self) -> Dpi {
        self.tree.dpi()
    }

    /// Margins in device pixels.
    pub fn margins(&self) -> Margins {
        self.dpi().margins_from_96(self.container.margins)
    }

    /// Spacing in device pixels.
    pub fn spacing(&self) -> i32 {
        self.dpi().int_from_96(self.container.spacing)
    }

    pub fn alignment(&self) -> Alignment2D {
        self.container.alignment
    }

    /// Minimum size for the container's current client size.
    pub fn min_size(&self) -> Size {
        self.tree.min_size_for_size(self.id, self.client_size())
    }

    pub fn min_size_effective_for_child(&self, child: ItemId) -> Size {
        self.tree.min_size_effective(child)
    }

    /// True if any child has a height that depends on its width.
    pub fn has_height_for_width(&self) -> bool {
        self.tree.has_height_for_width(self.id)
    }
}

/// Arena of layout items for one layout pass.
///
/// Built on the UI thread by [`build_layout_tree`](crate::layout::build_layout_tree), mutated
/// only by the single-threaded pre-pass, and shared read-only afterwards.
#[derive(Debug)]
pub struct LayoutTree {
    items: Vec<LayoutItem>,
    root: ItemId,
    context: LayoutContext,
}

impl LayoutTree {
    pub(crate) fn new(items: Vec<LayoutItem>, root: ItemId, context: LayoutContext) -> LayoutTree {
        LayoutTree {
            items,
            root,
            context,
        }
    }

    pub fn root(&self) -> ItemId {
        self.root
    }

    pub fn context(&self) -> &LayoutContext {
        &self.context
    }

    pub fn dpi(&self) -> Dpi {
        self.context.dpi()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// # Panics
    /// If the id does not belong to this tree.
    pub fn item(&self, id: ItemId) -> &LayoutItem {
        &self.items[id.0]
    }

    pub fn handle(&self, id: ItemId) -> Handle {
        self.item(id).handle
    }

    /// Finds the item snapshotted from the given widget.
    pub fn find(&self, handle: Handle) -> Option<ItemId> {
        self.items
            .iter()
            .position(|item| item.handle == handle)
            .map(ItemId)
    }

    pub fn client_size(&self, id: ItemId) -> Size {
        self.item(id).geometry.client_size
    }

    pub fn children(&self, id: ItemId) -> &[ItemId] {
        match &self.item(id).kind {
            ItemKind::Container(container) => &container.children,
            ItemKind::Leaf(_) => &[],
        }
    }

    pub fn is_container(&self, id: ItemId) -> bool {
        match self.item(id).kind {
            ItemKind::Container(_) => true,
            ItemKind::Leaf(_) => false,
        }
    }

    fn leaf(&self, id: ItemId) -> Option<&Leaf> {
        match &self.item(id).kind {
            ItemKind::Leaf(leaf) => Some(leaf),
            ItemKind::Container(_) => None,
        }
    }

    pub(crate) fn container_view(&self, id: ItemId) -> Option<ContainerView<'_>> {
        let item = self.item(id);
        match &item.kind {
            ItemKind::Container(container) => Some(ContainerView {
                tree: self,
                id,
                item,
                container,
            }),
            ItemKind::Leaf(_) => None,
        }
    }

    pub fn is_spacer(&self, id: ItemId) -> bool {
        match self.leaf(id).map(|leaf| leaf.role) {
            Some(LeafRole::Spacer { .. }) => true,
            _ => false,
        }
    }

    /// Spacers whose greediness does not propagate to the enclosing container's flags.
    pub fn is_greedy_locally_only(&self, id: ItemId) -> bool {
        match self.leaf(id).map(|leaf| leaf.role) {
            Some(LeafRole::Spacer {
                greedy_locally_only,
            }) => greedy_locally_only,
            _ => false,
        }
    }

    pub fn is_splitter_handle(&self, id: ItemId) -> bool {
        match self.leaf(id).map(|leaf| leaf.role) {
            Some(LeafRole::SplitterHandle) => true,
            _ => false,
        }
    }

    /// Returns true if the item takes part in layout at all.
    pub fn should_layout(&self, id: ItemId) -> bool {
        let item = self.item(id);
        self.is_spacer(id) || item.visible || item.geometry.consuming_space_when_invisible
    }

    /// Filters out items that contribute nothing to sizing.
    pub fn items_to_layout(&self, items: &[ItemId]) -> Vec<ItemId> {
        items
            .iter()
            .copied()
            .filter(|&id| {
                if !self.should_layout(id) {
                    return false;
                }
                let ideal = self.preferred_size(id);
                !(ideal.x == 0 && ideal.y == 0 && self.layout_flags(id).is_empty())
            })
            .collect()
    }

    /// True if the item, or any non-spacer item below it, is visible.
    pub fn any_visible_item_in_hierarchy(&self, id: ItemId) -> bool {
        let item = self.item(id);
        if !item.visible {
            return false;
        }

        match &item.kind {
            ItemKind::Container(container) => container
                .children
                .iter()
                .any(|&child| self.any_visible_item_in_hierarchy(child)),
            ItemKind::Leaf(_) => !self.is_spacer(id),
        }
    }

    pub fn layout_flags(&self, id: ItemId) -> LayoutFlags {
        match self.container_view(id) {
            Some(view) => view.container.layout.layout_flags(&view),
            None => self.leaf(id).map(|leaf| leaf.flags).unwrap_or_default(),
        }
    }

    pub fn ideal_size(&self, id: ItemId) -> Size {
        match self.container_view(id) {
            Some(view) => view.container.layout.ideal_size(&view),
            None => self.item(id).geometry.ideal_size,
        }
    }

    /// The item's own minimum size, if it has one.
    pub fn min_size(&self, id: ItemId) -> Option<Size> {
        match &self.item(id).kind {
            ItemKind::Leaf(leaf) => leaf.min_size,
            ItemKind::Container(_) => Some(self.min_size_for_size(id, self.client_size(id))),
        }
    }

    /// Ideal size, or zero for height-for-width items whose ideal size is meaningless.
    pub fn preferred_size(&self, id: ItemId) -> Size {
        if self.has_height_for_width(id) {
            Vector2::zero()
        } else {
            self.ideal_size(id)
        }
    }

    pub fn has_height_for_width(&self, id: ItemId) -> bool {
        match &self.item(id).kind {
            ItemKind::Leaf(leaf) => leaf.height_for_width.is_some(),
            ItemKind::Container(container) => container
                .children
                .iter()
                .any(|&child| self.has_height_for_width(child)),
        }
    }

    /// Height the item needs when given the width. Items without height-for-width report their
    /// effective minimum height.
    pub fn height_for_width(&self, id: ItemId, width: i32) -> i32 {
        match &self.item(id).kind {
            ItemKind::Leaf(leaf) => match &leaf.height_for_width {
                Some(hfw) => hfw(width),
                None => self.min_size_effective(id).y,
            },
            ItemKind::Container(_) => {
                let client = self.client_size(id);
                self.min_size_for_size(id, Vector2::new(width, client.y)).y
            }
        }
    }

    /// Minimum size after reconciling the explicit minimum, the item's own minimum or ideal size,
    /// and the maximum size.
    pub fn min_size_effective(&self, id: ItemId) -> Size {
        match self.context.min_size_effective(id) {
            Some(size) => size,
            None => self.compute_min_size_effective(id),
        }
    }

    fn compute_min_size_effective(&self, id: ItemId) -> Size {
        let geometry = &self.item(id).geometry;
        let hint = self.min_size(id).unwrap_or_else(|| self.ideal_size(id));

        let mut size = max_size(geometry.min_size, hint);
        let max = geometry.max_size;
        if max.x > 0 && size.x > max.x {
            size.x = max.x;
        }
        if max.y > 0 && size.y > max.y {
            size.y = max.y;
        }
        size
    }

    /// Minimum size of a container for the given client size. Leaves report their effective
    /// minimum size.
    pub fn min_size_for_size(&self, id: ItemId, size: Size) -> Size {
        let view = match self.container_view(id) {
            Some(view) => view,
            None => return self.min_size_effective(id),
        };

        if let Some(min) = view.container.min_sizes.lock().get(&size) {
            return *min;
        }

        let min = view.container.layout.min_size_for_size(&view, size);
        if min.x > 0 && min.y > 0 {
            view.container.min_sizes.lock().insert(size, min);
        }
        min
    }

    /// Computes the bounds of a container's children. Leaves have nothing to lay out.
    pub fn perform_layout(&self, id: ItemId, client_size: Size) -> Vec<LayoutResultItem> {
        match self.container_view(id) {
            Some(view) => view.container.layout.perform_layout(&view, client_size),
            None => Vec::new(),
        }
    }

    /// Returns all items below and including `id`, children before their containers.
    pub fn post_order(&self, id: ItemId) -> Vec<ItemId> {
        let mut order = Vec::with_capacity(self.items.len());
        self.collect_post_order(id, &mut order);
        order
    }

    fn collect_post_order(&self, id: ItemId, order: &mut Vec<ItemId>) {
        for &child in self.children(id) {
            self.collect_post_order(child, order);
        }
        order.push(id);
    }

    /// Fills the context's effective minimum size cache, bottom-up.
    ///
    /// Must run to completion before the tree is shared between threads.
    pub fn populate_context(&mut self) {
        for id in self.post_order(self.root) {
            let size = self.compute_min_size_effective(id);
            self.context.insert(id, size);
        }
    }
}
