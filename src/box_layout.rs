//! Single-axis layouts.

use crate::error::ConfigError;
use crate::flags::{Align, Alignment2D, LayoutFlags, Orientation};
use crate::layout::{ensure_child, ChildItem, Layout, LayoutBase};
use crate::rect::{size, Margins, Rect, Size};
use crate::tree::{ContainerLayout, ContainerView, ItemId, LayoutResultItem, LayoutTree};
use crate::widget::{Container, Handle};
use std::collections::HashMap;

/// Upper bound for items that may grow without limit, in device pixels.
pub(crate) const UNBOUNDED: i32 = 32768;

/// Arranges items in a single row or column.
#[derive(Debug, Clone)]
pub struct BoxLayout {
    base: LayoutBase,
    orientation: Orientation,
    stretch_factors: HashMap<Handle, u32>,
}

impl BoxLayout {
    pub fn new(orientation: Orientation) -> BoxLayout {
        BoxLayout {
            base: LayoutBase::default(),
            orientation,
            stretch_factors: HashMap::new(),
        }
    }

    /// A box that arranges items from left to right.
    pub fn horizontal() -> BoxLayout {
        BoxLayout::new(Orientation::Horizontal)
    }

    /// A box that arranges items from top to bottom.
    pub fn vertical() -> BoxLayout {
        BoxLayout::new(Orientation::Vertical)
    }

    pub fn base(&self) -> &LayoutBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut LayoutBase {
        &mut self.base
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// The stretch factor of a widget; 1 unless set.
    pub fn stretch_factor(&self, widget: Handle) -> u32 {
        self.stretch_factors.get(&widget).copied().unwrap_or(1)
    }

    /// Sets how much of the excess space a child of `container` receives relative to its
    /// siblings.
    pub fn set_stretch_factor(
        &mut self,
        container: &dyn Container,
        widget: Handle,
        factor: u32,
    ) -> Result<(), ConfigError> {
        if factor == self.stretch_factor(widget) {
            return Ok(());
        }
        ensure_child(container, widget)?;
        if factor < 1 {
            return Err(ConfigError::InvalidStretchFactor);
        }
        self.stretch_factors.insert(widget, factor);
        Ok(())
    }
}

impl Layout for BoxLayout {
    fn margins(&self) -> Margins {
        self.base.margins()
    }

    fn spacing(&self) -> i32 {
        self.base.spacing()
    }

    fn alignment(&self) -> Alignment2D {
        self.base.alignment()
    }

    fn create_layout_item(&self, children: &[ChildItem]) -> Box<dyn ContainerLayout> {
        let stretch_factors = children
            .iter()
            .filter_map(|child| {
                self.stretch_factors
                    .get(&child.handle)
                    .map(|factor| (child.handle, *factor))
            })
            .collect();

        Box::new(BoxLayoutItem {
            orientation: self.orientation,
            stretch_factors,
        })
    }
}

#[derive(Debug)]
struct BoxLayoutItem {
    orientation: Orientation,
    stretch_factors: HashMap<Handle, u32>,
}

impl ContainerLayout for BoxLayoutItem {
    fn layout_flags(&self, container: &ContainerView<'_>) -> LayoutFlags {
        box_layout_flags(container.tree(), container.children(), self.orientation)
    }

    fn min_size_for_size(&self, container: &ContainerView<'_>, space: Size) -> Size {
        let tree = container.tree();
        let items = tree.items_to_layout(container.children());
        let margins = container.margins();
        let spacing = container.spacing();

        let bounds = Rect::new(0, 0, space.x, space.y);
        let results = box_layout_items(
            tree,
            &items,
            self.orientation,
            container.alignment(),
            bounds,
            margins,
            spacing,
            &self.stretch_factors,
        );

        let mut primary = 0;
        let mut max_secondary = 0;
        for result in &results {
            let min = container.min_size_effective_for_child(result.item);
            let height = if tree.has_height_for_width(result.item) {
                tree.height_for_width(result.item, result.bounds.width())
            } else {
                min.y
            };
            let item_size = size(min.x, height);

            primary += self.orientation.primary(item_size);
            max_secondary = max_secondary.max(self.orientation.secondary(item_size));
        }
        primary += spacing * (results.len() as i32 - 1).max(0);

        margins.size() + self.orientation.size(primary, max_secondary)
    }

    fn perform_layout(
        &self,
        container: &ContainerView<'_>,
        client_size: Size,
    ) -> Vec<LayoutResultItem> {
        let tree = container.tree();
        box_layout_items(
            tree,
            &tree.items_to_layout(container.children()),
            self.orientation,
            container.alignment(),
            Rect::new(0, 0, client_size.x, client_size.y),
            container.margins(),
            container.spacing(),
            &self.stretch_factors,
        )
    }
}

/// Aggregates the flags of a box's children.
///
/// A box can always grow along its axis. It can only shrink across its axis if every child can.
pub(crate) fn box_layout_flags(
    tree: &LayoutTree,
    children: &[ItemId],
    orientation: Orientation,
) -> LayoutFlags {
    if children.is_empty() {
        return LayoutFlags::SHRINKABLE_HORZ
            | LayoutFlags::SHRINKABLE_VERT
            | LayoutFlags::GROWABLE_HORZ
            | LayoutFlags::GROWABLE_VERT;
    }

    let mut flags = LayoutFlags::empty();
    let mut has_non_shrinkable_horz = false;
    let mut has_non_shrinkable_vert = false;

    for &child in children {
        if tree.is_splitter_handle(child)
            || !tree.should_layout(child)
            || tree.is_greedy_locally_only(child)
        {
            continue;
        }

        let child_flags = tree.layout_flags(child);
        flags |= child_flags;
        has_non_shrinkable_horz |= !child_flags.contains(LayoutFlags::SHRINKABLE_HORZ);
        has_non_shrinkable_vert |= !child_flags.contains(LayoutFlags::SHRINKABLE_VERT);
    }

    match orientation {
        Orientation::Horizontal => {
            flags |= LayoutFlags::GROWABLE_HORZ;
            if has_non_shrinkable_vert {
                flags.remove(LayoutFlags::SHRINKABLE_VERT);
            }
        }
        Orientation::Vertical => {
            flags |= LayoutFlags::GROWABLE_VERT;
            if has_non_shrinkable_horz {
                flags.remove(LayoutFlags::SHRINKABLE_HORZ);
            }
        }
    }

    flags
}

#[derive(Debug, Clone, Copy)]
struct ItemInfo {
    index: usize,
    pref: i32,
    min: i32,
    max: i32,
    stretch: i32,
    greedy: bool,
    spacer: bool,
}

/// Lays out `items` along one axis inside `bounds`. Margins and spacing are in device pixels.
///
/// Space is handed out in three rounds: greedy items first, then greedy spacers, then everything
/// else. Within a round, each item receives its minimum size plus a share of the remaining excess
/// proportional to its stretch factor, clamped to its maximum size.
#[allow(clippy::too_many_arguments)]
pub(crate) fn box_layout_items(
    tree: &LayoutTree,
    items: &[ItemId],
    orientation: Orientation,
    alignment: Alignment2D,
    bounds: Rect,
    margins: Margins,
    spacing: i32,
    stretch_factors: &HashMap<Handle, u32>,
) -> Vec<LayoutResultItem> {
    if items.is_empty() {
        return Vec::new();
    }

    let count = items.len() as i32;
    let mut greedy_non_spacer_count = 0;
    let mut greedy_spacer_count = 0;
    let mut stretch_totals = [0; 3];
    let mut min_sizes_remaining = 0;
    let mut shrinkable_total = 0;
    let mut shrinkable_amounts = vec![0; items.len()];
    let mut pref_secondary = vec![0; items.len()];
    let mut fills_secondary = vec![false; items.len()];
    let mut infos = Vec::with_capacity(items.len());

    let inner = bounds.inset(margins);
    let space_secondary = orientation.secondary(inner.size);

    for (index, &id) in items.iter().enumerate() {
        let stretch = stretch_factors
            .get(&tree.handle(id))
            .map_or(1, |&factor| factor.max(1) as i32);
        let flags = tree.layout_flags(id);
        let max = tree.item(id).geometry().max_size;
        let pref = tree.preferred_size(id);
        let has_hfw = tree.has_height_for_width(id);

        let min = match orientation {
            Orientation::Vertical if has_hfw => tree.height_for_width(id, inner.width()),
            _ => orientation.primary(tree.min_size_effective(id)),
        };

        let explicit_max = orientation.primary(max);
        let pref_primary = orientation.primary(pref);
        let growable = flags.growable(orientation);
        let max = if explicit_max > 0 {
            explicit_max
        } else if orientation == Orientation::Vertical && has_hfw && !growable {
            min
        } else if pref_primary > 0 && !growable {
            pref_primary
        } else {
            UNBOUNDED
        };

        let cross = orientation.cross();
        fills_secondary[index] = flags.growable(cross) || flags.shrinkable(cross);
        pref_secondary[index] = orientation.secondary(pref);

        let greedy = flags.greedy(orientation);
        let only_shrinkable = flags.shrinkable(orientation) && !growable && !greedy;
        if only_shrinkable && pref_primary > min {
            shrinkable_amounts[index] = pref_primary - min;
            shrinkable_total += pref_primary - min;
            min_sizes_remaining += pref_primary;
        } else {
            min_sizes_remaining += min;
        }

        let spacer = tree.is_spacer(id);
        let bucket = match (greedy, spacer) {
            (true, false) => {
                greedy_non_spacer_count += 1;
                0
            }
            (true, true) => {
                greedy_spacer_count += 1;
                1
            }
            _ => 2,
        };
        stretch_totals[bucket] += stretch;

        infos.push(ItemInfo {
            index,
            pref: pref_primary,
            min,
            max,
            stretch,
            greedy,
            spacer,
        });
    }

    infos.sort_by(|a, b| {
        b.greedy
            .cmp(&a.greedy)
            .then(a.spacer.cmp(&b.spacer))
            .then(b.min.cmp(&a.min))
            .then((a.max / a.stretch).cmp(&(b.max / b.stretch)))
    });

    let start = size(inner.x(), inner.y());
    let start_primary = orientation.primary(start);
    let start_secondary = orientation.secondary(start);
    let mut space = orientation.primary(inner.size);

    let mut spacing_remaining = spacing * (count - 1);
    let excess = f64::from(space - min_sizes_remaining - spacing_remaining);

    let mut sizes = vec![0; items.len()];
    let counts = [
        greedy_non_spacer_count,
        greedy_spacer_count,
        items.len() - greedy_non_spacer_count - greedy_spacer_count,
    ];
    let mut offset = 0;

    for (bucket, &bucket_count) in counts.iter().enumerate() {
        let mut stretch_remaining = stretch_totals[bucket];

        for info in &infos[offset..offset + bucket_count] {
            let k = info.index;
            let shrinkable = shrinkable_amounts[k];

            let mut corrected = false;
            let mut size = if shrinkable > 0 {
                let mut size = info.pref;
                if excess < 0. {
                    let share = (-excess / f64::from(shrinkable_total) * f64::from(shrinkable))
                        .round() as i32;
                    size -= shrinkable.min(share);
                    corrected = true;
                }
                size
            } else {
                info.min
            };

            if !corrected && info.min < info.max {
                let excess_space = f64::from(space - min_sizes_remaining - spacing_remaining);
                size += (excess_space * f64::from(info.stretch) / f64::from(stretch_remaining))
                    .round() as i32;
                if size < info.min {
                    size = info.min;
                } else if size > info.max {
                    size = info.max;
                }
            }

            sizes[k] = size;

            min_sizes_remaining -= if shrinkable > 0 { info.pref } else { info.min };
            stretch_remaining -= info.stretch;
            space -= size + spacing;
            spacing_remaining -= spacing;
        }

        offset += bucket_count;
    }

    let excess_total = space - min_sizes_remaining - spacing_remaining;
    let excess_share = excess_total / count;
    let half_excess_share = excess_total / (count * 2);

    let mut p1 = start_primary;
    let mut results = Vec::with_capacity(items.len());

    for (index, &id) in items.iter().enumerate() {
        let s1 = sizes[index];
        let s2 = if orientation == Orientation::Horizontal && tree.has_height_for_width(id) {
            tree.height_for_width(id, s1)
        } else if fills_secondary[index] {
            space_secondary
        } else {
            pref_secondary[index]
        };

        let align = tree.item(id).geometry().alignment.or(alignment);
        let align_primary = align.along(orientation);

        p1 += match align_primary {
            Align::Near => 0,
            Align::Far => excess_share,
            Align::Center => half_excess_share,
        };

        let p2 = match align.along(orientation.cross()) {
            Align::Near => start_secondary,
            Align::Far => start_secondary + space_secondary - s2,
            Align::Center => start_secondary + (space_secondary - s2) / 2,
        };

        let bounds = match orientation {
            Orientation::Horizontal => Rect::new(p1, p2, s1, s2),
            Orientation::Vertical => Rect::new(p2, p1, s2, s1),
        };

        p1 += match align_primary {
            Align::Near => excess_share,
            Align::Far => 0,
            Align::Center => half_excess_share,
        };
        p1 += s1 + spacing;

        results.push(LayoutResultItem {
            item: id,
            handle: tree.handle(id),
            bounds,
        });
    }

    results
}
