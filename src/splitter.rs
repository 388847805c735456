//! Splitter layouts: panes separated by draggable handles.

use crate::box_layout::{box_layout_flags, UNBOUNDED};
use crate::dpi::Dpi;
use crate::error::ConfigError;
use crate::flags::{Alignment2D, LayoutFlags, Orientation};
use crate::layout::{build_layout_tree, ensure_child, ChildItem, Layout};
use crate::rect::{size, Margins, Rect, Size};
use crate::tree::{ContainerLayout, ContainerView, ItemId, LayoutResultItem, LayoutTree};
use crate::widget::{Container, Handle, LeafItem, LeafRole, Widget};
use std::collections::HashMap;

/// Per-pane state that survives between layout passes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PaneState {
    /// Share of the space available to panes, set by dragging a handle.
    fraction: Option<f64>,
    stretch: u32,
    fixed: bool,
    /// Size a fixed pane was dragged to, in device pixels.
    explicit_size: Option<i32>,
}

impl Default for PaneState {
    fn default() -> Self {
        PaneState {
            fraction: None,
            stretch: 1,
            fixed: false,
            explicit_size: None,
        }
    }
}

/// Lays out panes in a row or column, separated by handles.
///
/// Children alternate between panes (even indices) and [`SplitterHandle`]s (odd indices).
#[derive(Debug, Clone)]
pub struct SplitterLayout {
    orientation: Orientation,
    margins: Margins,
    handle_width: i32,
    panes: HashMap<Handle, PaneState>,
}

impl SplitterLayout {
    pub const DEFAULT_HANDLE_WIDTH: i32 = 4;

    pub fn new(orientation: Orientation) -> SplitterLayout {
        SplitterLayout {
            orientation,
            margins: Margins::default(),
            handle_width: SplitterLayout::DEFAULT_HANDLE_WIDTH,
            panes: HashMap::new(),
        }
    }

    pub fn horizontal() -> SplitterLayout {
        SplitterLayout::new(Orientation::Horizontal)
    }

    pub fn vertical() -> SplitterLayout {
        SplitterLayout::new(Orientation::Vertical)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if orientation != self.orientation {
            self.orientation = orientation;
            for pane in self.panes.values_mut() {
                pane.fraction = None;
                pane.explicit_size = None;
            }
        }
    }

    pub fn set_margins(&mut self, margins: Margins) -> Result<(), ConfigError> {
        if margins.is_negative() {
            return Err(ConfigError::NegativeMargins);
        }
        self.margins = margins;
        Ok(())
    }

    /// Panes are always separated by their handles.
    pub fn set_spacing(&mut self, _spacing: i32) -> Result<(), ConfigError> {
        Err(ConfigError::Unsupported("splitter spacing"))
    }

    /// Width of the handles in 1/96" units.
    pub fn handle_width(&self) -> i32 {
        self.handle_width
    }

    pub fn set_handle_width(&mut self, width: i32) -> Result<(), ConfigError> {
        if width < 1 {
            return Err(ConfigError::InvalidHandleWidth);
        }
        self.handle_width = width;
        Ok(())
    }

    fn pane(&self, widget: Handle) -> PaneState {
        self.panes.get(&widget).copied().unwrap_or_default()
    }

    pub fn stretch_factor(&self, widget: Handle) -> u32 {
        self.pane(widget).stretch
    }

    /// Sets the share of space a pane gets while no handle has been dragged.
    pub fn set_stretch_factor(
        &mut self,
        container: &dyn Container,
        widget: Handle,
        factor: u32,
    ) -> Result<(), ConfigError> {
        ensure_child(container, widget)?;
        if factor < 1 {
            return Err(ConfigError::InvalidStretchFactor);
        }
        self.panes.entry(widget).or_default().stretch = factor;
        Ok(())
    }

    pub fn fixed(&self, widget: Handle) -> bool {
        self.pane(widget).fixed
    }

    /// A fixed pane keeps its size when the splitter is resized, as long as some other pane is
    /// not fixed.
    pub fn set_fixed(
        &mut self,
        container: &dyn Container,
        widget: Handle,
        fixed: bool,
    ) -> Result<(), ConfigError> {
        ensure_child(container, widget)?;
        let pane = self.panes.entry(widget).or_default();
        pane.fixed = fixed;
        pane.explicit_size = None;
        Ok(())
    }

    /// The share of space a pane was given by the last drag, if any.
    pub fn fraction(&self, widget: Handle) -> Option<f64> {
        self.pane(widget).fraction
    }

    /// Moves the handle at `handle_index` by `delta` device pixels.
    ///
    /// The panes on either side of the handle are resized, but never below their minimum size.
    /// Afterwards every visible pane remembers its share of the available space.
    pub fn drag_handle(
        &mut self,
        container: &dyn Container,
        handle_index: usize,
        delta: i32,
        dpi: Dpi,
    ) -> Result<(), ConfigError> {
        let children = container.children();
        let position = handle_index * 2 + 1;
        if position >= children.len() {
            return Err(ConfigError::NoSuchHandle(handle_index));
        }

        let tree = build_layout_tree(container, dpi);
        let pane_ids = tree.children(tree.root());
        let visible = |index: usize| tree.any_visible_item_in_hierarchy(pane_ids[index]);

        let before = (0..position).rev().step_by(2).find(|&i| visible(i));
        let after = (position + 1..children.len()).step_by(2).find(|&i| visible(i));
        let (before, after) = match (before, after) {
            (Some(before), Some(after)) => (before, after),
            _ => return Ok(()),
        };

        let current = |index: usize| self.orientation.primary(children[index].bounds().size);
        let min = |index: usize| self.orientation.primary(tree.min_size_effective(pane_ids[index]));

        let total = current(before) + current(after);
        let mut new_before = current(before) + delta;
        new_before = new_before.min(total - min(after)).max(min(before));
        let new_after = total - new_before;

        let mut sizes = Vec::new();
        for index in (0..children.len()).step_by(2) {
            if !visible(index) {
                continue;
            }
            let size = if index == before {
                new_before
            } else if index == after {
                new_after
            } else {
                current(index)
            };
            sizes.push((children[index].handle(), size));
        }

        let sum: i32 = sizes.iter().map(|(_, size)| size).sum();
        for (widget, size) in sizes {
            let pane = self.panes.entry(widget).or_default();
            if sum > 0 {
                pane.fraction = Some(f64::from(size) / f64::from(sum));
            }
            if pane.fixed {
                pane.explicit_size = Some(size);
            }
        }

        log::trace!(
            "moved splitter handle {} by {}: {} / {}",
            handle_index,
            delta,
            new_before,
            new_after
        );
        Ok(())
    }
}

impl Layout for SplitterLayout {
    fn margins(&self) -> Margins {
        self.margins
    }

    fn spacing(&self) -> i32 {
        0
    }

    fn alignment(&self) -> Alignment2D {
        Alignment2D::Default
    }

    fn create_layout_item(&self, children: &[ChildItem]) -> Box<dyn ContainerLayout> {
        Box::new(SplitterLayoutItem {
            orientation: self.orientation,
            handle_width: self.handle_width,
            panes: children
                .iter()
                .map(|child| self.panes.get(&child.handle).copied())
                .collect(),
        })
    }
}

/// The separator between two splitter panes.
#[derive(Debug, Clone)]
pub struct SplitterHandle {
    handle: Handle,
    pub bounds: Rect,
}

impl SplitterHandle {
    pub fn new() -> SplitterHandle {
        SplitterHandle {
            handle: Handle::new(),
            bounds: Rect::zero(),
        }
    }
}

impl Default for SplitterHandle {
    fn default() -> Self {
        SplitterHandle::new()
    }
}

impl Widget for SplitterHandle {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn create_layout_item(&self, _dpi: Dpi) -> LeafItem {
        LeafItem {
            role: LeafRole::SplitterHandle,
            ..LeafItem::default()
        }
    }
}

#[derive(Debug)]
struct SplitterLayoutItem {
    orientation: Orientation,
    /// In 1/96" units.
    handle_width: i32,
    /// Indexed like the container's children.
    panes: Vec<Option<PaneState>>,
}

#[derive(Debug, Clone, Copy)]
struct PaneSizing {
    index: usize,
    min: i32,
    max: i32,
    weight: f64,
    size: Option<i32>,
}

impl SplitterLayoutItem {
    fn pane(&self, index: usize) -> PaneState {
        self.panes.get(index).copied().flatten().unwrap_or_default()
    }

    /// Returns which children take part in layout.
    ///
    /// A handle is shown if the pane after it and some pane before it are visible, so hidden
    /// panes never leave two handles next to each other.
    fn visibility(&self, tree: &LayoutTree, children: &[ItemId]) -> Vec<bool> {
        let panes: Vec<bool> = children
            .iter()
            .enumerate()
            .map(|(i, &id)| i % 2 == 0 && tree.any_visible_item_in_hierarchy(id))
            .collect();

        (0..children.len())
            .map(|i| {
                if i % 2 == 0 {
                    panes[i]
                } else {
                    panes.get(i + 1).copied().unwrap_or(false) && panes[..i].iter().any(|v| *v)
                }
            })
            .collect()
    }

    fn any_non_fixed(&self, visible: &[bool]) -> bool {
        visible
            .iter()
            .enumerate()
            .any(|(i, &visible)| visible && i % 2 == 0 && !self.pane(i).fixed)
    }

    /// Distributes `space` between the panes, respecting their minimum and maximum sizes.
    ///
    /// Panes whose share would violate a bound are pinned to it and the rest is redistributed.
    /// Shares are rounded cumulatively so the sizes add up to the available space.
    fn distribute(panes: &mut [PaneSizing], space: i32) {
        loop {
            let pinned: i32 = panes.iter().filter_map(|p| p.size).sum();
            let remaining = f64::from(space - pinned);
            let total_weight: f64 = panes.iter().filter(|p| p.size.is_none()).map(|p| p.weight).sum();
            if total_weight <= 0. {
                break;
            }

            let share = |p: &PaneSizing| remaining * p.weight / total_weight;

            let mut changed = false;
            for pane in panes.iter_mut().filter(|p| p.size.is_none()) {
                if share(pane) < f64::from(pane.min) {
                    pane.size = Some(pane.min);
                    changed = true;
                }
            }
            if !changed {
                for pane in panes.iter_mut().filter(|p| p.size.is_none()) {
                    if share(pane) > f64::from(pane.max) {
                        pane.size = Some(pane.max);
                        changed = true;
                    }
                }
            }
            if changed {
                continue;
            }

            let mut accumulated = 0.;
            let mut assigned = 0;
            for pane in panes.iter_mut().filter(|p| p.size.is_none()) {
                accumulated += share(pane);
                let end = accumulated.round() as i32;
                pane.size = Some(end - assigned);
                assigned = end;
            }
            break;
        }
    }
}

impl ContainerLayout for SplitterLayoutItem {
    fn layout_flags(&self, container: &ContainerView<'_>) -> LayoutFlags {
        box_layout_flags(container.tree(), container.children(), self.orientation)
    }

    fn min_size_for_size(&self, container: &ContainerView<'_>, _space: Size) -> Size {
        let tree = container.tree();
        let children = container.children();
        let margins = container.margins().size();
        let handle_width = container.dpi().int_from_96(self.handle_width);
        let visible = self.visibility(tree, children);
        let any_non_fixed = self.any_non_fixed(&visible);

        let mut primary = self.orientation.primary(margins);
        let mut secondary = self.orientation.secondary(margins);

        for (i, &id) in children.iter().enumerate() {
            if !visible[i] {
                continue;
            }
            if i % 2 == 1 {
                primary += handle_width;
                continue;
            }

            let pane = self.pane(i);
            let min = tree.min_size_effective(id);
            primary += if pane.fixed && any_non_fixed {
                pane.explicit_size
                    .unwrap_or_else(|| self.orientation.primary(tree.item(id).geometry().size))
            } else {
                self.orientation.primary(min)
            };
            secondary = secondary
                .max(self.orientation.secondary(margins) + self.orientation.secondary(min));
        }

        self.orientation.size(primary, secondary)
    }

    fn perform_layout(
        &self,
        container: &ContainerView<'_>,
        client_size: Size,
    ) -> Vec<LayoutResultItem> {
        let tree = container.tree();
        let children = container.children();
        let orientation = self.orientation;
        let handle_width = container.dpi().int_from_96(self.handle_width);
        let inner = Rect::new(0, 0, client_size.x, client_size.y).inset(container.margins());

        let visible = self.visibility(tree, children);
        let any_non_fixed = self.any_non_fixed(&visible);
        let handle_count = visible.iter().skip(1).step_by(2).filter(|v| **v).count() as i32;
        let space = orientation.primary(inner.size) - handle_count * handle_width;

        let mut panes = Vec::new();
        for (i, &id) in children.iter().enumerate().step_by(2) {
            if !visible[i] {
                continue;
            }

            let state = self.pane(i);
            let flags = tree.layout_flags(id);
            let pref = orientation.primary(tree.preferred_size(id));
            let mut min = orientation.primary(tree.min_size_effective(id));
            let mut max = match orientation.primary(tree.item(id).geometry().max_size) {
                0 => UNBOUNDED,
                max => max,
            };
            if !flags.shrinkable(orientation) && pref > 0 {
                min = min.max(pref);
            }
            if !flags.growable(orientation) && pref > 0 {
                max = max.min(pref);
            }
            max = max.max(min);

            let size = if state.fixed && any_non_fixed {
                let current = state
                    .explicit_size
                    .unwrap_or_else(|| orientation.primary(tree.item(id).geometry().size));
                Some(current.max(min).min(max))
            } else {
                None
            };

            panes.push((
                state,
                PaneSizing {
                    index: i,
                    min,
                    max,
                    weight: 0.,
                    size,
                },
            ));
        }

        let use_fractions = panes
            .iter()
            .filter(|(_, sizing)| sizing.size.is_none())
            .all(|(state, _)| state.fraction.is_some());
        let mut sizings: Vec<_> = panes
            .into_iter()
            .map(|(state, mut sizing)| {
                sizing.weight = match state.fraction {
                    Some(fraction) if use_fractions => fraction,
                    _ => f64::from(state.stretch.max(1)),
                };
                sizing
            })
            .collect();
        SplitterLayoutItem::distribute(&mut sizings, space);

        let mut sizes = vec![0; children.len()];
        for sizing in &sizings {
            sizes[sizing.index] = sizing.size.unwrap_or(sizing.min);
        }

        let start = size(inner.x(), inner.y());
        let mut p1 = orientation.primary(start);
        let p2 = orientation.secondary(start);
        let space2 = orientation.secondary(inner.size);

        let mut results = Vec::new();
        for (i, &id) in children.iter().enumerate() {
            if !visible[i] {
                continue;
            }
            let s1 = if i % 2 == 1 { handle_width } else { sizes[i] };
            let bounds = match orientation {
                Orientation::Horizontal => Rect::new(p1, p2, s1, space2),
                Orientation::Vertical => Rect::new(p2, p1, space2, s1),
            };
            results.push(LayoutResultItem {
                item: id,
                handle: tree.handle(id),
                bounds,
            });
            p1 += s1;
        }

        results
    }
}
