//! Flow layouts: items fill a line from left to right and wrap onto the next one.

use crate::box_layout::box_layout_items;
use crate::error::ConfigError;
use crate::flags::{Alignment2D, LayoutFlags, Orientation};
use crate::layout::{ensure_child, ChildItem, Layout, LayoutBase};
use crate::rect::{size, Margins, Rect, Size};
use crate::tree::{ContainerLayout, ContainerView, ItemId, LayoutResultItem};
use crate::widget::{Container, Handle};
use cgmath::{Vector2, Zero};
use std::collections::HashMap;

/// Arranges items in lines, starting a new line when the current one is full.
#[derive(Debug, Clone, Default)]
pub struct FlowLayout {
    base: LayoutBase,
    stretch_factors: HashMap<Handle, u32>,
}

impl FlowLayout {
    pub fn new() -> FlowLayout {
        FlowLayout::default()
    }

    pub fn base(&self) -> &LayoutBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut LayoutBase {
        &mut self.base
    }

    pub fn stretch_factor(&self, widget: Handle) -> u32 {
        self.stretch_factors.get(&widget).copied().unwrap_or(1)
    }

    /// Sets how much of a line's excess space a child of `container` receives.
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

impl Layout for FlowLayout {
    fn margins(&self) -> Margins {
        self.base.margins()
    }

    fn spacing(&self) -> i32 {
        self.base.spacing()
    }

    fn alignment(&self) -> Alignment2D {
        self.base.alignment()
    }

    fn create_layout_item(&self, _children: &[ChildItem]) -> Box<dyn ContainerLayout> {
        Box::new(FlowLayoutItem {
            stretch_factors: self.stretch_factors.clone(),
        })
    }
}

#[derive(Debug, Default)]
struct Section {
    items: Vec<ItemId>,
    space_left: i32,
    secondary_min: i32,
}

#[derive(Debug)]
struct FlowLayoutItem {
    stretch_factors: HashMap<Handle, u32>,
}

impl FlowLayoutItem {
    /// Packs the children into lines for the given width.
    ///
    /// An item starts a new line if it does not fit next to the items already on the current
    /// one. An item wider than a whole line gets a line of its own.
    fn sections(&self, container: &ContainerView<'_>, width: i32) -> Vec<Section> {
        let tree = container.tree();
        let margins = container.margins();
        let spacing = container.spacing();
        let line_width = width - margins.horizontal();

        let mut sections = Vec::new();
        let mut section = Section {
            space_left: line_width,
            ..Section::default()
        };

        for &child in container.children() {
            if !tree.should_layout(child) {
                continue;
            }
            let min = tree.min_size_effective(child);

            let add_item = |section: &mut Section| {
                section.items.push(child);
                if section.items.len() > 1 {
                    section.space_left -= spacing;
                }
                section.space_left -= min.x;
                section.secondary_min = section.secondary_min.max(min.y);
            };
            let new_section = Section {
                space_left: line_width,
                ..Section::default()
            };

            if section.items.is_empty() && section.space_left < min.x {
                add_item(&mut section);
                sections.push(std::mem::replace(&mut section, new_section));
            } else if !section.items.is_empty() && section.space_left < spacing + min.x {
                sections.push(std::mem::replace(&mut section, new_section));
                add_item(&mut section);
            } else {
                add_item(&mut section);
            }
        }

        if !section.items.is_empty() {
            sections.push(section);
        }

        if let Some(first) = sections.first_mut() {
            first.secondary_min += margins.v_near;
        }
        if let Some(last) = sections.last_mut() {
            last.secondary_min += margins.v_far;
        }

        sections
    }

    /// Lays out one line and returns the results and the height of the line's content.
    fn layout_section(
        &self,
        container: &ContainerView<'_>,
        section: &Section,
        bounds: Rect,
        margins: Margins,
    ) -> (Vec<LayoutResultItem>, i32) {
        let tree = container.tree();
        let results = box_layout_items(
            tree,
            &section.items,
            Orientation::Horizontal,
            container.alignment(),
            bounds,
            margins,
            container.spacing(),
            &self.stretch_factors,
        );

        let height = results
            .iter()
            .map(|result| {
                if tree.has_height_for_width(result.item) {
                    tree.height_for_width(result.item, result.bounds.width())
                } else {
                    tree.min_size_effective(result.item).y
                }
            })
            .max()
            .unwrap_or(0);

        (results, height)
    }
}

/// Margins of the line at `index`; only the first and last lines keep the vertical margins.
fn section_margins(margins: Margins, index: usize, count: usize) -> Margins {
    let mut margins = margins;
    if index > 0 {
        margins.v_near = 0;
    }
    if index + 1 < count {
        margins.v_far = 0;
    }
    margins
}

impl ContainerLayout for FlowLayoutItem {
    fn layout_flags(&self, _container: &ContainerView<'_>) -> LayoutFlags {
        LayoutFlags::all()
    }

    fn ideal_size(&self, _container: &ContainerView<'_>) -> Size {
        Vector2::zero()
    }

    fn min_size_for_size(&self, container: &ContainerView<'_>, space: Size) -> Size {
        let tree = container.tree();
        let margins = container.margins();
        let spacing = container.spacing();
        let sections = self.sections(container, space.x);

        let mut bounds = Rect::new(0, 0, space.x, 0);
        let mut max_primary = 0;
        let mut height = 0;

        for (i, section) in sections.iter().enumerate() {
            let section_width: i32 = section
                .items
                .iter()
                .map(|&item| tree.min_size_effective(item).x)
                .sum::<i32>()
                + spacing * (section.items.len() as i32 - 1);
            max_primary = max_primary.max(section_width);

            bounds.size.y = section.secondary_min;
            let margins = section_margins(margins, i, sections.len());
            let (_, section_height) = self.layout_section(container, section, bounds, margins);

            height += section_height;
            bounds.origin.y += section_height + spacing;
        }

        let gaps = spacing * (sections.len() as i32 - 1).max(0);
        margins.size() + size(max_primary, height + gaps)
    }

    fn perform_layout(
        &self,
        container: &ContainerView<'_>,
        client_size: Size,
    ) -> Vec<LayoutResultItem> {
        let margins = container.margins();
        let spacing = container.spacing();
        let sections = self.sections(container, client_size.x);

        let mut bounds = Rect::new(0, 0, client_size.x, client_size.y);
        let mut results = Vec::new();

        for (i, section) in sections.iter().enumerate() {
            let margins = section_margins(margins, i, sections.len());

            bounds.size.y = section.secondary_min;
            let (_, content_height) = self.layout_section(container, section, bounds, margins);

            bounds.size.y = content_height + margins.vertical();
            let (section_results, _) = self.layout_section(container, section, bounds, margins);
            results.extend(section_results);

            bounds.origin.y += bounds.size.y + spacing;
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dpi::Dpi;
    use crate::layout::build_layout_tree;
    use crate::testing::{TestContainer, TestWidget};
    use crate::widget::Widget;

    fn flow_container(count: usize, item: Size, margins: Margins) -> TestContainer {
        let children: Vec<Box<dyn Widget>> = (0..count)
            .map(|_| Box::new(TestWidget::fixed(item)) as Box<dyn Widget>)
            .collect();
        let mut container = TestContainer::new(children);

        let mut layout = FlowLayout::new();
        layout.base_mut().set_margins(margins).unwrap();
        layout.base_mut().set_spacing(10).unwrap();
        container.layout = Some(Box::new(layout));
        container
    }

    fn line_lengths(container: &TestContainer, width: i32) -> Vec<usize> {
        let tree = build_layout_tree(container, Dpi::STANDARD);
        let view = tree.container_view(tree.root()).unwrap();
        let item = FlowLayoutItem {
            stretch_factors: HashMap::new(),
        };
        item.sections(&view, width)
            .iter()
            .map(|section| section.items.len())
            .collect()
    }

    #[test]
    fn packing_boundary_is_exclusive() {
        // 60 + 10 + 60 + 10 + 60 == 200: the third item still fits
        let container = flow_container(5, size(60, 20), Margins::default());
        assert_eq!(line_lengths(&container, 200), vec![3, 2]);

        // with margins the third item no longer fits
        let container = flow_container(5, size(60, 20), Margins::new(1, 0, 0, 0));
        assert_eq!(line_lengths(&container, 200), vec![2, 2, 1]);
    }

    #[test]
    fn oversized_item_gets_own_line() {
        let container = flow_container(2, size(250, 20), Margins::default());
        assert_eq!(line_lengths(&container, 200), vec![1, 1]);
    }

    #[test]
    fn line_height_follows_height_for_width() {
        let wrapping = TestWidget::with_flags(
            size(50, 10),
            LayoutFlags::SHRINKABLE_HORZ | LayoutFlags::GROWABLE_HORZ,
        )
        .with_height_for_width(|width| 3000 / width.max(1));
        let mut container = TestContainer::new(vec![
            Box::new(TestWidget::fixed(size(60, 20))),
            Box::new(wrapping),
        ]);
        let mut layout = FlowLayout::new();
        layout.base_mut().set_margins(Margins::default()).unwrap();
        layout.base_mut().set_spacing(10).unwrap();
        container.layout = Some(Box::new(layout));

        let tree = build_layout_tree(&container, Dpi::STANDARD);
        // the wrapping item gets the rest of the line: 200 - 60 - 10
        assert_eq!(tree.min_size_for_size(tree.root(), size(200, 100)), size(120, 3000 / 130));

        let results = tree.perform_layout(tree.root(), size(200, 100));
        assert_eq!(results[0].bounds, Rect::new(0, 1, 60, 20));
        assert_eq!(results[1].bounds, Rect::new(70, 0, 130, 23));
    }

    #[test]
    fn lines_stack_vertically() {
        let container = flow_container(5, size(60, 20), Margins::default());
        let tree = build_layout_tree(&container, Dpi::STANDARD);
        let results = tree.perform_layout(tree.root(), size(200, 100));

        let origins: Vec<_> = results.iter().map(|r| (r.bounds.x(), r.bounds.y())).collect();
        // the short line spreads its residual space around each item
        assert_eq!(origins, vec![(0, 0), (70, 0), (140, 0), (17, 30), (121, 30)]);
        assert_eq!(
            tree.min_size_for_size(tree.root(), size(200, 100)),
            size(200, 20 + 10 + 20)
        );
    }
}
