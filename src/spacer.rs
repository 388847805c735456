//! Spacers: empty widgets that take up room in a layout.

use crate::dpi::Dpi;
use crate::flags::LayoutFlags;
use crate::rect::{size, Rect, Size};
use crate::widget::{Handle, LeafItem, LeafRole, Widget};
use cgmath::{Vector2, Zero};

/// An invisible widget that pushes its siblings apart.
#[derive(Debug, Clone)]
pub struct Spacer {
    handle: Handle,
    flags: LayoutFlags,
    /// In 1/96" units.
    size_hint: Size,
    greedy_locally_only: bool,
    pub bounds: Rect,
}

impl Spacer {
    pub fn new(flags: LayoutFlags, size_hint: Size, greedy_locally_only: bool) -> Spacer {
        Spacer {
            handle: Handle::new(),
            flags,
            size_hint,
            greedy_locally_only,
            bounds: Rect::zero(),
        }
    }

    /// Takes up as much horizontal space as it can get.
    pub fn horizontal() -> Spacer {
        Spacer::new(
            LayoutFlags::SHRINKABLE_HORZ
                | LayoutFlags::SHRINKABLE_VERT
                | LayoutFlags::GROWABLE_HORZ
                | LayoutFlags::GREEDY_HORZ,
            Vector2::zero(),
            false,
        )
    }

    /// Takes up as much vertical space as it can get.
    pub fn vertical() -> Spacer {
        Spacer::new(
            LayoutFlags::SHRINKABLE_HORZ
                | LayoutFlags::SHRINKABLE_VERT
                | LayoutFlags::GROWABLE_VERT
                | LayoutFlags::GREEDY_VERT,
            Vector2::zero(),
            false,
        )
    }

    /// A gap of fixed width, in 1/96" units.
    pub fn horizontal_fixed(width: i32) -> Spacer {
        Spacer::new(LayoutFlags::empty(), size(width, 0), false)
    }

    /// A gap of fixed height, in 1/96" units.
    pub fn vertical_fixed(height: i32) -> Spacer {
        Spacer::new(LayoutFlags::empty(), size(0, height), false)
    }

    /// Keeps this spacer's greediness from making the enclosing container greedy.
    pub fn greedy_locally_only(mut self) -> Spacer {
        self.greedy_locally_only = true;
        self
    }
}

impl Widget for Spacer {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn create_layout_item(&self, dpi: Dpi) -> LeafItem {
        let hint = dpi.size_from_96(self.size_hint);
        LeafItem {
            flags: self.flags,
            ideal_size: hint,
            min_size: Some(hint),
            height_for_width: None,
            role: LeafRole::Spacer {
                greedy_locally_only: self.greedy_locally_only,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::box_layout::BoxLayout;
    use crate::layout::build_layout_tree;
    use crate::rect::Margins;
    use crate::testing::{TestContainer, TestWidget};

    fn hbox(children: Vec<Box<dyn Widget>>) -> TestContainer {
        let mut container = TestContainer::new(children);
        let mut layout = BoxLayout::horizontal();
        layout.base_mut().set_margins(Margins::default()).unwrap();
        layout.base_mut().set_spacing(0).unwrap();
        container.layout = Some(Box::new(layout));
        container
    }

    #[test]
    fn greedy_spacer_pushes_siblings() {
        let item = TestWidget::with_flags(size(50, 20), LayoutFlags::GROWABLE_HORZ);
        let container = hbox(vec![Box::new(Spacer::horizontal()), Box::new(item)]);

        let tree = build_layout_tree(&container, Dpi::STANDARD);
        let results = tree.perform_layout(tree.root(), size(300, 20));
        assert_eq!(results[0].bounds.width(), 250);
        assert_eq!(results[1].bounds, Rect::new(250, 0, 50, 20));
        assert!(tree.is_spacer(results[0].item()));
        assert!(!tree.any_visible_item_in_hierarchy(results[0].item()));
    }

    #[test]
    fn greedy_locally_only_spacer() {
        let item = || TestWidget::fixed(size(50, 20));

        let container = hbox(vec![Box::new(Spacer::horizontal()), Box::new(item())]);
        let tree = build_layout_tree(&container, Dpi::STANDARD);
        assert!(tree.layout_flags(tree.root()).contains(LayoutFlags::GREEDY_HORZ));

        let spacer = Spacer::horizontal().greedy_locally_only();
        let container = hbox(vec![Box::new(spacer), Box::new(item())]);
        let tree = build_layout_tree(&container, Dpi::STANDARD);
        assert!(!tree.layout_flags(tree.root()).contains(LayoutFlags::GREEDY_HORZ));
    }

    #[test]
    fn fixed_spacer_scales_with_dpi() {
        let container = hbox(vec![
            Box::new(TestWidget::fixed(size(30, 20))),
            Box::new(Spacer::horizontal_fixed(20)),
            Box::new(TestWidget::fixed(size(30, 20))),
        ]);
        let tree = build_layout_tree(&container, Dpi(192));
        let min = tree.min_size_for_size(tree.root(), size(1, 1));
        assert_eq!(min.x, 30 + 40 + 30);
    }
}
