//! Mock widgets and backends.

use crate::backend::{Backend, WindowState};
use crate::dpi::Dpi;
use crate::flags::{Alignment2D, LayoutFlags};
use crate::layout::Layout;
use crate::rect::{Rect, Size};
use crate::widget::{Container, Handle, HeightForWidth, LeafItem, Widget};
use cgmath::{Point2, Vector2, Zero};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug)]
pub struct TestWidget {
    pub handle: Handle,
    pub leaf: LeafItem,
    pub visible: bool,
    pub bounds: Rect,
    pub min_size: Size,
    pub max_size: Size,
    pub alignment: Alignment2D,
    pub always_consume_space: bool,
}

impl TestWidget {
    /// A widget that neither grows nor shrinks.
    pub fn fixed(size: Size) -> TestWidget {
        TestWidget::with_flags(size, LayoutFlags::empty())
    }

    pub fn with_flags(size: Size, flags: LayoutFlags) -> TestWidget {
        TestWidget {
            handle: Handle::new(),
            leaf: LeafItem {
                flags,
                ideal_size: size,
                ..LeafItem::default()
            },
            visible: true,
            bounds: Rect::from_origin_size(Point2::new(0, 0), size),
            min_size: Vector2::zero(),
            max_size: Vector2::zero(),
            alignment: Alignment2D::Default,
            always_consume_space: false,
        }
    }

    /// Makes the widget's height depend on the width it is given.
    pub fn with_height_for_width<F>(mut self, height_for_width: F) -> TestWidget
    where
        F: Fn(i32) -> i32 + Send + Sync + 'static,
    {
        let height_for_width: HeightForWidth = Arc::new(height_for_width);
        self.leaf.height_for_width = Some(height_for_width);
        self
    }
}

impl Widget for TestWidget {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn alignment(&self) -> Alignment2D {
        self.alignment
    }

    fn always_consume_space(&self) -> bool {
        self.always_consume_space
    }

    fn min_size(&self) -> Size {
        self.min_size
    }

    fn max_size(&self) -> Size {
        self.max_size
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn create_layout_item(&self, _dpi: Dpi) -> LeafItem {
        self.leaf.clone()
    }
}

#[derive(Debug)]
pub struct TestContainer {
    pub handle: Handle,
    pub children: Vec<Box<dyn Widget>>,
    pub layout: Option<Box<dyn Layout>>,
    pub size: Size,
    pub visible: bool,
}

impl TestContainer {
    pub fn new(children: Vec<Box<dyn Widget>>) -> TestContainer {
        TestContainer {
            handle: Handle::new(),
            children,
            layout: None,
            size: Vector2::zero(),
            visible: true,
        }
    }
}

impl Widget for TestContainer {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point2::new(0, 0), self.size)
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }
}

impl Container for TestContainer {
    fn as_widget(&self) -> &dyn Widget {
        self
    }

    fn children(&self) -> Vec<&dyn Widget> {
        self.children.iter().map(|child| &**child).collect()
    }

    fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_ref().map(|layout| &**layout)
    }
}

/// Something the backend was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Begin(usize),
    Defer(Handle, Rect),
    End,
    Abort,
    InvalidateRect(Handle, Rect),
    InvalidateBorder(Handle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestBackendError(pub Handle);

/// Records calls and keeps window bounds in memory.
#[derive(Debug, Default)]
pub struct TestBackend {
    pub dpi: Dpi,
    pub windows: HashMap<Handle, WindowState>,
    pub complex_backgrounds: HashSet<Handle>,
    pub fail_defer: Option<Handle>,
    pub calls: Vec<Call>,
}

impl TestBackend {
    pub fn new() -> TestBackend {
        TestBackend::default()
    }

    pub fn add_window(&mut self, widget: Handle, bounds: Rect) -> &mut WindowState {
        let state = self.windows.entry(widget).or_default();
        state.bounds = bounds;
        state
    }

    pub fn bounds(&self, widget: Handle) -> Option<Rect> {
        self.windows.get(&widget).map(|state| state.bounds)
    }
}

impl Backend for TestBackend {
    type Error = TestBackendError;
    type Transaction = Vec<(Handle, Rect)>;

    fn dpi_for_window(&self, _widget: Handle) -> Dpi {
        self.dpi
    }

    fn window_state(&self, widget: Handle) -> Result<WindowState, TestBackendError> {
        Ok(self.windows.get(&widget).copied().unwrap_or_default())
    }

    fn has_complex_background(&self, container: Handle) -> bool {
        self.complex_backgrounds.contains(&container)
    }

    fn begin_defer(&mut self, count: usize) -> Result<Self::Transaction, TestBackendError> {
        self.calls.push(Call::Begin(count));
        Ok(Vec::with_capacity(count))
    }

    fn defer(
        &mut self,
        transaction: &mut Self::Transaction,
        widget: Handle,
        bounds: Rect,
    ) -> Result<(), TestBackendError> {
        if self.fail_defer == Some(widget) {
            return Err(TestBackendError(widget));
        }
        self.calls.push(Call::Defer(widget, bounds));
        transaction.push((widget, bounds));
        Ok(())
    }

    fn end_defer(&mut self, transaction: Self::Transaction) -> Result<(), TestBackendError> {
        self.calls.push(Call::End);
        for (widget, bounds) in transaction {
            self.windows.entry(widget).or_default().bounds = bounds;
        }
        Ok(())
    }

    fn abort_defer(&mut self, _transaction: Self::Transaction) {
        self.calls.push(Call::Abort);
    }

    fn invalidate_rect(&mut self, container: Handle, rect: Rect) -> Result<(), TestBackendError> {
        self.calls.push(Call::InvalidateRect(container, rect));
        Ok(())
    }

    fn invalidate_border_in_parent(&mut self, widget: Handle) -> Result<(), TestBackendError> {
        self.calls.push(Call::InvalidateBorder(widget));
        Ok(())
    }
}
