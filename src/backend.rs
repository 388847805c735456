//! Traits for backends.

use crate::dpi::Dpi;
use crate::rect::Rect;
use crate::widget::Handle;

/// Platform state of a widget's window that affects how new bounds are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowState {
    /// Current bounds in device pixels, relative to the parent's client area.
    pub bounds: Rect,
    /// Drop-down lists report a height one pixel off from what they were given.
    pub is_dropdown: bool,
    /// Shadows and similar effects drawn outside the bounds.
    pub has_graphics_effects: bool,
}

/// A backend implementation.
///
/// All methods are called on the UI thread that owns the widgets.
pub trait Backend {
    /// Error type.
    type Error;

    /// A batch of deferred window moves.
    type Transaction;

    /// Resolution of the window a widget lives in.
    fn dpi_for_window(&self, widget: Handle) -> Dpi;

    fn window_state(&self, widget: Handle) -> Result<WindowState, Self::Error>;

    /// Returns true if the container paints a background that moved children would smear.
    fn has_complex_background(&self, container: Handle) -> bool;

    /// Starts a batch of deferred moves for the given number of windows.
    fn begin_defer(&mut self, count: usize) -> Result<Self::Transaction, Self::Error>;

    /// Adds a move to the batch.
    fn defer(
        &mut self,
        transaction: &mut Self::Transaction,
        widget: Handle,
        bounds: Rect,
    ) -> Result<(), Self::Error>;

    /// Applies every move in the batch at once.
    fn end_defer(&mut self, transaction: Self::Transaction) -> Result<(), Self::Error>;

    /// Throws away a batch without applying it.
    fn abort_defer(&mut self, transaction: Self::Transaction) {
        drop(transaction);
    }

    /// Schedules a repaint of part of a container.
    fn invalidate_rect(&mut self, container: Handle, rect: Rect) -> Result<(), Self::Error>;

    /// Repaints the area around a widget in its parent.
    fn invalidate_border_in_parent(&mut self, widget: Handle) -> Result<(), Self::Error>;
}
