//! Applying layout results to live widgets.

use crate::backend::{Backend, WindowState};
use crate::rect::Rect;
use crate::tree::LayoutResult;
use crate::widget::Handle;
use log::{trace, warn};
use std::time::Instant;

/// Returns true if moving a widget to `bounds` would not change anything.
///
/// Drop-down lists report a height one pixel short of what they were last given.
pub fn is_unchanged(state: &WindowState, bounds: Rect) -> bool {
    let old = state.bounds;
    if old.x() != bounds.x() || old.y() != bounds.y() || old.width() != bounds.width() {
        return false;
    }
    if state.is_dropdown {
        old.height() + 1 == bounds.height()
    } else {
        old.height() == bounds.height()
    }
}

#[derive(Debug)]
struct Move {
    container: Handle,
    widget: Handle,
    old: Rect,
    new: Rect,
    repaint_vacated: bool,
    invalidate_border: bool,
}

/// Moves every widget of one layout pass in a single deferred transaction.
///
/// If the backend fails, the transaction is thrown away and widgets keep their previous bounds.
pub fn apply_layout_results<B: Backend>(
    backend: &mut B,
    results: &[LayoutResult],
) -> Result<(), B::Error> {
    let start = Instant::now();

    let mut moves = Vec::new();
    for result in results {
        let complex_background = backend.has_complex_background(result.container);

        for item in &result.items {
            let state = backend.window_state(item.handle)?;
            if is_unchanged(&state, item.bounds) {
                continue;
            }

            let old = state.bounds;
            let moved_only = old.size == item.bounds.size && old.origin != item.bounds.origin;
            moves.push(Move {
                container: result.container,
                widget: item.handle,
                old,
                new: item.bounds,
                repaint_vacated: complex_background && moved_only,
                invalidate_border: state.has_graphics_effects,
            });
        }
    }

    if moves.is_empty() {
        return Ok(());
    }

    let mut transaction = backend.begin_defer(moves.len())?;
    for m in &moves {
        if let Err(err) = backend.defer(&mut transaction, m.widget, m.new) {
            warn!("could not move {}; discarding {} moves", m.widget, moves.len());
            backend.abort_defer(transaction);
            return Err(err);
        }
    }
    if let Err(err) = backend.end_defer(transaction) {
        warn!("could not apply {} moves", moves.len());
        return Err(err);
    }

    for m in &moves {
        if m.repaint_vacated {
            for rect in m.old.subtract(m.new) {
                backend.invalidate_rect(m.container, rect)?;
            }
        }
        if m.invalidate_border {
            backend.invalidate_border_in_parent(m.widget)?;
        }
    }

    trace!("applied {} moves in {:?}", moves.len(), start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, TestBackend, TestBackendError};
    use crate::tree::{ItemId, LayoutResultItem};

    fn result(container: Handle, items: &[(Handle, Rect)]) -> LayoutResult {
        LayoutResult {
            container,
            items: items
                .iter()
                .enumerate()
                .map(|(i, &(handle, bounds))| LayoutResultItem {
                    item: ItemId(i + 1),
                    handle,
                    bounds,
                })
                .collect(),
        }
    }

    #[test]
    fn dropdown_height_is_off_by_one() {
        let regular = WindowState {
            bounds: Rect::new(0, 0, 80, 20),
            ..WindowState::default()
        };
        assert!(is_unchanged(&regular, Rect::new(0, 0, 80, 20)));
        assert!(!is_unchanged(&regular, Rect::new(0, 0, 80, 21)));
        assert!(!is_unchanged(&regular, Rect::new(1, 0, 80, 20)));

        let dropdown = WindowState {
            is_dropdown: true,
            ..regular
        };
        assert!(is_unchanged(&dropdown, Rect::new(0, 0, 80, 21)));
        assert!(!is_unchanged(&dropdown, Rect::new(0, 0, 80, 20)));
        assert!(!is_unchanged(&dropdown, Rect::new(0, 0, 80, 22)));
    }

    #[test]
    fn moves_are_batched_and_unchanged_items_skipped() {
        let (form, panel) = (Handle::new(), Handle::new());
        let (a, b, c) = (Handle::new(), Handle::new(), Handle::new());
        let mut backend = TestBackend::new();
        backend.add_window(a, Rect::new(0, 0, 50, 20));
        backend.add_window(b, Rect::new(60, 0, 50, 20));
        backend.add_window(c, Rect::new(0, 0, 10, 10));

        let results = vec![
            result(form, &[(a, Rect::new(0, 0, 50, 20)), (b, Rect::new(60, 0, 70, 20))]),
            result(panel, &[(c, Rect::new(5, 5, 10, 10))]),
        ];
        apply_layout_results(&mut backend, &results).unwrap();

        assert_eq!(
            backend.calls,
            vec![
                Call::Begin(2),
                Call::Defer(b, Rect::new(60, 0, 70, 20)),
                Call::Defer(c, Rect::new(5, 5, 10, 10)),
                Call::End,
            ]
        );
        assert_eq!(backend.bounds(b), Some(Rect::new(60, 0, 70, 20)));

        backend.calls.clear();
        apply_layout_results(&mut backend, &results).unwrap();
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn failed_move_aborts_the_pass() {
        let form = Handle::new();
        let (a, b) = (Handle::new(), Handle::new());
        let mut backend = TestBackend::new();
        backend.add_window(a, Rect::new(0, 0, 10, 10));
        backend.add_window(b, Rect::new(0, 0, 10, 10));
        backend.fail_defer = Some(b);

        let results = vec![result(
            form,
            &[(a, Rect::new(0, 0, 20, 10)), (b, Rect::new(20, 0, 20, 10))],
        )];
        assert_eq!(
            apply_layout_results(&mut backend, &results),
            Err(TestBackendError(b))
        );

        assert_eq!(backend.calls.last(), Some(&Call::Abort));
        assert!(!backend.calls.contains(&Call::End));
        assert_eq!(backend.bounds(a), Some(Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn moved_items_repaint_what_they_leave_behind() {
        let container = Handle::new();
        let (moved, shadowed) = (Handle::new(), Handle::new());
        let mut backend = TestBackend::new();
        backend.complex_backgrounds.insert(container);
        backend.add_window(moved, Rect::new(0, 0, 10, 10));
        backend
            .add_window(shadowed, Rect::new(0, 20, 10, 10))
            .has_graphics_effects = true;

        let results = vec![result(
            container,
            &[
                (moved, Rect::new(5, 0, 10, 10)),
                (shadowed, Rect::new(0, 20, 30, 10)),
            ],
        )];
        apply_layout_results(&mut backend, &results).unwrap();

        assert_eq!(
            &backend.calls[4..],
            &[
                Call::InvalidateRect(container, Rect::new(0, 0, 5, 10)),
                Call::InvalidateBorder(shadowed),
            ]
        );
    }
}
