use crate::apply::apply_layout_results;
use crate::backend::Backend;
use crate::error::PerformerError;
use crate::layout::build_layout_tree;
use crate::performer::{layout_tree_blocking, LayoutPerformer};
use crate::tree::LayoutTree;
use crate::widget::{Container, Handle};
use crate::window_group::{WindowGroup, WindowGroupManager};
use log::debug;
use rayon::ThreadPool;
use std::sync::Arc;

/// Connects a form's widget tree to the layout pipeline.
///
/// A host belongs to the UI thread it was created on and holds a reference to that thread's
/// window group until it is dropped.
pub struct Host {
    form: Handle,
    group: Arc<WindowGroup>,
    performer: LayoutPerformer,
    sizing: bool,
}

impl Host {
    /// Creates a host for the form on the calling thread. Background layouts run on `pool`, which
    /// is meant to be shared by all hosts.
    pub fn new(
        form: Handle,
        groups: &WindowGroupManager,
        pool: &Arc<ThreadPool>,
    ) -> Result<Host, PerformerError> {
        let group = groups.current();
        match LayoutPerformer::with_pool(form, group.clone(), pool.clone()) {
            Ok(performer) => Ok(Host {
                form,
                group,
                performer,
                sizing: false,
            }),
            Err(err) => {
                group.done();
                Err(err)
            }
        }
    }

    pub fn form(&self) -> Handle {
        self.form
    }

    pub fn group(&self) -> &Arc<WindowGroup> {
        &self.group
    }

    pub fn is_sizing(&self) -> bool {
        self.sizing
    }

    fn snapshot<B: Backend>(&self, root: &dyn Container, backend: &B) -> LayoutTree {
        build_layout_tree(root, backend.dpi_for_window(self.form))
    }

    /// Starts a background layout. The results are applied by
    /// [`run_synchronized`](Host::run_synchronized).
    pub fn request_layout<B: Backend>(&self, root: &dyn Container, backend: &B) {
        let generation = self.performer.perform_layout(self.snapshot(root, backend));
        debug!("requested layout {} of form {}", generation, self.form);
    }

    /// Called when the user starts resizing the form.
    pub fn begin_size_loop(&mut self) {
        debug!("form {} entered the size loop", self.form);
        self.sizing = true;
        self.performer.set_sizing(true);
    }

    pub fn end_size_loop(&mut self) {
        debug!("form {} left the size loop", self.form);
        self.sizing = false;
        self.performer.set_sizing(false);
        self.performer.drain();
    }

    /// Lays out the form for its new size and applies the results before returning.
    ///
    /// Inside a size loop the computation still runs on the performer; outside of one this is the
    /// same as [`update`](Host::update).
    pub fn layout_during_resize<B: Backend>(
        &mut self,
        root: &dyn Container,
        backend: &mut B,
    ) -> Result<(), B::Error> {
        if !self.sizing {
            return self.update(root, backend);
        }

        self.performer.drain();
        let generation = self.performer.perform_layout(self.snapshot(root, &*backend));
        match self.performer.wait_for_results(generation) {
            Some(results) => apply_layout_results(backend, &results),
            None => Ok(()),
        }
    }

    /// Computes and applies a layout on the calling thread.
    pub fn update<B: Backend>(&self, root: &dyn Container, backend: &mut B) -> Result<(), B::Error> {
        let results = layout_tree_blocking(self.snapshot(root, &*backend));
        apply_layout_results(backend, &results)
    }

    /// Applies pending layouts of every form in this thread's group and runs queued callbacks.
    pub fn run_synchronized<B: Backend>(&self, backend: &mut B) -> Result<(), B::Error> {
        self.group
            .run_synchronized(|result| apply_layout_results(backend, &result.results))
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.group.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dpi::Dpi;
    use crate::performer::PerformerConfig;
    use crate::rect::{size, Rect};
    use crate::testing::{TestBackend, TestContainer, TestWidget};
    use crate::tree::LayoutResult;
    use crate::widget::Widget;
    use std::thread;
    use std::time::{Duration, Instant};

    fn form() -> TestContainer {
        let mut form = TestContainer::new(vec![
            Box::new(TestWidget::fixed(size(40, 20))),
            Box::new(TestWidget::fixed(size(60, 20))),
        ]);
        form.size = size(200, 50);
        form
    }

    fn backend_for(form: &TestContainer) -> TestBackend {
        let mut backend = TestBackend::new();
        for child in &form.children {
            backend.add_window(child.handle(), Rect::zero());
        }
        backend
    }

    fn expected(form: &TestContainer) -> Vec<LayoutResult> {
        layout_tree_blocking(build_layout_tree(form, Dpi::STANDARD))
    }

    fn pool() -> Arc<ThreadPool> {
        Arc::new(PerformerConfig { threads: Some(2) }.build_pool().unwrap())
    }

    fn assert_applied(backend: &TestBackend, expected: &[LayoutResult]) {
        for item in &expected[0].items {
            assert_eq!(backend.bounds(item.handle), Some(item.bounds));
        }
    }

    #[test]
    fn update_applies_synchronously() {
        let form = form();
        let mut backend = backend_for(&form);
        let groups = WindowGroupManager::new();
        let host = Host::new(form.handle, &groups, &pool()).unwrap();

        host.update(&form, &mut backend).unwrap();
        assert_applied(&backend, &expected(&form));
    }

    #[test]
    fn background_layout_is_applied_on_the_ui_thread() {
        let form = form();
        let mut backend = backend_for(&form);
        let groups = WindowGroupManager::new();
        let host = Host::new(form.handle, &groups, &pool()).unwrap();

        host.request_layout(&form, &backend);
        let deadline = Instant::now() + Duration::from_secs(10);
        while !host.group().has_pending() {
            assert!(Instant::now() < deadline, "layout never arrived");
            thread::sleep(Duration::from_millis(5));
        }

        assert!(backend.calls.is_empty());
        host.run_synchronized(&mut backend).unwrap();
        assert_applied(&backend, &expected(&form));
    }

    #[test]
    fn resizing_waits_for_results() {
        let mut form = form();
        let mut backend = backend_for(&form);
        let groups = WindowGroupManager::new();
        let mut host = Host::new(form.handle, &groups, &pool()).unwrap();

        host.begin_size_loop();
        for width in &[220, 240, 260] {
            form.size = size(*width, 50);
            host.layout_during_resize(&form, &mut backend).unwrap();
            assert_applied(&backend, &expected(&form));
        }
        host.end_size_loop();
        assert!(!host.is_sizing());
        assert!(!host.group().has_pending());
    }

    #[test]
    fn dropping_the_last_host_disposes_the_group() {
        let groups = WindowGroupManager::new();
        let pool = pool();
        let first = Host::new(Handle::new(), &groups, &pool).unwrap();
        let second = Host::new(Handle::new(), &groups, &pool).unwrap();
        assert!(Arc::ptr_eq(first.group(), second.group()));
        assert_eq!(first.group().refs(), 2);
        assert_eq!(Arc::strong_count(&pool), 3);

        let group = first.group().clone();
        drop(first);
        assert_eq!(groups.len(), 1);
        drop(second);
        assert!(group.is_disposed());
        assert!(groups.is_empty());
        assert_eq!(Arc::strong_count(&pool), 1);
    }
}
