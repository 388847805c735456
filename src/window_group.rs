//! Per-thread window groups and cross-thread synchronization.

use crate::tree::LayoutResult;
use crate::widget::Handle;
use core::fmt;
use log::{debug, trace};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

/// The results of one layout pass of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLayoutResult {
    pub form: Handle,
    pub results: Vec<LayoutResult>,
}

/// A resource shared by all windows of a group, such as a tool tip window.
///
/// Disposed on the group's thread once the last window of the group is gone.
pub trait GroupResource: Send {
    fn dispose(&mut self);
}

type Callback = Box<dyn FnOnce() + Send>;
type Registry = RwLock<HashMap<ThreadId, Arc<WindowGroup>>>;

#[derive(Debug, Default)]
struct Counter {
    refs: i32,
    ignored: i32,
    disposed: bool,
}

#[derive(Default)]
struct Pending {
    callbacks: Vec<Callback>,
    /// At most one entry per form.
    layouts: Vec<FormLayoutResult>,
}

/// The windows owned by one UI thread.
///
/// Other threads hand work to the group with [`synchronize`](WindowGroup::synchronize) and
/// [`synchronize_layout`](WindowGroup::synchronize_layout); the owning thread runs it with
/// [`run_synchronized`](WindowGroup::run_synchronized).
pub struct WindowGroup {
    thread: ThreadId,
    counter: Mutex<Counter>,
    pending: Mutex<Pending>,
    resources: Mutex<Vec<Box<dyn GroupResource>>>,
    registry: Weak<Registry>,
}

impl WindowGroup {
    fn new(thread: ThreadId, registry: Weak<Registry>) -> WindowGroup {
        WindowGroup {
            thread,
            counter: Mutex::new(Counter::default()),
            pending: Mutex::new(Pending::default()),
            resources: Mutex::new(Vec::new()),
            registry,
        }
    }

    /// The thread that owns this group.
    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }

    /// Number of live references.
    pub fn refs(&self) -> i32 {
        self.counter.lock().refs
    }

    pub fn is_disposed(&self) -> bool {
        self.counter.lock().disposed
    }

    /// Adds `delta` references, which may be negative.
    ///
    /// # Panics
    /// If the group has been disposed or the reference count would become negative.
    pub fn add(&self, delta: i32) {
        self.update(delta, 0);
    }

    /// Releases one reference. The group is disposed when only ignored references remain.
    pub fn done(&self) {
        self.add(-1);
    }

    /// Marks references as held by the group's own resources.
    pub(crate) fn ignore(&self, delta: i32) {
        self.update(0, delta);
    }

    fn update(&self, refs: i32, ignored: i32) {
        let dispose = {
            let mut counter = self.counter.lock();
            if counter.disposed {
                panic!("window group used after it was disposed");
            }

            counter.refs += refs;
            counter.ignored += ignored;
            if counter.refs < 0 {
                panic!("negative window group refs counter");
            }
            if counter.ignored < 0 {
                panic!("negative window group ignored counter");
            }

            counter.disposed = counter.refs - counter.ignored == 0;
            counter.disposed
        };

        if dispose {
            self.dispose();
        }
    }

    /// Adds a reference unless the group is already disposed.
    fn try_add(&self) -> bool {
        let mut counter = self.counter.lock();
        if counter.disposed {
            return false;
        }
        counter.refs += 1;
        true
    }

    fn dispose(&self) {
        trace!("disposing window group of {:?}", self.thread);

        let resources = mem::take(&mut *self.resources.lock());
        for mut resource in resources {
            resource.dispose();
        }
        let discarded = mem::take(&mut *self.pending.lock());
        if !discarded.callbacks.is_empty() || !discarded.layouts.is_empty() {
            debug!(
                "discarded {} callbacks and {} layouts queued on the window group of {:?}",
                discarded.callbacks.len(),
                discarded.layouts.len(),
                self.thread
            );
        }

        if let Some(registry) = self.registry.upgrade() {
            let mut groups = registry.write();
            let registered = groups
                .get(&self.thread)
                .map_or(false, |group| Arc::as_ptr(group) == self as *const WindowGroup);
            if registered {
                groups.remove(&self.thread);
            }
        }
    }

    /// Attaches a shared resource to the group.
    ///
    /// The resource keeps a reference to the group that does not keep it alive.
    pub fn attach_resource(&self, resource: Box<dyn GroupResource>) {
        self.add(1);
        self.resources.lock().push(resource);
        self.ignore(1);
    }

    /// Queues a function to run on the group's thread.
    pub fn synchronize<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.lock().callbacks.push(Box::new(f));
    }

    /// Queues layout results to be applied on the group's thread, replacing any results for the
    /// same form that have not been applied yet.
    pub fn synchronize_layout(&self, result: FormLayoutResult) {
        let mut pending = self.pending.lock();
        match pending.layouts.iter_mut().find(|r| r.form == result.form) {
            Some(existing) => {
                debug!("replacing pending layout of form {}", result.form);
                *existing = result;
            }
            None => pending.layouts.push(result),
        }
    }

    /// Returns true if there is queued work.
    pub fn has_pending(&self) -> bool {
        let pending = self.pending.lock();
        !pending.callbacks.is_empty() || !pending.layouts.is_empty()
    }

    /// Runs all queued work on the calling thread: layout results first, then callbacks.
    ///
    /// Every layout result is applied even if applying another one failed; the first error is
    /// returned.
    pub fn run_synchronized<F, E>(&self, mut apply: F) -> Result<(), E>
    where
        F: FnMut(&FormLayoutResult) -> Result<(), E>,
    {
        debug_assert_eq!(thread::current().id(), self.thread);

        let (callbacks, layouts) = {
            let mut pending = self.pending.lock();
            (
                mem::take(&mut pending.callbacks),
                mem::take(&mut pending.layouts),
            )
        };

        let mut first_error = None;
        for layout in &layouts {
            if let Err(err) = apply(layout) {
                first_error.get_or_insert(err);
            }
        }

        for callback in callbacks {
            callback();
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for WindowGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WindowGroup")
            .field("thread", &self.thread)
            .field("counter", &*self.counter.lock())
            .finish()
    }
}

/// Maps UI threads to their window groups.
#[derive(Debug, Clone, Default)]
pub struct WindowGroupManager {
    groups: Arc<Registry>,
}

impl WindowGroupManager {
    pub fn new() -> WindowGroupManager {
        WindowGroupManager::default()
    }

    /// Returns the group of a thread, creating it if needed, and adds a reference to it.
    pub fn group(&self, thread: ThreadId) -> Arc<WindowGroup> {
        if let Some(group) = self.groups.read().get(&thread) {
            if group.try_add() {
                return group.clone();
            }
        }

        let mut groups = self.groups.write();
        if let Some(group) = groups.get(&thread) {
            if group.try_add() {
                return group.clone();
            }
        }

        trace!("creating window group for {:?}", thread);
        let group = Arc::new(WindowGroup::new(thread, Arc::downgrade(&self.groups)));
        group.add(1);
        groups.insert(thread, group.clone());
        group
    }

    /// The group of the calling thread; see [`group`](WindowGroupManager::group).
    pub fn current(&self) -> Arc<WindowGroup> {
        self.group(thread::current().id())
    }

    /// Looks up a group without adding a reference.
    pub fn get(&self, thread: ThreadId) -> Option<Arc<WindowGroup>> {
        self.groups.read().get(&thread).cloned()
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::Rect;
    use crate::tree::{ItemId, LayoutResultItem};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn form_result(form: Handle, width: i32) -> FormLayoutResult {
        let item = Handle::new();
        FormLayoutResult {
            form,
            results: vec![LayoutResult {
                container: form,
                items: vec![LayoutResultItem {
                    item: ItemId(1),
                    handle: item,
                    bounds: Rect::new(0, 0, width, 10),
                }],
            }],
        }
    }

    #[test]
    fn last_layout_result_wins() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let (a, b) = (Handle::new(), Handle::new());

        group.synchronize_layout(form_result(a, 1));
        group.synchronize_layout(form_result(b, 2));
        group.synchronize_layout(form_result(a, 3));

        let mut applied = Vec::new();
        group
            .run_synchronized::<_, ()>(|result| {
                applied.push((result.form, result.results[0].items[0].bounds.width()));
                Ok(())
            })
            .unwrap();

        assert_eq!(applied, vec![(a, 3), (b, 2)]);
        assert!(!group.has_pending());
    }

    #[test]
    fn callbacks_run_after_layouts() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let order = Arc::new(Mutex::new(Vec::new()));

        let callback_order = order.clone();
        let worker_group = group.clone();
        let form = Handle::new();
        thread::spawn(move || {
            worker_group.synchronize(move || callback_order.lock().push("callback"));
            worker_group.synchronize_layout(form_result(form, 5));
        })
        .join()
        .unwrap();

        group
            .run_synchronized::<_, ()>(|_| {
                order.lock().push("layout");
                Ok(())
            })
            .unwrap();
        assert_eq!(*order.lock(), vec!["layout", "callback"]);
    }

    #[test]
    fn first_error_is_returned() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        group.synchronize_layout(form_result(Handle::new(), 1));
        group.synchronize_layout(form_result(Handle::new(), 2));
        group.synchronize(move || flag.store(true, Ordering::SeqCst));

        let mut calls = 0;
        let result = group.run_synchronized(|result| {
            calls += 1;
            Err(result.results[0].items[0].bounds.width())
        });
        assert_eq!(result, Err(1));
        assert_eq!(calls, 2);
        assert!(ran.load(Ordering::SeqCst));
    }

    struct Resource(Arc<AtomicBool>);

    impl GroupResource for Resource {
        fn dispose(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn ignored_references_do_not_keep_group_alive() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let same = manager.current();
        assert!(Arc::ptr_eq(&group, &same));
        assert_eq!(group.refs(), 2);

        let disposed = Arc::new(AtomicBool::new(false));
        group.attach_resource(Box::new(Resource(disposed.clone())));
        assert_eq!(group.refs(), 3);

        group.done();
        assert!(!disposed.load(Ordering::SeqCst));
        same.done();

        assert!(disposed.load(Ordering::SeqCst));
        assert!(group.is_disposed());
        assert!(manager.is_empty());

        let fresh = manager.current();
        assert!(!Arc::ptr_eq(&group, &fresh));
        assert_eq!(fresh.refs(), 1);
    }

    #[test]
    fn disposing_drops_queued_work() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let captured = Arc::new(());
        let held = captured.clone();

        group.synchronize(move || drop(held));
        group.synchronize_layout(form_result(Handle::new(), 1));
        assert_eq!(Arc::strong_count(&captured), 2);

        group.done();
        assert!(group.is_disposed());
        assert!(!group.has_pending());
        assert_eq!(Arc::strong_count(&captured), 1);
    }

    #[test]
    #[should_panic(expected = "after it was disposed")]
    fn disposed_group_panics() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        group.done();
        group.add(1);
    }

    #[test]
    #[should_panic(expected = "negative window group ignored counter")]
    fn negative_counter_panics() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        group.ignore(-1);
    }
}
