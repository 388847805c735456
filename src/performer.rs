//! Background layout computation.
//!
//! A [`LayoutPerformer`] owns one coordination thread per form. Layout requests are snapshots
//! ([`LayoutTree`]s); each one runs on a driver thread that fans out over a shared thread pool,
//! one task per container. A newer request cancels the one in flight, and results of superseded
//! requests are dropped.

use crate::error::PerformerError;
use crate::rect::Size;
use crate::tree::{ItemId, LayoutResult, LayoutTree};
use crate::widget::Handle;
use crate::window_group::{FormLayoutResult, WindowGroup};
use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError};
use crossbeam::sync::WaitGroup;
use log::{debug, trace, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Performer settings.
#[derive(Debug, Clone, Default)]
pub struct PerformerConfig {
    /// Number of worker threads; `None` lets the pool decide.
    pub threads: Option<usize>,
}

impl PerformerConfig {
    pub fn build_pool(&self) -> Result<ThreadPool, PerformerError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("perch-worker-{}", i));
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        Ok(builder.build()?)
    }
}

/// Cancels a computation when dropped or when [`cancel`](Canceler::cancel) is called.
#[derive(Debug)]
pub struct Canceler {
    _sender: Sender<()>,
}

impl Canceler {
    pub fn cancel(self) {}
}

/// Observes whether a computation has been canceled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: Receiver<()>,
}

impl CancelToken {
    pub fn is_canceled(&self) -> bool {
        match self.receiver.try_recv() {
            Err(TryRecvError::Disconnected) => true,
            _ => false,
        }
    }
}

/// Creates a linked canceler and token.
pub fn cancel_pair() -> (Canceler, CancelToken) {
    let (sender, receiver) = channel::bounded(0);
    (Canceler { _sender: sender }, CancelToken { receiver })
}

enum Command {
    Perform(LayoutTree, u64),
    SetSizing(bool),
    Quit,
}

struct Completion {
    generation: u64,
    results: Option<Vec<LayoutResult>>,
}

/// Computes a layout on a thread pool.
///
/// The context pre-pass runs on the calling thread; afterwards every container is laid out in its
/// own task. Returns `None` if the token was canceled before all results came in.
pub fn compute_layout(
    mut tree: LayoutTree,
    pool: &ThreadPool,
    token: &CancelToken,
) -> Option<Vec<LayoutResult>> {
    let start = Instant::now();
    tree.populate_context();
    trace!("context pre-pass over {} items took {:?}", tree.len(), start.elapsed());

    if token.is_canceled() {
        return None;
    }

    let start = Instant::now();
    let tree = Arc::new(tree);
    let (results_tx, results_rx) = channel::unbounded();
    let wait_group = WaitGroup::new();

    let root = tree.root();
    let task = Task {
        tree: tree.clone(),
        token: token.clone(),
        results: results_tx,
        wait_group: wait_group.clone(),
    };
    let client_size = tree.client_size(root);
    pool.spawn(move || layout_container(task, root, client_size));

    let mut results = Vec::new();
    loop {
        select! {
            recv(results_rx) -> result => match result {
                Ok(result) => results.push(result),
                Err(_) => break,
            },
            recv(token.receiver) -> _ => return None,
        }
    }

    wait_group.wait();
    trace!("layout of {} containers took {:?}", results.len(), start.elapsed());

    if token.is_canceled() {
        None
    } else {
        Some(results)
    }
}

#[derive(Clone)]
struct Task {
    tree: Arc<LayoutTree>,
    token: CancelToken,
    results: Sender<LayoutResult>,
    wait_group: WaitGroup,
}

fn layout_container(task: Task, id: ItemId, client_size: Size) {
    if task.token.is_canceled() {
        return;
    }

    let items = task.tree.perform_layout(id, client_size);
    if task.token.is_canceled() {
        return;
    }

    let children: Vec<_> = items
        .iter()
        .filter(|item| task.tree.is_container(item.item))
        .map(|item| (item.item, item.bounds.size))
        .collect();

    let result = LayoutResult {
        container: task.tree.handle(id),
        items,
    };
    if task.results.send(result).is_err() {
        return;
    }

    for (child, size) in children {
        if task.token.is_canceled() {
            return;
        }
        let child_task = task.clone();
        rayon::spawn(move || layout_container(child_task, child, size));
    }
}

/// Computes a layout on the calling thread.
pub fn layout_tree_blocking(mut tree: LayoutTree) -> Vec<LayoutResult> {
    tree.populate_context();

    let root = tree.root();
    let mut results = Vec::new();
    let mut stack = vec![(root, tree.client_size(root))];

    while let Some((id, client_size)) = stack.pop() {
        let items = tree.perform_layout(id, client_size);
        for item in items.iter().rev() {
            if tree.is_container(item.item) {
                stack.push((item.item, item.bounds.size));
            }
        }
        results.push(LayoutResult {
            container: tree.handle(id),
            items,
        });
    }

    results
}

struct Coordinator {
    form: Handle,
    group: Arc<WindowGroup>,
    pool: Arc<ThreadPool>,
    sizing: bool,
    generation: u64,
    in_flight: Option<Canceler>,
    done: Sender<Completion>,
    sync_results: Sender<SizingResults>,
}

/// Results routed to the size loop, tagged with the generation that produced them.
type SizingResults = (u64, Vec<LayoutResult>);

impl Coordinator {
    fn new(
        form: Handle,
        group: Arc<WindowGroup>,
        pool: Arc<ThreadPool>,
        sync_results: Sender<SizingResults>,
    ) -> (Coordinator, Receiver<Completion>) {
        let (done, done_rx) = channel::unbounded();
        let coordinator = Coordinator {
            form,
            group,
            pool,
            sizing: false,
            generation: 0,
            in_flight: None,
            done,
            sync_results,
        };
        (coordinator, done_rx)
    }

    fn run(mut self, commands: Receiver<Command>, done: Receiver<Completion>) {
        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(Command::Perform(tree, generation)) => self.start(tree, generation),
                    Ok(Command::SetSizing(sizing)) => self.sizing = sizing,
                    Ok(Command::Quit) | Err(_) => break,
                },
                recv(done) -> completion => {
                    if let Ok(completion) = completion {
                        self.finish(completion);
                    }
                }
            }
        }

        if let Some(canceler) = self.in_flight.take() {
            canceler.cancel();
        }
        trace!("layout coordinator of form {} exited", self.form);
    }

    fn start(&mut self, tree: LayoutTree, generation: u64) {
        if let Some(canceler) = self.in_flight.take() {
            debug!(
                "layout {} of form {} superseded",
                self.generation, self.form
            );
            canceler.cancel();
        }

        self.generation = generation;
        let (canceler, token) = cancel_pair();
        self.in_flight = Some(canceler);

        let pool = self.pool.clone();
        let done = self.done.clone();
        let spawned = thread::Builder::new()
            .name(format!("perch-layout-{}", self.form))
            .spawn(move || {
                let results = compute_layout(tree, &pool, &token);
                let _ = done.send(Completion {
                    generation,
                    results,
                });
            });

        if let Err(err) = spawned {
            warn!("could not spawn layout thread for form {}: {}", self.form, err);
            self.in_flight = None;
            if self.sizing {
                let _ = self.sync_results.send((generation, Vec::new()));
            }
        }
    }

    fn finish(&mut self, completion: Completion) {
        if completion.generation != self.generation {
            debug!(
                "dropping stale layout {} of form {} (current: {})",
                completion.generation, self.form, self.generation
            );
            return;
        }
        self.in_flight = None;

        let results = match completion.results {
            Some(results) => results,
            None => return,
        };

        if self.sizing {
            debug!("routing layout {} of form {} to the size loop", self.generation, self.form);
            let _ = self.sync_results.send((self.generation, results));
        } else {
            debug!("routing layout {} of form {} to its window group", self.generation, self.form);
            self.group.synchronize_layout(FormLayoutResult {
                form: self.form,
                results,
            });
        }
    }
}

/// Runs layout computations for one form in the background.
pub struct LayoutPerformer {
    form: Handle,
    commands: Sender<Command>,
    generation: AtomicU64,
    sync_results: Receiver<SizingResults>,
    thread: Option<JoinHandle<()>>,
}

impl LayoutPerformer {
    /// Starts a performer whose computations run on `pool`. The pool is usually shared by every
    /// form of the application.
    pub fn with_pool(
        form: Handle,
        group: Arc<WindowGroup>,
        pool: Arc<ThreadPool>,
    ) -> Result<LayoutPerformer, PerformerError> {
        let (commands, commands_rx) = channel::unbounded();
        let (sync_tx, sync_results) = channel::unbounded();
        let (coordinator, done_rx) = Coordinator::new(form, group, pool, sync_tx);

        let thread = thread::Builder::new()
            .name(format!("perch-coordinator-{}", form))
            .spawn(move || coordinator.run(commands_rx, done_rx))?;

        Ok(LayoutPerformer {
            form,
            commands,
            generation: AtomicU64::new(0),
            sync_results,
            thread: Some(thread),
        })
    }

    pub fn form(&self) -> Handle {
        self.form
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("layout coordinator of form {} is gone", self.form);
        }
    }

    /// Requests a layout, canceling the one in flight. Returns the generation of the request.
    pub fn perform_layout(&self, tree: LayoutTree) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(Command::Perform(tree, generation));
        generation
    }

    /// While sizing, results are handed to [`wait_for_results`](LayoutPerformer::wait_for_results)
    /// instead of the window group.
    pub fn set_sizing(&self, sizing: bool) {
        self.send(Command::SetSizing(sizing));
    }

    /// Blocks until the results of `generation` arrive while sizing. Results of earlier requests
    /// that are still queued are discarded.
    pub fn wait_for_results(&self, generation: u64) -> Option<Vec<LayoutResult>> {
        loop {
            let (produced_by, results) = self.sync_results.recv().ok()?;
            if produced_by >= generation {
                return Some(results);
            }
            debug!(
                "discarded superseded layout {} of form {} (waiting for {})",
                produced_by, self.form, generation
            );
        }
    }

    /// Discards results produced while sizing that nobody waited for.
    pub fn drain(&self) {
        let discarded = self.sync_results.try_iter().count();
        if discarded > 0 {
            debug!("discarded {} unclaimed layouts of form {}", discarded, self.form);
        }
    }
}

impl Drop for LayoutPerformer {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Quit);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("layout coordinator of form {} panicked", self.form);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::box_layout::BoxLayout;
    use crate::dpi::Dpi;
    use crate::flags::LayoutFlags;
    use crate::layout::build_layout_tree;
    use crate::rect::size;
    use crate::testing::{TestContainer, TestWidget};
    use crate::widget::Widget;
    use crate::window_group::WindowGroupManager;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    fn nested_form() -> TestContainer {
        let mut column = TestContainer::new(vec![
            Box::new(TestWidget::fixed(size(40, 20))),
            Box::new(TestWidget::fixed(size(40, 20))),
        ]);
        column.layout = Some(Box::new(BoxLayout::vertical()));

        let children: Vec<Box<dyn Widget>> = vec![
            Box::new(TestWidget::fixed(size(50, 20))),
            Box::new(column),
        ];
        let mut form = TestContainer::new(children);
        form.size = size(300, 200);
        form
    }

    fn pool() -> ThreadPool {
        PerformerConfig { threads: Some(2) }.build_pool().unwrap()
    }

    fn by_container(results: Vec<LayoutResult>) -> HashMap<Handle, LayoutResult> {
        results
            .into_iter()
            .map(|result| (result.container, result))
            .collect()
    }

    #[test]
    fn results_cover_every_container() {
        let form = nested_form();
        let (_canceler, token) = cancel_pair();

        let parallel = compute_layout(build_layout_tree(&form, Dpi::STANDARD), &pool(), &token)
            .unwrap();
        let sequential = layout_tree_blocking(build_layout_tree(&form, Dpi::STANDARD));

        assert_eq!(parallel.len(), 2);
        assert_eq!(sequential[0].container, form.handle);
        assert_eq!(by_container(parallel), by_container(sequential));
    }

    #[test]
    fn canceled_computation_returns_nothing() {
        let form = nested_form();
        let (canceler, token) = cancel_pair();
        assert!(!token.is_canceled());
        canceler.cancel();
        assert!(token.is_canceled());

        let tree = build_layout_tree(&form, Dpi::STANDARD);
        assert!(compute_layout(tree, &pool(), &token).is_none());
    }

    #[test]
    fn superseded_layouts_are_dropped() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let (sync_tx, _sync_rx) = channel::unbounded();
        let form = Handle::new();
        let (mut coordinator, done) =
            Coordinator::new(form, group.clone(), Arc::new(pool()), sync_tx);

        let first = nested_form();
        let second = nested_form();
        coordinator.start(build_layout_tree(&first, Dpi::STANDARD), 1);
        coordinator.start(build_layout_tree(&second, Dpi::STANDARD), 2);

        for _ in 0..2 {
            let completion = done.recv_timeout(Duration::from_secs(10)).unwrap();
            coordinator.finish(completion);
        }

        let mut applied = Vec::new();
        group
            .run_synchronized::<_, ()>(|result| {
                applied.push(result.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].form, form);
        let containers: Vec<_> = applied[0].results.iter().map(|r| r.container).collect();
        assert!(containers.contains(&second.handle));
        assert!(!containers.contains(&first.handle));
    }

    #[test]
    fn sizing_results_are_returned_synchronously() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let form = nested_form();
        let performer =
            LayoutPerformer::with_pool(form.handle, group.clone(), Arc::new(pool())).unwrap();

        performer.set_sizing(true);
        let generation = performer.perform_layout(build_layout_tree(&form, Dpi::STANDARD));
        let results = performer.wait_for_results(generation).unwrap();
        assert_eq!(results.len(), 2);
        assert!(!group.has_pending());
    }

    #[test]
    fn size_loop_skips_results_of_earlier_requests() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let open = Arc::new(AtomicBool::new(false));
        let gate = open.clone();
        let wrapping = TestWidget::with_flags(
            size(80, 20),
            LayoutFlags::SHRINKABLE_HORZ | LayoutFlags::GROWABLE_HORZ,
        )
        .with_height_for_width(move |width| {
            while !gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            4000 / width.max(1)
        });
        let mut form = TestContainer::new(vec![Box::new(wrapping)]);
        let performer =
            LayoutPerformer::with_pool(form.handle, group.clone(), Arc::new(pool())).unwrap();
        performer.set_sizing(true);

        form.size = size(100, 50);
        let narrow = performer.perform_layout(build_layout_tree(&form, Dpi::STANDARD));
        performer.drain();
        open.store(true, Ordering::SeqCst);

        // the narrow layout is queued for the size loop before the wide one is requested
        let deadline = Instant::now() + Duration::from_secs(10);
        while performer.sync_results.is_empty() {
            assert!(Instant::now() < deadline, "layout never arrived");
            thread::sleep(Duration::from_millis(5));
        }

        form.size = size(300, 50);
        let wide = performer.perform_layout(build_layout_tree(&form, Dpi::STANDARD));
        assert!(wide > narrow);

        let results = performer.wait_for_results(wide).unwrap();
        let expected = layout_tree_blocking(build_layout_tree(&form, Dpi::STANDARD));
        assert_eq!(results, expected);
        assert_eq!(results[0].items[0].bounds.width(), 300);
        assert!(performer.sync_results.is_empty());
        assert!(!group.has_pending());
    }

    #[test]
    fn results_reach_the_window_group() {
        let manager = WindowGroupManager::new();
        let group = manager.current();
        let form = nested_form();
        let performer =
            LayoutPerformer::with_pool(form.handle, group.clone(), Arc::new(pool())).unwrap();

        performer.perform_layout(build_layout_tree(&form, Dpi::STANDARD));

        let deadline = Instant::now() + Duration::from_secs(10);
        while !group.has_pending() {
            assert!(Instant::now() < deadline, "layout never arrived");
            thread::sleep(Duration::from_millis(5));
        }
        drop(performer);

        let mut forms = Vec::new();
        group
            .run_synchronized::<_, ()>(|result| {
                forms.push(result.form);
                Ok(())
            })
            .unwrap();
        assert_eq!(forms, vec![form.handle]);
    }
}
