use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::view::{ElementId, TreeId, UiTree};

use super::{FrameSync, TimeFunction, normalized_timeline_progress};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub delay: Duration,
    pub timing: TimeFunction,
}

impl Tween {
    pub const fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            delay: Duration::ZERO,
            timing: TimeFunction::EaseOut,
        }
    }

    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub const fn timing(mut self, timing: TimeFunction) -> Self {
        self.timing = timing;
        self
    }

    pub fn sample(&self, elapsed: Duration) -> Option<f32> {
        let progress = normalized_timeline_progress(elapsed, self.delay, self.duration)?;
        Some(self.from + (self.to - self.from) * self.timing.sample(progress))
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.delay + self.duration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TweenTarget {
    pub tree: TreeId,
    pub element: ElementId,
}

pub type TweenApply = Arc<dyn Fn(&mut UiTree, ElementId, f32) + Send + Sync>;

struct Track {
    tween: Tween,
    started: Instant,
    apply: TweenApply,
    sync: FrameSync,
}

/// Elements with running tweens.
///
/// An element registers when it starts animating and must be unregistered
/// before it is destroyed; `UiTree::remove` does this for every removed
/// element.
#[derive(Default)]
pub struct TweenRegistry {
    tracks: Mutex<FxHashMap<TweenTarget, Vec<Track>>>,
}

static GLOBAL_REGISTRY: Lazy<TweenRegistry> = Lazy::new(TweenRegistry::default);

impl TweenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static TweenRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn register(&self, target: TweenTarget, tween: Tween, sync: FrameSync, apply: TweenApply) {
        self.register_at(target, tween, sync, apply, Instant::now());
    }

    pub fn register_at(
        &self,
        target: TweenTarget,
        tween: Tween,
        sync: FrameSync,
        apply: TweenApply,
        started: Instant,
    ) {
        self.lock().entry(target).or_default().push(Track {
            tween,
            started,
            apply,
            sync,
        });
    }

    pub fn unregister(&self, target: TweenTarget) -> bool {
        let removed = self.lock().remove(&target).is_some();
        if removed {
            debug!(?target, "tween target unregistered");
        }
        removed
    }

    pub fn unregister_tree(&self, tree: TreeId) {
        self.lock().retain(|target, _| target.tree != tree);
    }

    pub fn is_registered(&self, target: TweenTarget) -> bool {
        self.lock().contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples every track at `now` and queues the values as frame writes.
    /// Finished tracks are dropped after their final value is queued.
    pub fn advance(&self, now: Instant) -> usize {
        let mut tracks = self.lock();
        let mut queued = 0;
        for (target, list) in tracks.iter_mut() {
            list.retain(|track| {
                let elapsed = now.saturating_duration_since(track.started);
                if let Some(value) = track.tween.sample(elapsed) {
                    let apply = track.apply.clone();
                    track.sync.push(target.element, move |tree, id| apply(tree, id, value));
                    queued += 1;
                }
                !track.tween.is_finished(elapsed)
            });
        }
        tracks.retain(|_, list| !list.is_empty());
        queued
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<TweenTarget, Vec<Track>>> {
        self.tracks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Timer thread advancing the global registry. Stops when dropped.
pub struct TweenService {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TweenService {
    pub fn start(interval: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name("rftk-tween".into())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    TweenRegistry::global().advance(Instant::now());
                    thread::sleep(interval);
                }
            })?;
        debug!(?interval, "tween service started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for TweenService {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("tween service thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::{Tween, TweenRegistry, TweenService, TweenTarget};
    use crate::geometry::Size;
    use crate::render::NullRenderer;
    use crate::transition::{FrameSync, TimeFunction};
    use crate::view::{ElementId, Panel, UiTree, Width};

    #[test]
    fn tween_interpolates_after_delay() {
        let tween = Tween::new(10.0, 20.0, Duration::from_millis(100))
            .delay(Duration::from_millis(50))
            .timing(TimeFunction::Linear);
        assert_eq!(tween.sample(Duration::from_millis(10)), None);
        assert_eq!(tween.sample(Duration::from_millis(100)), Some(15.0));
        assert_eq!(tween.sample(Duration::from_secs(1)), Some(20.0));
        assert!(tween.is_finished(Duration::from_millis(150)));
    }

    #[test]
    fn advance_queues_writes_and_retires_finished_tracks() {
        let registry = TweenRegistry::new();
        let mut tree = UiTree::new();
        let id = tree.insert(Panel::new());
        let target = TweenTarget {
            tree: tree.id(),
            element: id,
        };
        let sync = FrameSync::new();
        let start = Instant::now();
        registry.register_at(
            target,
            Tween::new(0.0, 100.0, Duration::from_millis(100)).timing(TimeFunction::Linear),
            sync.clone(),
            Arc::new(|tree: &mut UiTree, id: ElementId, value: f32| {
                tree.set::<Width>(id, Some(value))
            }),
            start,
        );

        assert_eq!(registry.advance(start + Duration::from_millis(50)), 1);
        assert!(registry.is_registered(target));
        assert_eq!(registry.advance(start + Duration::from_millis(200)), 1);
        assert!(!registry.is_registered(target));
        assert_eq!(sync.len(), 2);

        let writes = sync.drain();
        for (target, write) in writes {
            write(&mut tree, target);
        }
        assert_eq!(tree.get::<Width>(id), Some(100.0));
    }

    #[test]
    fn unregister_tree_drops_only_that_tree() {
        let registry = TweenRegistry::new();
        let (tree_a, tree_b) = (UiTree::new(), UiTree::new());
        let mut scratch = UiTree::new();
        let element = scratch.insert(Panel::new());
        let tween = Tween::new(0.0, 1.0, Duration::from_secs(1));
        for tree in [tree_a.id(), tree_b.id()] {
            registry.register(TweenTarget { tree, element }, tween, FrameSync::new(), Arc::new(|_: &mut UiTree, _: ElementId, _: f32| {}));
        }
        registry.unregister_tree(tree_a.id());
        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered(TweenTarget {
            tree: tree_b.id(),
            element
        }));
    }

    #[test]
    fn service_thread_feeds_the_next_frame() {
        let service = TweenService::start(Duration::from_millis(5)).expect("spawn tween thread");
        let mut tree = UiTree::new();
        let root = tree.insert(Panel::new());
        tree.set_root(root);
        tree.animate(
            root,
            Tween::new(0.0, 50.0, Duration::from_millis(30)).timing(TimeFunction::Linear),
            |tree, id, value| tree.set::<Width>(id, Some(value)),
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while tree.is_animating(root) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!tree.is_animating(root));

        tree.run_frame(Size::new(100.0, 100.0), &mut NullRenderer::new());
        assert_eq!(tree.get::<Width>(root), Some(50.0));
        assert_eq!(tree.core(root).actual_rect().width, 50.0);
        assert_eq!(tree.apply_pending(), 0);

        drop(service);
    }
}
