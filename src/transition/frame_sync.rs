use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::view::{ElementId, UiTree};

type PendingWrite = Box<dyn FnOnce(&mut UiTree, ElementId) + Send>;

/// Cross-thread write queue drained by the UI thread at the start of a frame.
///
/// Writers never touch the tree directly; every mutation is sequenced before
/// the next frame's layout pass.
#[derive(Clone, Default)]
pub struct FrameSync {
    queue: Arc<Mutex<Vec<(ElementId, PendingWrite)>>>,
}

impl FrameSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, target: ElementId, write: impl FnOnce(&mut UiTree, ElementId) + Send + 'static) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target, Box::new(write)));
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn drain(&self) -> Vec<(ElementId, PendingWrite)> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl fmt::Debug for FrameSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSync").field("pending", &self.len()).finish()
    }
}
