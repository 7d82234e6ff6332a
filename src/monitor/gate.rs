//! Process-wide gate pausing, resuming and terminating every tailer
//!
//! The gate starts out `Running`. `stop` parks every tailer at its next
//! [`WaitHandle::wait`] until `start`; `exit` releases them for good and is
//! irreversible. A single handle can also be retired on its own, which
//! releases just that tailer.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Running,
    Stopped,
    Exited,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<Inner>,
    changed: Condvar,
}

#[derive(Debug)]
struct Inner {
    state: GateState,
    registered: usize,
    next_id: u64,
    retired: HashSet<u64>,
}

impl Inner {
    fn released(&self, id: u64) -> bool {
        self.state == GateState::Exited || self.retired.contains(&id)
    }
}

/// Cloneable handle to the shared gate.
#[derive(Debug, Clone)]
pub struct SyncMonitor {
    shared: Arc<Shared>,
}

impl Default for SyncMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMonitor {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    state: GateState::Running,
                    registered: 0,
                    next_id: 0,
                    retired: HashSet::new(),
                }),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn state(&self) -> GateState {
        self.lock().state
    }

    pub fn is_exited(&self) -> bool {
        self.state() == GateState::Exited
    }

    /// Resume parked tailers. Ignored once exited.
    pub fn start(&self) {
        self.transition(GateState::Running);
    }

    /// Park tailers at their next wait. Ignored once exited.
    pub fn stop(&self) {
        self.transition(GateState::Stopped);
    }

    /// Release every tailer permanently.
    pub fn exit(&self) {
        let mut inner = self.lock();
        inner.state = GateState::Exited;
        self.shared.changed.notify_all();
    }

    /// Create a wait handle for one tailer.
    pub fn register(&self) -> WaitHandle {
        let mut inner = self.lock();
        inner.registered += 1;
        let id = inner.next_id;
        inner.next_id += 1;
        WaitHandle {
            monitor: self.clone(),
            id,
        }
    }

    /// Release the handle with `id` permanently, leaving the others alone.
    pub fn retire(&self, id: u64) {
        let mut inner = self.lock();
        inner.retired.insert(id);
        self.shared.changed.notify_all();
    }

    /// Number of live wait handles.
    pub fn registered(&self) -> usize {
        self.lock().registered
    }

    fn transition(&self, next: GateState) {
        let mut inner = self.lock();
        if inner.state == GateState::Exited {
            return;
        }
        inner.state = next;
        self.shared.changed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding this lock cannot leave Inner half-updated,
        // so a poisoned lock is still usable.
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Per-tailer view of the gate.
#[derive(Debug)]
pub struct WaitHandle {
    monitor: SyncMonitor,
    id: u64,
}

impl WaitHandle {
    /// Identifier accepted by [`SyncMonitor::retire`].
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Block while the gate is stopped.
    ///
    /// Returns `true` when the caller may proceed and `false` once the gate
    /// has exited or this handle was retired.
    pub fn wait(&self) -> bool {
        let shared = &self.monitor.shared;
        let mut inner = self.monitor.lock();
        loop {
            if inner.released(self.id) {
                return false;
            }
            match inner.state {
                GateState::Running => return true,
                GateState::Exited => return false,
                GateState::Stopped => {
                    inner = shared
                        .changed
                        .wait(inner)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
    }

    /// Sleep for up to `duration`, waking early on exit.
    ///
    /// Returns `false` if the gate exited or this handle was retired before
    /// or during the pause.
    pub fn pause(&self, duration: Duration) -> bool {
        let shared = &self.monitor.shared;
        let deadline = Instant::now() + duration;
        let mut inner = self.monitor.lock();
        loop {
            if inner.released(self.id) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            inner = shared
                .changed
                .wait_timeout(inner, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }
}

impl Drop for WaitHandle {
    fn drop(&mut self) {
        let mut inner = self.monitor.lock();
        inner.registered = inner.registered.saturating_sub(1);
        inner.retired.remove(&self.id);
    }
}
