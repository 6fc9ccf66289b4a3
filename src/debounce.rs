use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(150);

struct Slot {
    /// Bumped on every request and cancel; a timer only fires if it still
    /// holds the current generation.
    generation: u64,
    enabled: bool,
    timer: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Collapses bursts of requests into one call of `on_change` carrying the
/// last payload, issued once the window passes without a newer request.
///
/// `on_change` runs while the internal lock is held, which is what makes
/// [`Debouncer::cancel`] final: once it returns, a superseded payload can no
/// longer be delivered. The callback must not call back into the debouncer.
pub struct Debouncer<T> {
    slot: Arc<Mutex<Slot>>,
    window: Duration,
    runtime: Handle,
    on_change: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            window: self.window,
            runtime: self.runtime.clone(),
            on_change: Arc::clone(&self.on_change),
        }
    }
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(
        runtime: Handle,
        window: Duration,
        on_change: impl Fn(T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                enabled: true,
                timer: None,
            })),
            window,
            runtime,
            on_change: Arc::new(on_change),
        }
    }

    /// Replaces any pending emission with `payload`. A no-op while disabled.
    pub fn on_request(&self, payload: T) {
        let mut slot = lock(&self.slot);
        if !slot.enabled {
            return;
        }
        slot.cancel();
        let generation = slot.generation;

        let shared = Arc::clone(&self.slot);
        let on_change = Arc::clone(&self.on_change);
        let window = self.window;
        slot.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            let mut slot = lock(&shared);
            if slot.generation != generation || !slot.enabled {
                trace!(generation, "debounced emission superseded");
                return;
            }
            slot.timer = None;
            on_change(payload);
        }));
    }

    /// Drops the pending emission, if any.
    pub fn cancel(&self) {
        lock(&self.slot).cancel();
    }

    /// Disabling also drops the pending emission.
    pub fn set_enabled(&self, enabled: bool) {
        let mut slot = lock(&self.slot);
        slot.enabled = enabled;
        if !enabled {
            slot.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).timer.is_some()
    }
}
