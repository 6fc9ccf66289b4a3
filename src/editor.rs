use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::debounce::Debouncer;
use crate::state::{EffectParams, ParamField, ViewMode};

struct Inner {
    params: EffectParams,
    /// Last parameters actually forwarded to the preview.
    settled: EffectParams,
    disabled: bool,
}

/// Effect parameter controls. Edits update the shown values immediately and
/// reach the preview through the debouncer once they settle.
#[derive(Clone)]
pub struct EffectControls {
    inner: Arc<Mutex<Inner>>,
    debouncer: Debouncer<EffectParams>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EffectControls {
    /// Controls start disabled, matching the preview's initial `Original`
    /// view mode.
    pub fn new(
        runtime: Handle,
        window: Duration,
        initial: EffectParams,
        on_change: impl Fn(EffectParams) + Send + Sync + 'static,
    ) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            params: initial,
            settled: initial,
            disabled: true,
        }));
        let settled = Arc::clone(&inner);
        let debouncer = Debouncer::new(runtime, window, move |params: EffectParams| {
            lock(&settled).settled = params;
            on_change(params);
        });
        debouncer.set_enabled(false);
        Self { inner, debouncer }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    pub fn params(&self) -> EffectParams {
        self.lock().params
    }

    pub fn is_disabled(&self) -> bool {
        self.lock().disabled
    }

    /// Hook for the preview's view-mode signal. Disabling drops any edit
    /// still waiting in the debouncer and shows the settled values again.
    pub fn set_view_mode(&self, mode: ViewMode) {
        let disabled = mode == ViewMode::Original;
        // Once the debouncer is disabled no pending edit can still settle.
        self.debouncer.set_enabled(!disabled);
        let mut inner = self.lock();
        inner.disabled = disabled;
        if disabled {
            inner.params = inner.settled;
        }
    }

    /// Applies one slider edit, clamped to the field's range. Ignored while
    /// disabled or when `value` is not finite.
    pub fn request(&self, field: ParamField, value: f32) {
        if !value.is_finite() {
            return;
        }
        let params = {
            let mut inner = self.lock();
            if inner.disabled {
                return;
            }
            let range = field.range();
            inner.params = inner
                .params
                .with(field, value.clamp(*range.start(), *range.end()));
            inner.params
        };
        self.debouncer.on_request(params);
    }

    /// Slider range for `field`; pinned to the current value while disabled.
    pub fn slider_range(&self, field: ParamField) -> RangeInclusive<f32> {
        let inner = self.lock();
        if inner.disabled {
            let v = inner.params.get(field);
            v..=v
        } else {
            field.range()
        }
    }

    pub fn label(&self, field: ParamField) -> String {
        let v = self.lock().params.get(field);
        match field {
            ParamField::Hue => format!("Hue: {}°", v as i32),
            ParamField::Saturation => format!("Saturation: {:.2}x", v),
            ParamField::Value => format!("Value: {:.2}x", v),
            ParamField::Sharpness => format!("Sharpness: {:.2}x", v),
        }
    }
}
