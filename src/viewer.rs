use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Flow};
use crate::loader::{self, LoadStarted};
use crate::processing::downscale::PreviewQuality;
use crate::processing::transform;
use crate::state::{
    Bytes, EffectParams, PreviewState, StatePatch, Status, ViewMode, reduce,
};
use crate::worker::{Dispatcher, WorkerMessage};

const WAITING: &str = "Please wait....";
const EMPTY: &str = "No image yet";

/// Messages delivered to the engine's inbox by workers and the debouncer.
#[derive(Debug)]
pub enum EngineEvent {
    LoadStarted {
        ticket: u64,
        name: String,
    },
    Loaded {
        ticket: u64,
        result: Result<Bytes, EngineError>,
    },
    Effected {
        ticket: u64,
        result: Result<Bytes, EngineError>,
    },
    ParamsSettled(EffectParams),
}

/// Feeds settled parameters into a [`PreviewEngine`] from another task.
#[derive(Clone)]
pub struct ParamsSink(UnboundedSender<EngineEvent>);

impl ParamsSink {
    pub fn send(&self, params: EffectParams) {
        let _ = self.0.send(EngineEvent::ParamsSettled(params));
    }
}

struct InFlight {
    ticket: u64,
    index: usize,
    params: EffectParams,
    cancel: CancellationToken,
}

impl InFlight {
    fn abandon(self) {
        self.cancel.cancel();
    }
}

/// What the presentation layer should draw for the current slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Display<'a> {
    /// Raw or effected bytes, never both.
    pub bytes: Option<&'a [u8]>,
    pub label: String,
    /// Shown instead of the image when `bytes` is `None`.
    pub placeholder: Option<String>,
    /// Changes whenever the drawn image may change.
    pub key: String,
}

type ViewModeListener = Box<dyn Fn(ViewMode) + Send + Sync>;

/// Preview state machine for one selected image at a time.
///
/// All state lives here and is only mutated from the owning task; workers
/// report through the inbox, and their results are committed only while the
/// ticket they were started with is still current.
pub struct PreviewEngine {
    images: Vec<PathBuf>,
    state: PreviewState,
    /// Most recent settled parameters.
    params: EffectParams,
    quality: PreviewQuality,
    dispatcher: Dispatcher,
    tx: UnboundedSender<EngineEvent>,
    rx: UnboundedReceiver<EngineEvent>,
    next_ticket: u64,
    load: Option<InFlight>,
    effect: Option<InFlight>,
    /// Load already attempted for the current index; no automatic retry.
    load_attempted: bool,
    /// Parameters whose transform failed for the current raw bytes.
    effect_failed_for: Option<EffectParams>,
    listeners: Vec<ViewModeListener>,
}

impl PreviewEngine {
    pub fn new(images: Vec<PathBuf>, dispatcher: Dispatcher, quality: PreviewQuality) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut engine = Self {
            images,
            state: PreviewState::default(),
            params: EffectParams::default(),
            quality,
            dispatcher,
            tx,
            rx,
            next_ticket: 0,
            load: None,
            effect: None,
            load_attempted: false,
            effect_failed_for: None,
            listeners: Vec::new(),
        };
        engine.sync();
        engine
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn params(&self) -> EffectParams {
        self.params
    }

    pub fn is_busy(&self) -> bool {
        self.load.is_some() || self.effect.is_some()
    }

    pub fn params_sink(&self) -> ParamsSink {
        ParamsSink(self.tx.clone())
    }

    /// Registers a callback for every view-mode change.
    pub fn on_view_mode_change(&mut self, listener: impl Fn(ViewMode) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the image list, discarding the current slot and any work in
    /// flight.
    pub fn replace_images(&mut self, images: Vec<PathBuf>) {
        info!(count = images.len(), "image list replaced");
        self.abandon_all();
        let previous_mode = self.state.view_mode;
        self.images = images;
        self.state = PreviewState::default();
        self.load_attempted = false;
        self.effect_failed_for = None;
        if previous_mode != self.state.view_mode {
            self.notify_view_mode();
        }
        self.sync();
    }

    /// Steps back one image. Returns `false` at the first image.
    pub fn prev(&mut self) -> bool {
        let index = self.state.index;
        if index == 0 || index >= self.images.len() {
            return false;
        }
        self.select(index - 1);
        true
    }

    /// Steps forward one image. Returns `false` at the last image.
    pub fn next(&mut self) -> bool {
        let index = self.state.index;
        if index + 1 >= self.images.len() {
            return false;
        }
        self.select(index + 1);
        true
    }

    fn select(&mut self, index: usize) {
        debug!(from = self.state.index, to = index, "select image");
        self.abandon_all();
        self.load_attempted = false;
        self.effect_failed_for = None;
        self.apply(StatePatch::index(index));
        self.sync();
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.state.view_mode {
            return;
        }
        self.apply(StatePatch::view_mode(mode));
        self.notify_view_mode();
        self.sync();
    }

    pub fn toggle_view_mode(&mut self) {
        self.set_view_mode(self.state.view_mode.toggled());
    }

    /// Installs a new settled parameter set, invalidating the effected
    /// preview computed for the old one. Non-finite sets are ignored.
    pub fn apply_params(&mut self, params: EffectParams) {
        if !params.is_finite() {
            warn!(?params, "ignoring non-finite parameters");
            return;
        }
        if params == self.params {
            return;
        }
        debug!(?params, "parameters settled");
        self.params = params;
        if let Some(flight) = self.effect.take() {
            flight.abandon();
        }
        self.effect_failed_for = None;
        self.apply(StatePatch::effected(None));
        self.sync();
    }

    /// Handles every event already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Waits for the next event and handles it.
    pub async fn next_event(&mut self) {
        if let Some(event) = self.rx.recv().await {
            self.handle(event);
        }
    }

    /// Handles events until no load or transform is in flight.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            self.next_event().await;
        }
    }

    pub fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LoadStarted { ticket, name } => {
                if self.load_is_current(ticket) {
                    self.apply(StatePatch::name(name));
                }
            }
            EngineEvent::Loaded { ticket, result } => {
                if !self.load_is_current(ticket) {
                    debug!(ticket, "discarding stale load result");
                    return;
                }
                self.load = None;
                match result {
                    Ok(raw) => {
                        debug!(ticket, bytes = raw.len(), "image loaded");
                        self.effect_failed_for = None;
                        self.apply(StatePatch::raw_loaded(raw));
                    }
                    Err(err) => self.fail(Flow::Load, err),
                }
                self.sync();
            }
            EngineEvent::Effected { ticket, result } => {
                if !self.effect_is_current(ticket) {
                    debug!(ticket, "discarding stale effect result");
                    return;
                }
                self.effect = None;
                match result {
                    Ok(effected) => {
                        debug!(ticket, bytes = effected.len(), "effects applied");
                        self.apply(StatePatch::effected(Some(effected)).clear_error());
                    }
                    Err(err) => {
                        if !err.is_cancelled() {
                            self.effect_failed_for = Some(self.params);
                        }
                        self.fail(Flow::Effect, err);
                    }
                }
                self.sync();
            }
            EngineEvent::ParamsSettled(params) => self.apply_params(params),
        }
    }

    /// Bytes and labels for the presentation layer.
    pub fn display(&self) -> Display<'_> {
        let state = &self.state;
        let bytes = match state.view_mode {
            ViewMode::Original => state.raw.as_deref(),
            ViewMode::Effectable => state.effected.as_deref().or(state.raw.as_deref()),
        };
        let placeholder = match (bytes, &state.error) {
            (Some(_), _) => None,
            (None, Some(error)) => Some(error.clone()),
            (None, None) if state.status == Status::Loading => Some(WAITING.to_string()),
            (None, None) => Some(EMPTY.to_string()),
        };
        let mode = match state.view_mode {
            ViewMode::Original => "orig",
            ViewMode::Effectable => "fx",
        };
        let p = &self.params;
        Display {
            bytes,
            label: state.name.clone().unwrap_or_else(|| "-".to_string()),
            placeholder,
            key: format!(
                "{}:{}:{:.2}-{:.3}-{:.3}-{:.3}",
                state.name.as_deref().unwrap_or(""),
                mode,
                p.hue,
                p.sat,
                p.val,
                p.sharp
            ),
        }
    }

    fn load_is_current(&self, ticket: u64) -> bool {
        self.load
            .as_ref()
            .is_some_and(|flight| flight.ticket == ticket && flight.index == self.state.index)
    }

    fn effect_is_current(&self, ticket: u64) -> bool {
        self.effect.as_ref().is_some_and(|flight| {
            flight.ticket == ticket
                && flight.index == self.state.index
                && flight.params == self.params
        })
    }

    fn fail(&mut self, flow: Flow, err: EngineError) {
        match err.user_message(flow) {
            Some(message) => {
                warn!(?flow, index = self.state.index, error = %err, "preview worker failed");
                self.apply(StatePatch::error(message));
            }
            None => debug!(?flow, index = self.state.index, "preview worker cancelled"),
        }
    }

    /// Starts whichever flow the current state calls for.
    fn sync(&mut self) {
        let Some(path) = self.images.get(self.state.index).cloned() else {
            self.refresh_status();
            return;
        };

        if self.state.raw.is_none() && self.load.is_none() && !self.load_attempted {
            self.start_load(path);
        }

        if self.state.view_mode == ViewMode::Effectable
            && self.effect.is_none()
            && self.state.effected.is_none()
            && self.effect_failed_for != Some(self.params)
        {
            if let Some(raw) = self.state.raw.clone() {
                self.start_effect(raw);
            }
        }

        self.refresh_status();
    }

    fn take_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn start_load(&mut self, path: PathBuf) {
        let ticket = self.take_ticket();
        debug!(ticket, index = self.state.index, path = %path.display(), "load started");
        self.load_attempted = true;

        let call = self.dispatcher.run(move |sink| {
            loader::load(&path, |started| sink.emit(started))
        });
        self.load = Some(InFlight {
            ticket,
            index: self.state.index,
            params: self.params,
            cancel: call.cancellation(),
        });

        let tx = self.tx.clone();
        self.dispatcher.spawn(async move {
            let mut call = call;
            while let Some(message) = call.next().await {
                let event = match message {
                    WorkerMessage::Progress(LoadStarted { name }) => {
                        EngineEvent::LoadStarted { ticket, name }
                    }
                    WorkerMessage::Finished(result) => EngineEvent::Loaded {
                        ticket,
                        result: result.map(Arc::from),
                    },
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
    }

    fn start_effect(&mut self, raw: Bytes) {
        let ticket = self.take_ticket();
        let params = self.params;
        let quality = self.quality;
        debug!(ticket, index = self.state.index, ?params, ?quality, "effect started");

        let call = self.dispatcher.run::<Infallible, _, _>(move |sink| {
            transform::render_preview(&raw, &params, quality, || sink.checkpoint())
        });
        self.effect = Some(InFlight {
            ticket,
            index: self.state.index,
            params,
            cancel: call.cancellation(),
        });

        let tx = self.tx.clone();
        self.dispatcher.spawn(async move {
            let result = call.finish(|never| match never {}).await;
            let _ = tx.send(EngineEvent::Effected {
                ticket,
                result: result.map(Arc::from),
            });
        });
    }

    fn abandon_all(&mut self) {
        if let Some(flight) = self.load.take() {
            flight.abandon();
        }
        if let Some(flight) = self.effect.take() {
            flight.abandon();
        }
    }

    fn refresh_status(&mut self) {
        let status = if self.is_busy() {
            Status::Loading
        } else {
            Status::Idle
        };
        if status != self.state.status {
            self.apply(StatePatch::status(status));
        }
    }

    fn apply(&mut self, patch: StatePatch) {
        self.state = reduce(std::mem::take(&mut self.state), patch);
    }

    fn notify_view_mode(&self) {
        let mode = self.state.view_mode;
        debug!(%mode, "view mode changed");
        for listener in &self.listeners {
            listener(mode);
        }
    }
}

impl Drop for PreviewEngine {
    fn drop(&mut self) {
        self.abandon_all();
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;
    use tokio::runtime::Handle;
    use tokio::time::timeout;

    use crate::codec;
    use crate::debounce::DEFAULT_WINDOW;
    use crate::editor::EffectControls;
    use crate::processing::downscale::PreviewQuality;
    use crate::state::{EffectParams, ParamField, Status, ViewMode};
    use crate::worker::Dispatcher;

    use super::{EngineEvent, PreviewEngine};

    const WAIT: Duration = Duration::from_secs(10);

    fn fixture(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        ImageBuffer::from_fn(w, h, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 128u8]))
            .save(&path)
            .unwrap();
        path
    }

    fn two_images() -> (TempDir, Vec<PathBuf>) {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![
            fixture(dir.path(), "a.png", 8, 8),
            fixture(dir.path(), "b.png", 10, 6),
        ];
        (dir, images)
    }

    fn engine(images: Vec<PathBuf>) -> PreviewEngine {
        PreviewEngine::new(images, Dispatcher::current(), PreviewQuality::Fast)
    }

    async fn settle(engine: &mut PreviewEngine) {
        timeout(WAIT, engine.settle()).await.expect("engine settled");
    }

    fn effected_dims(engine: &PreviewEngine) -> (u32, u32) {
        let bytes = engine.state().effected.as_deref().expect("effected");
        codec::decode(bytes).unwrap().dimensions()
    }

    #[tokio::test]
    async fn pagination_is_bounded() {
        let images = vec!["/x/1.png", "/x/2.png", "/x/3.png"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let mut engine = engine(images);

        assert!(!engine.prev());
        assert_eq!(engine.state().index, 0);
        assert!(engine.next());
        assert!(engine.next());
        assert!(!engine.next());
        assert_eq!(engine.state().index, 2);
        assert!(engine.prev());
        assert!(engine.prev());
        assert!(!engine.prev());
        assert_eq!(engine.state().index, 0);
    }

    #[tokio::test]
    async fn load_reports_name_and_raw_bytes() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        assert_eq!(engine.state().status, Status::Loading);
        assert_eq!(engine.display().placeholder.as_deref(), Some("Please wait...."));

        settle(&mut engine).await;
        let state = engine.state();
        assert_eq!(state.name.as_deref(), Some("a.png"));
        assert_eq!(state.status, Status::Idle);
        assert!(state.error.is_none());
        assert!(state.effected.is_none());
        let raw = state.raw.as_deref().expect("raw");
        assert_eq!(codec::decode(raw).unwrap().dimensions(), (8, 8));

        let display = engine.display();
        assert_eq!(display.bytes, Some(raw));
        assert_eq!(display.label, "a.png");
        assert!(display.placeholder.is_none());
    }

    #[tokio::test]
    async fn identity_params_produce_effected_equal_to_raw() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;

        let state = engine.state();
        let raw = state.raw.as_deref().expect("raw");
        let effected = state.effected.as_deref().expect("effected");
        assert_eq!(effected, raw);
        assert_eq!(codec::decode(effected).unwrap(), codec::decode(raw).unwrap());
        assert_eq!(engine.display().bytes, Some(effected));
    }

    #[tokio::test]
    async fn unreadable_path_surfaces_error_and_allows_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![
            dir.path().join("missing.png"),
            fixture(dir.path(), "ok.png", 4, 4),
        ];
        let mut engine = engine(images);
        settle(&mut engine).await;

        assert_eq!(engine.state().error.as_deref(), Some("Failed to load Image"));
        assert!(engine.state().raw.is_none());
        assert_eq!(engine.state().name.as_deref(), Some("missing.png"));
        assert_eq!(
            engine.display().placeholder.as_deref(),
            Some("Failed to load Image")
        );
        assert!(!engine.is_busy(), "failed load is not retried");

        assert!(engine.next());
        assert!(engine.state().error.is_none());
        settle(&mut engine).await;
        assert!(engine.state().raw.is_some());
        assert_eq!(engine.state().name.as_deref(), Some("ok.png"));
    }

    #[tokio::test]
    async fn index_change_clears_bytes_before_new_load() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;
        assert!(engine.state().effected.is_some());

        assert!(engine.next());
        let state = engine.state();
        assert!(state.raw.is_none());
        assert!(state.effected.is_none());
        assert!(state.name.is_none());
        assert_eq!(state.status, Status::Loading);
        assert!(engine.display().bytes.is_none());

        settle(&mut engine).await;
        assert_eq!(engine.state().name.as_deref(), Some("b.png"));
        assert_eq!(effected_dims(&engine), (10, 6));
    }

    #[tokio::test]
    async fn stale_effect_is_never_shown_under_next_image() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);

        // Wait for a.png's raw bytes; its transform is now in flight.
        timeout(WAIT, async {
            while engine.state().raw.is_none() {
                engine.next_event().await;
            }
        })
        .await
        .expect("raw loaded");
        assert!(engine.is_busy());

        assert!(engine.next());
        settle(&mut engine).await;
        // Give the superseded transform time to report and be discarded.
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.pump();

        assert_eq!(engine.state().name.as_deref(), Some("b.png"));
        assert_eq!(effected_dims(&engine), (10, 6));
    }

    #[tokio::test]
    async fn parameter_change_invalidates_effected() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;

        engine.apply_params(EffectParams {
            val: 0.0,
            ..Default::default()
        });
        assert!(engine.state().effected.is_none());
        assert_eq!(engine.state().status, Status::Loading);
        // Raw stands in while the new preview computes.
        assert_eq!(engine.display().bytes, engine.state().raw.as_deref());

        settle(&mut engine).await;
        let effected = codec::decode(engine.state().effected.as_deref().unwrap()).unwrap();
        assert!(effected.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[tokio::test]
    async fn equal_params_keep_cached_preview() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;

        engine.apply_params(EffectParams::default());
        assert!(engine.state().effected.is_some());
        assert!(!engine.is_busy());
    }

    #[tokio::test]
    async fn toggling_back_reuses_cached_preview() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;
        let cached = engine.state().effected.clone().expect("effected");

        engine.toggle_view_mode();
        assert_eq!(engine.state().view_mode, ViewMode::Original);
        assert_eq!(engine.display().bytes, engine.state().raw.as_deref());
        assert!(engine.display().key.contains(":orig:"));

        engine.toggle_view_mode();
        assert!(!engine.is_busy());
        let again = engine.state().effected.clone().expect("effected");
        assert!(Arc::ptr_eq(&cached, &again));
    }

    #[tokio::test]
    async fn view_mode_changes_are_signalled() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.on_view_mode_change(move |mode| sink.lock().unwrap().push(mode));

        engine.set_view_mode(ViewMode::Original);
        engine.set_view_mode(ViewMode::Effectable);
        engine.toggle_view_mode();
        assert_eq!(
            *seen.lock().unwrap(),
            [ViewMode::Effectable, ViewMode::Original]
        );
    }

    #[tokio::test]
    async fn transform_failure_falls_back_to_raw_without_retrying() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);

        // Commit undecodable bytes under the in-flight load's ticket; the real
        // load result then arrives stale and is discarded.
        let ticket = engine.load.as_ref().expect("load in flight").ticket;
        let junk: Arc<[u8]> = Arc::from(&b"junk"[..]);
        engine.handle(EngineEvent::Loaded {
            ticket,
            result: Ok(Arc::clone(&junk)),
        });
        assert!(engine.is_busy(), "transform started on the junk bytes");
        settle(&mut engine).await;

        let state = engine.state();
        assert_eq!(state.error.as_deref(), Some("Failed to apply effects (preview)"));
        assert!(state.effected.is_none());
        assert_eq!(state.raw.as_deref(), Some(&junk[..]));
        assert_eq!(engine.display().bytes, Some(&junk[..]));
        assert_eq!(engine.effect_failed_for, Some(EffectParams::default()));

        engine.toggle_view_mode();
        engine.toggle_view_mode();
        assert!(!engine.is_busy(), "same params are not retried");

        let dimmer = EffectParams {
            val: 0.5,
            ..Default::default()
        };
        engine.apply_params(dimmer);
        assert!(engine.is_busy(), "new params retry the transform");
        settle(&mut engine).await;
        assert_eq!(engine.effect_failed_for, Some(dimmer));
        assert!(engine.state().effected.is_none());
    }

    #[tokio::test]
    async fn non_finite_params_never_wedge_the_engine() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;

        engine.apply_params(EffectParams {
            hue: f32::NAN,
            ..Default::default()
        });
        assert_eq!(engine.params(), EffectParams::default());
        assert!(engine.state().effected.is_some());
        settle(&mut engine).await;
        assert_eq!(engine.state().status, Status::Idle);
    }

    #[tokio::test]
    async fn replacing_images_discards_slot() {
        let (dir, images) = two_images();
        let mut engine = engine(images);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.on_view_mode_change(move |mode| sink.lock().unwrap().push(mode));
        engine.set_view_mode(ViewMode::Effectable);
        engine.next();
        settle(&mut engine).await;

        let other = fixture(dir.path(), "c.png", 3, 3);
        engine.replace_images(vec![other]);
        assert_eq!(engine.state().index, 0);
        assert!(engine.state().raw.is_none());
        assert_eq!(engine.state().view_mode, ViewMode::Original);
        assert_eq!(seen.lock().unwrap().last(), Some(&ViewMode::Original));

        settle(&mut engine).await;
        assert_eq!(engine.state().name.as_deref(), Some("c.png"));
    }

    #[tokio::test]
    async fn empty_list_shows_placeholder() {
        let mut engine = engine(Vec::new());
        assert!(!engine.is_busy());
        assert!(!engine.next());
        assert!(!engine.prev());
        let display = engine.display();
        assert!(display.bytes.is_none());
        assert_eq!(display.label, "-");
        assert_eq!(display.placeholder.as_deref(), Some("No image yet"));
    }

    #[tokio::test]
    async fn debounced_controls_drive_the_preview() {
        let (_dir, images) = two_images();
        let mut engine = engine(images);
        let sink = engine.params_sink();
        let controls = EffectControls::new(
            Handle::current(),
            DEFAULT_WINDOW,
            engine.params(),
            move |params| sink.send(params),
        );
        let listener = controls.clone();
        engine.on_view_mode_change(move |mode| listener.set_view_mode(mode));

        controls.request(ParamField::Value, 0.0);
        assert_eq!(controls.params(), EffectParams::default());

        engine.set_view_mode(ViewMode::Effectable);
        settle(&mut engine).await;
        for v in [3.0, 2.0, 0.0] {
            controls.request(ParamField::Value, v);
        }

        timeout(WAIT, async {
            while engine.params().val != 0.0 {
                engine.next_event().await;
            }
        })
        .await
        .expect("params settled");
        settle(&mut engine).await;

        let effected = codec::decode(engine.state().effected.as_deref().unwrap()).unwrap();
        assert!(effected.pixels().all(|p| p.0 == [0, 0, 0]));
        assert!(engine.display().key.ends_with(":fx:0.00-1.000-0.000-1.000"));
    }
}
