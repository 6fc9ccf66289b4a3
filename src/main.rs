use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tokio::runtime::Handle;
use tracing::{info, warn};

use desi::config::AppConfig;
use desi::editor::EffectControls;
use desi::processing::downscale::PreviewQuality;
use desi::scan;
use desi::state::{ParamField, ViewMode};
use desi::viewer::PreviewEngine;
use desi::worker::Dispatcher;

const QUALITY_ENV: &str = "DESI_PREVIEW_QUALITY";
const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

fn resolve_preview_quality(config: &AppConfig) -> PreviewQuality {
    if let Ok(raw) = std::env::var(QUALITY_ENV) {
        return PreviewQuality::parse(&raw);
    }
    if let Some(raw) = config.preview_quality.as_deref() {
        return PreviewQuality::parse(raw);
    }
    PreviewQuality::default()
}

/// Positional `hue sat val sharp` values; missing trailing ones keep their
/// defaults.
fn parse_edits(args: &[String]) -> Result<Vec<(ParamField, f32)>> {
    if args.len() > ParamField::ALL.len() {
        bail!("expected at most {} effect values", ParamField::ALL.len());
    }
    ParamField::ALL
        .iter()
        .zip(args)
        .map(|(&field, raw)| {
            let value = raw
                .parse::<f32>()
                .with_context(|| format!("invalid {:?} value {:?}", field, raw))?;
            if !value.is_finite() {
                bail!("{:?} value must be finite, got {:?}", field, raw);
            }
            Ok((field, value))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (dir, rest) = match args.split_first() {
        Some((dir, rest)) => (PathBuf::from(dir), rest),
        None => (
            config
                .browse_path
                .clone()
                .context("usage: desi <image-dir> [hue sat val sharp]")?,
            &args[..],
        ),
    };
    let edits = parse_edits(rest)?;

    let images = scan::list_images(&dir);
    if images.is_empty() {
        bail!("No image files found in {}", dir.display());
    }
    let quality = resolve_preview_quality(&config);
    info!(dir = %dir.display(), count = images.len(), ?quality, "previewing directory");

    let mut engine = PreviewEngine::new(images, Dispatcher::current(), quality);
    let sink = engine.params_sink();
    let controls = EffectControls::new(
        Handle::current(),
        config.debounce_window(),
        engine.params(),
        move |params| sink.send(params),
    );
    let listener = controls.clone();
    engine.on_view_mode_change(move |mode| listener.set_view_mode(mode));

    engine.set_view_mode(ViewMode::Effectable);
    for (field, value) in edits {
        controls.request(field, value);
    }
    let target = controls.params();

    loop {
        let started = Instant::now();
        tokio::time::timeout(IMAGE_TIMEOUT, async {
            while engine.params() != target || engine.is_busy() {
                engine.next_event().await;
            }
        })
        .await
        .context("preview did not settle")?;

        let state = engine.state();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let name = engine.display().label;
        match &state.error {
            Some(error) => warn!(index = state.index, %name, %error, "preview failed"),
            None => info!(
                index = state.index,
                %name,
                raw_bytes = state.raw.as_ref().map_or(0, |b| b.len()),
                effected_bytes = state.effected.as_ref().map_or(0, |b| b.len()),
                elapsed_ms,
                "preview ready"
            ),
        }

        if !engine.next() {
            break;
        }
    }

    Ok(())
}
