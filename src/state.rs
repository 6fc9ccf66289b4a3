use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Encoded image bytes shared between the state record and worker snapshots.
pub type Bytes = Arc<[u8]>;

pub const HUE_RANGE: RangeInclusive<f32> = -180.0..=180.0;
pub const FACTOR_RANGE: RangeInclusive<f32> = 0.0..=4.0;

/// Effect parameters applied to the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Hue rotation in degrees.
    pub hue: f32,
    pub sat: f32,
    pub val: f32,
    pub sharp: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            hue: 0.0,
            sat: 1.0,
            val: 1.0,
            sharp: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    Hue,
    Saturation,
    Value,
    Sharpness,
}

impl ParamField {
    pub const ALL: [ParamField; 4] = [
        ParamField::Hue,
        ParamField::Saturation,
        ParamField::Value,
        ParamField::Sharpness,
    ];

    /// Range the controls accept for this field.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            ParamField::Hue => HUE_RANGE,
            _ => FACTOR_RANGE,
        }
    }
}

impl EffectParams {
    pub fn get(&self, field: ParamField) -> f32 {
        match field {
            ParamField::Hue => self.hue,
            ParamField::Saturation => self.sat,
            ParamField::Value => self.val,
            ParamField::Sharpness => self.sharp,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.hue, self.sat, self.val, self.sharp]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Returns a copy with one field replaced.
    pub fn with(mut self, field: ParamField, value: f32) -> Self {
        match field {
            ParamField::Hue => self.hue = value,
            ParamField::Saturation => self.sat = value,
            ParamField::Value => self.val = value,
            ParamField::Sharpness => self.sharp = value,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Original,
    Effectable,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Original => ViewMode::Effectable,
            ViewMode::Effectable => ViewMode::Original,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Original => f.write_str("original"),
            ViewMode::Effectable => f.write_str("effectable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
}

/// State of the currently selected image slot.
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    pub index: usize,
    pub raw: Option<Bytes>,
    pub effected: Option<Bytes>,
    pub name: Option<String>,
    pub status: Status,
    pub view_mode: ViewMode,
    pub error: Option<String>,
}

impl PreviewState {
    /// Effected bytes never outlive the raw bytes they were derived from.
    pub fn invariants_hold(&self) -> bool {
        self.raw.is_some() || self.effected.is_none()
    }
}

/// Partial update merged into a [`PreviewState`] by [`reduce`].
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub index: Option<usize>,
    pub raw: Option<Option<Bytes>>,
    pub effected: Option<Option<Bytes>>,
    pub name: Option<Option<String>>,
    pub status: Option<Status>,
    pub view_mode: Option<ViewMode>,
    pub error: Option<Option<String>>,
}

impl StatePatch {
    pub fn index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Default::default()
        }
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn view_mode(mode: ViewMode) -> Self {
        Self {
            view_mode: Some(mode),
            ..Default::default()
        }
    }

    pub fn name(name: String) -> Self {
        Self {
            name: Some(Some(name)),
            ..Default::default()
        }
    }

    pub fn raw_loaded(raw: Bytes) -> Self {
        Self {
            raw: Some(Some(raw)),
            effected: Some(None),
            error: Some(None),
            ..Default::default()
        }
    }

    pub fn effected(effected: Option<Bytes>) -> Self {
        Self {
            effected: Some(effected),
            ..Default::default()
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            error: Some(Some(message.to_string())),
            ..Default::default()
        }
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }
}

/// Merges `patch` into `state`.
///
/// An index change resets the slot first: raw, effected, name and error are
/// dropped together and the status returns to idle, so bytes from the
/// previous image can never survive into the new one. Fields set in the same
/// patch are applied on top of the reset.
pub fn reduce(state: PreviewState, patch: StatePatch) -> PreviewState {
    let mut next = state;

    if let Some(index) = patch.index {
        if index != next.index {
            next = PreviewState {
                index,
                view_mode: next.view_mode,
                ..Default::default()
            };
        }
    }
    if let Some(raw) = patch.raw {
        next.raw = raw;
    }
    if let Some(effected) = patch.effected {
        next.effected = effected;
    }
    if let Some(name) = patch.name {
        next.name = name;
    }
    if let Some(status) = patch.status {
        next.status = status;
    }
    if let Some(mode) = patch.view_mode {
        next.view_mode = mode;
    }
    if let Some(error) = patch.error {
        next.error = error;
    }

    if next.raw.is_none() {
        next.effected = None;
    }
    debug_assert!(next.invariants_hold());
    next
}
