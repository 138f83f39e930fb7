use std::fmt;

use crate::{
    animation::value::{KeyValue, ValueKind},
    foundation::error::{AnimError, AnimResult},
    foundation::math::{approx_cmp, approx_eq, wrap_time},
};

/// Callback that receives a track's interpolated value.
///
/// Stands in for binding a track to a property of a renderable: whatever owns the property
/// captures it (usually behind a lock or channel) and writes the value through.
pub type PropertySink = Box<dyn FnMut(&KeyValue) + Send + Sync>;

/// Timing supplied by the owning animation for bracket queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// Total animation duration. Requested times beyond it wrap back by whole periods.
    pub length: f64,
    /// Whether the last key connects back to the first one.
    pub looped: bool,
}

impl Timing {
    pub fn new(length: f64, looped: bool) -> Self {
        Self { length, looped }
    }
}

/// How values between two keys are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Hold the previous key's value until the next key.
    None,
    #[default]
    Linear,
    /// Catmull-Rom spline through the neighbouring keys.
    Spline,
}

/// One control point of an animated property.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: KeyValue,
}

impl Keyframe {
    pub fn new(time: f64, value: impl Into<KeyValue>) -> Self {
        Self {
            time,
            value: value.into(),
        }
    }
}

/// Result of [`Track::find_nearest`]: the two keys bracketing a time and how far between them
/// the time lies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestKeys {
    /// Requested time after wraparound.
    pub time: f64,
    pub previous: Keyframe,
    pub previous_index: usize,
    pub next: Keyframe,
    pub next_index: usize,
    /// Interpolation fraction from `previous` toward `next`; never negative.
    pub delta: f64,
}

/// Time-ordered keyframes for a single animated property.
#[derive(serde::Serialize)]
pub struct Track {
    name: String,
    kind: ValueKind,
    interpolation: InterpolationMode,
    enabled: bool,
    keys: Vec<Keyframe>, // sorted by time, > epsilon apart
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    sink: Option<PropertySink>,
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("interpolation", &self.interpolation)
            .field("enabled", &self.enabled)
            .field("keys", &self.keys)
            .field("dirty", &self.dirty)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Track {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            interpolation: InterpolationMode::default(),
            enabled: true,
            keys: Vec::new(),
            dirty: false,
            sink: None,
        }
    }

    /// Create a track that pushes every applied value into `sink`.
    pub fn with_sink(
        name: impl Into<String>,
        kind: ValueKind,
        sink: impl FnMut(&KeyValue) + Send + Sync + 'static,
    ) -> Self {
        let mut track = Self::new(name, kind);
        track.sink = Some(Box::new(sink));
        track
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, mode: InterpolationMode) {
        if self.interpolation != mode {
            self.interpolation = mode;
            self.dirty = true;
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.dirty = true;
        }
    }

    pub fn set_sink(&mut self, sink: impl FnMut(&KeyValue) + Send + Sync + 'static) {
        self.sink = Some(Box::new(sink));
        self.dirty = true;
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// `true` after any mutation until [`Track::clear_dirty`] is called.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Copy of the keys and settings, without the sink and with a clean dirty flag.
    pub(crate) fn detached(&self) -> Track {
        Track {
            name: self.name.clone(),
            kind: self.kind,
            interpolation: self.interpolation,
            enabled: self.enabled,
            keys: self.keys.clone(),
            dirty: false,
            sink: None,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in ascending time order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Keyframe> + Clone + '_ {
        self.keys.iter()
    }

    pub fn key(&self, index: usize) -> AnimResult<&Keyframe> {
        self.keys.get(index).ok_or(AnimError::IndexOutOfRange {
            index,
            len: self.keys.len(),
        })
    }

    pub fn first_key(&self) -> Option<&Keyframe> {
        self.keys.first()
    }

    pub fn last_key(&self) -> Option<&Keyframe> {
        self.keys.last()
    }

    /// Insert `key`, or overwrite the value of the key already within epsilon of its time.
    ///
    /// An overwritten key keeps its stored time so neighbours stay more than epsilon apart.
    pub fn add_key(&mut self, key: Keyframe) -> AnimResult<()> {
        if key.value.kind() != self.kind {
            return Err(AnimError::type_mismatch(
                &self.name,
                self.kind,
                key.value.kind(),
            ));
        }
        if !key.time.is_finite() || key.time < 0.0 {
            return Err(AnimError::validation(format!(
                "key time must be finite and >= 0 (got {}) on '{}'",
                key.time, self.name
            )));
        }

        if let Some(idx) = self.upsert(key) {
            tracing::trace!(track = %self.name, time = key.time, idx, "replaced key");
        }
        self.dirty = true;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> AnimResult<Keyframe> {
        if index >= self.keys.len() {
            return Err(AnimError::IndexOutOfRange {
                index,
                len: self.keys.len(),
            });
        }
        let removed = self.keys.remove(index);
        self.dirty = true;
        Ok(removed)
    }

    pub fn remove_at_time(&mut self, time: f64) -> AnimResult<Keyframe> {
        let index = self.index_of(time).ok_or(AnimError::KeyNotFound { time })?;
        self.remove_at(index)
    }

    pub fn contains(&self, time: f64) -> bool {
        self.index_of(time).is_some()
    }

    pub fn index_of(&self, time: f64) -> Option<usize> {
        self.search(time).ok()
    }

    /// Key within epsilon of `time`, if any.
    pub fn key_at(&self, time: f64) -> Option<&Keyframe> {
        self.index_of(time).map(|idx| &self.keys[idx])
    }

    pub fn clear_all(&mut self) {
        self.keys.clear();
        self.dirty = true;
    }

    /// Multiply every key time by `factor`.
    ///
    /// Factors within epsilon of 1, non-positive or non-finite factors are ignored. Keys that end
    /// up within epsilon of each other collapse into one; the later key wins.
    pub fn scale_key_times(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 || approx_eq(factor, 1.0) {
            tracing::debug!(track = %self.name, factor, "ignoring key time scale");
            return;
        }

        let scaled: Vec<Keyframe> = self
            .keys
            .iter()
            .map(|k| Keyframe {
                time: k.time * factor,
                value: k.value,
            })
            .collect();

        self.keys.clear();
        for key in scaled {
            self.upsert(key);
        }
        tracing::debug!(track = %self.name, factor, keys = self.keys.len(), "scaled key times");
        self.dirty = true;
    }

    /// Find the keys bracketing `requested_time`.
    ///
    /// Times past `timing.length` wrap back by whole periods. Looped timing folds every time into
    /// `[0, length)`, negative ones included. Past the last key a looped track brackets `last -> first` across the loop point;
    /// a non-looped track clamps to the last key with a zero fraction. Before the first key both
    /// ends are the first key.
    pub fn find_nearest(&self, requested_time: f64, timing: Timing) -> AnimResult<NearestKeys> {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return Err(AnimError::empty_track(&self.name));
        };
        let count = self.keys.len();

        let time = wrap_time(requested_time, timing.length, timing.looped);

        // First key strictly after `time`.
        let idx = self.keys.partition_point(|k| k.time <= time);

        if idx == 0 {
            return Ok(NearestKeys {
                time,
                previous: *first,
                previous_index: 0,
                next: *first,
                next_index: 0,
                delta: 0.0,
            });
        }

        let previous_index = idx - 1;
        let previous = self.keys[previous_index];

        let (next, next_index, raw_delta) = if idx >= count {
            if timing.looped {
                (*first, 0, timing.length)
            } else {
                (*last, count - 1, last.time)
            }
        } else {
            let next = self.keys[idx];
            (next, idx, next.time)
        };

        let delta = if approx_eq(previous.time, raw_delta) {
            0.0
        } else {
            (time - previous.time) / (raw_delta - previous.time)
        };

        Ok(NearestKeys {
            time,
            previous,
            previous_index,
            next,
            next_index,
            delta: delta.max(0.0),
        })
    }

    /// Interpolated value at `time` using the track's [`InterpolationMode`].
    pub fn sample(&self, time: f64, timing: Timing) -> AnimResult<KeyValue> {
        let nearest = self.find_nearest(time, timing)?;
        self.interpolate(&nearest, timing)
    }

    /// Sample at `time` and push the value into the sink.
    ///
    /// Returns `Ok(false)` without sampling when the track is disabled or has no sink.
    pub fn apply(&mut self, time: f64, timing: Timing) -> AnimResult<bool> {
        if !self.enabled || self.sink.is_none() {
            return Ok(false);
        }
        let value = self.sample(time, timing)?;
        if let Some(sink) = self.sink.as_mut() {
            sink(&value);
        }
        Ok(true)
    }

    fn interpolate(&self, nearest: &NearestKeys, timing: Timing) -> AnimResult<KeyValue> {
        let a = &nearest.previous.value;
        let b = &nearest.next.value;
        let mismatch = || AnimError::type_mismatch(&self.name, a.kind(), b.kind());

        match self.interpolation {
            InterpolationMode::None => Ok(*a),
            InterpolationMode::Linear => a.lerp(b, nearest.delta).ok_or_else(mismatch),
            InterpolationMode::Spline => {
                let before = self.neighbour(nearest.previous_index, -1, timing.looped);
                let after = self.neighbour(nearest.next_index, 1, timing.looped);
                KeyValue::catmull_rom(&before.value, a, b, &after.value, nearest.delta)
                    .ok_or_else(mismatch)
            }
        }
    }

    /// Key `step` places from `index`, wrapping when looped and clamping otherwise.
    fn neighbour(&self, index: usize, step: isize, looped: bool) -> &Keyframe {
        let count = self.keys.len() as isize;
        let target = index as isize + step;
        let target = if looped {
            target.rem_euclid(count)
        } else {
            target.clamp(0, count - 1)
        };
        &self.keys[target as usize]
    }

    /// Sorted insert; returns the index when an existing key's value was overwritten instead.
    fn upsert(&mut self, key: Keyframe) -> Option<usize> {
        match self.search(key.time) {
            Ok(idx) => {
                self.keys[idx].value = key.value;
                Some(idx)
            }
            Err(idx) => {
                self.keys.insert(idx, key);
                None
            }
        }
    }

    fn search(&self, time: f64) -> Result<usize, usize> {
        self.keys.binary_search_by(|k| approx_cmp(k.time, time))
    }
}

/// On-disk shape of a track; decoding replays keys through [`Track::add_key`].
#[derive(serde::Deserialize)]
pub(crate) struct TrackDef {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    #[serde(default)]
    pub(crate) interpolation: InterpolationMode,
    #[serde(default = "default_enabled")]
    pub(crate) enabled: bool,
    #[serde(default)]
    pub(crate) keys: Vec<Keyframe>,
}

fn default_enabled() -> bool {
    true
}

impl TryFrom<TrackDef> for Track {
    type Error = AnimError;

    fn try_from(def: TrackDef) -> AnimResult<Self> {
        let mut track = Track::new(def.name, def.kind);
        track.interpolation = def.interpolation;
        track.enabled = def.enabled;
        for key in def.keys {
            track.add_key(key)?;
        }
        track.dirty = false;
        Ok(track)
    }
}

impl<'de> serde::Deserialize<'de> for Track {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let def = TrackDef::deserialize(deserializer)?;
        Track::try_from(def).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/track.rs"]
mod tests;
