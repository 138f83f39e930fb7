use crate::{
    animation::clip::{Animation, DEFAULT_FPS},
    animation::track::{InterpolationMode, Keyframe, Track},
    animation::value::{KeyValue, ValueKind},
    foundation::error::{AnimError, AnimResult},
    foundation::math::approx_eq,
};

/// Settings applied when an [`AnimationBuilder`] produces an [`Animation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildOptions {
    /// Frame rate key times are snapped to. Values below 1 are raised to 1.
    pub fps: f64,
    /// Explicit length in seconds; derived from the last key when `None`.
    pub length: Option<f64>,
    pub looped: bool,
    /// Passes a looped animation plays before stopping; 0 loops forever.
    pub loop_count: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            length: None,
            looped: false,
            loop_count: 0,
        }
    }
}

impl BuildOptions {
    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn loop_count(mut self, loop_count: u32) -> Self {
        self.loop_count = loop_count;
        self
    }
}

/// Collects tracks and keys, then snaps them to a frame rate in [`AnimationBuilder::build`].
///
/// The builder can be reused: building does not consume or reset it.
#[derive(Debug, Default)]
pub struct AnimationBuilder {
    tracks: Vec<Track>,
}

impl AnimationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or continue) editing the track called `name`.
    ///
    /// Names are matched ignoring ASCII case. Reopening a track with a different kind is a
    /// [`AnimError::TypeMismatch`].
    pub fn edit(&mut self, name: &str, kind: ValueKind) -> AnimResult<TrackBuilder<'_>> {
        if name.trim().is_empty() {
            return Err(AnimError::validation("track name must be non-empty"));
        }

        let idx = match self.position(name) {
            Some(idx) => {
                let existing = self.tracks[idx].kind();
                if existing != kind {
                    return Err(AnimError::type_mismatch(name, existing, kind));
                }
                idx
            }
            None => {
                self.tracks.push(Track::new(name, kind));
                self.tracks.len() - 1
            }
        };

        Ok(TrackBuilder {
            track: &mut self.tracks[idx],
        })
    }

    pub fn delete(&mut self, name: &str) -> AnimResult<&mut Self> {
        let idx = self
            .position(name)
            .ok_or_else(|| AnimError::track_not_found(name))?;
        self.tracks.remove(idx);
        Ok(self)
    }

    pub fn clear(&mut self) -> &mut Self {
        self.tracks.clear();
        self
    }

    /// Replace the builder contents with a copy of `animation`'s tracks.
    pub fn reset_to(&mut self, animation: &Animation) -> &mut Self {
        self.clear();
        self.tracks
            .extend(animation.tracks().iter().map(Track::detached));
        self
    }

    pub fn track_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tracks.iter().map(Track::name)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Produce an animation with key times snapped to `options.fps`.
    ///
    /// Without an explicit length the animation lasts until one frame after the latest key.
    /// Any length shorter than a single frame is raised to one frame.
    pub fn build(&self, name: &str, options: BuildOptions) -> AnimResult<Animation> {
        if name.trim().is_empty() {
            return Err(AnimError::validation("animation name must be non-empty"));
        }
        if !options.fps.is_finite() {
            return Err(AnimError::validation(format!(
                "fps must be finite (got {})",
                options.fps
            )));
        }

        let fps = options.fps.max(1.0);
        let frame = 1.0 / fps;
        let snap = |time: f64| {
            let snapped = (time * fps).round() / fps;
            if approx_eq(time, snapped) {
                time
            } else {
                snapped
            }
        };

        let mut tracks = Vec::with_capacity(self.tracks.len());
        let mut last_key = 0.0f64;
        for draft in &self.tracks {
            let mut track = Track::new(draft.name(), draft.kind());
            track.set_interpolation(draft.interpolation());
            track.set_enabled(draft.enabled());
            for key in draft.keys() {
                let time = snap(key.time);
                last_key = last_key.max(time);
                track.add_key(Keyframe {
                    time,
                    value: key.value,
                })?;
            }
            track.clear_dirty();
            tracks.push(track);
        }

        let length = match options.length {
            Some(length) if length.is_finite() => length,
            Some(length) => {
                return Err(AnimError::validation(format!(
                    "length must be finite (got {length})"
                )));
            }
            None => last_key + frame,
        }
        .max(frame);

        tracing::debug!(
            animation = name,
            fps,
            length,
            tracks = tracks.len(),
            "built animation"
        );

        let mut anim = Animation::from_parts(name.to_string(), length, options.looped, tracks)?;
        anim.set_fps(fps);
        anim.set_loop_count(options.loop_count);
        Ok(anim)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tracks
            .iter()
            .position(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// Edits one track of an [`AnimationBuilder`].
#[derive(Debug)]
pub struct TrackBuilder<'a> {
    track: &'a mut Track,
}

impl TrackBuilder<'_> {
    /// Add a key, replacing any key already within epsilon of `time`.
    pub fn set_key(&mut self, time: f64, value: impl Into<KeyValue>) -> AnimResult<&mut Self> {
        self.track.add_key(Keyframe::new(time, value))?;
        Ok(self)
    }

    pub fn set_keys<I, V>(&mut self, keys: I) -> AnimResult<&mut Self>
    where
        I: IntoIterator<Item = (f64, V)>,
        V: Into<KeyValue>,
    {
        for (time, value) in keys {
            self.set_key(time, value)?;
        }
        Ok(self)
    }

    pub fn remove_key(&mut self, time: f64) -> AnimResult<&mut Self> {
        self.track.remove_at_time(time)?;
        Ok(self)
    }

    pub fn set_interpolation(&mut self, mode: InterpolationMode) -> &mut Self {
        self.track.set_interpolation(mode);
        self
    }

    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.track.set_enabled(enabled);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.track.clear_all();
        self
    }

    pub fn key_count(&self) -> usize {
        self.track.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/builder.rs"]
mod tests;
