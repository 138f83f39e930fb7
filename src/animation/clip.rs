use crate::{
    animation::track::{Timing, Track},
    animation::value::KeyValue,
    foundation::error::{AnimError, AnimResult},
    foundation::math::{approx_eq, wrap_time},
};

/// A named set of tracks sharing one length, loop flag and playhead.
///
/// Track names are unique ignoring ASCII case. The animation hands its [`Timing`] to every track
/// query, so tracks never need to point back at their owner.
#[derive(Debug)]
pub struct Animation {
    name: String,
    length: f64,
    looped: bool,
    fps: f64,
    loop_count: u32,
    tracks: Vec<Track>,
    state: Playback,
}

/// Frame rate of an animation that was not built with an explicit one.
pub const DEFAULT_FPS: f64 = 60.0;

#[derive(Clone, Copy, Debug)]
struct Playback {
    enabled: bool,
    stopped: bool,
    current_time: f64,
    loops_done: u32,
    last_applied: Option<f64>,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            enabled: true,
            stopped: false,
            current_time: 0.0,
            loops_done: 0,
            last_applied: None,
        }
    }
}

impl Animation {
    /// Create an empty animation.
    ///
    /// A non-positive or non-finite `length` means the animation never ends.
    pub fn new(name: impl Into<String>, length: f64) -> AnimResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AnimError::validation("animation name must be non-empty"));
        }
        Ok(Self {
            name,
            length: normalize_length(length),
            looped: false,
            fps: DEFAULT_FPS,
            loop_count: 0,
            tracks: Vec::new(),
            state: Playback::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// `false` when the animation was created without a usable length.
    pub fn is_bounded(&self) -> bool {
        self.length < f64::MAX
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = normalize_length(length);
        self.state.last_applied = None;
    }

    pub fn looped(&self) -> bool {
        self.looped
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
        self.state.last_applied = None;
    }

    pub fn with_looped(mut self, looped: bool) -> Self {
        self.set_looped(looped);
        self
    }

    /// Frame rate the key times were authored against.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Values below 1 are raised to 1; non-finite values are ignored.
    pub fn set_fps(&mut self, fps: f64) {
        if !fps.is_finite() {
            tracing::debug!(animation = %self.name, fps, "ignoring non-finite fps");
            return;
        }
        self.fps = fps.max(1.0);
    }

    /// Number of times a looped animation plays before stopping; 0 loops forever.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn set_loop_count(&mut self, loop_count: u32) {
        self.loop_count = loop_count;
    }

    pub fn with_loop_count(mut self, loop_count: u32) -> Self {
        self.set_loop_count(loop_count);
        self
    }

    /// Completed passes through a looped animation since the last [`Animation::reset`].
    pub fn loops_done(&self) -> u32 {
        self.state.loops_done
    }

    pub fn timing(&self) -> Timing {
        Timing::new(self.length, self.looped)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tracks.iter().map(Track::name)
    }

    pub fn add_track(&mut self, mut track: Track) -> AnimResult<()> {
        if track.name().trim().is_empty() {
            return Err(AnimError::validation("track name must be non-empty"));
        }
        if self.position(track.name()).is_some() {
            return Err(AnimError::validation(format!(
                "animation '{}' already has a track named '{}'",
                self.name,
                track.name()
            )));
        }
        track.mark_dirty();
        self.tracks.push(track);
        Ok(())
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.position(name).map(|idx| &self.tracks[idx])
    }

    pub fn track_mut(&mut self, name: &str) -> Option<&mut Track> {
        self.position(name).map(|idx| &mut self.tracks[idx])
    }

    pub fn remove_track(&mut self, name: &str) -> AnimResult<Track> {
        let idx = self
            .position(name)
            .ok_or_else(|| AnimError::track_not_found(name))?;
        Ok(self.tracks.remove(idx))
    }

    /// Value of one track at an arbitrary time, ignoring the playhead.
    pub fn sample(&self, track: &str, time: f64) -> AnimResult<KeyValue> {
        let track = self
            .track(track)
            .ok_or_else(|| AnimError::track_not_found(track))?;
        track.sample(time, self.timing())
    }

    /// Scale every key time and the length by `factor`.
    ///
    /// Ignored under the same conditions as [`Track::scale_key_times`].
    pub fn scale_time(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 || approx_eq(factor, 1.0) {
            tracing::debug!(animation = %self.name, factor, "ignoring time scale");
            return;
        }
        for track in &mut self.tracks {
            track.scale_key_times(factor);
        }
        if self.is_bounded() {
            self.length *= factor;
        }
        self.state.current_time *= factor;
        self.state.last_applied = None;
    }

    pub fn enabled(&self) -> bool {
        self.state.enabled
    }

    /// Disabling also stops playback.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.stop();
        }
        self.state.enabled = enabled;
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    /// Move the playhead.
    ///
    /// Ignored while stopped. Looped animations wrap into `[0, length)` and stop at the end once
    /// `loop_count` passes are complete; others clamp to `[0, length]` and stop when they reach
    /// the end.
    pub fn set_current_time(&mut self, time: f64) {
        if self.state.stopped {
            return;
        }
        if !time.is_finite() {
            tracing::debug!(animation = %self.name, time, "ignoring non-finite time");
            return;
        }

        if self.looped {
            if time >= self.length {
                let passes = (time / self.length).floor() as u32;
                self.state.loops_done = self.state.loops_done.saturating_add(passes);
                if self.loop_count > 0 && self.state.loops_done >= self.loop_count {
                    self.state.loops_done = self.loop_count;
                    self.state.current_time = self.length;
                    self.stop();
                    return;
                }
            }
            self.state.current_time = wrap_time(time, self.length, true);
        } else if time >= self.length {
            self.state.current_time = self.length;
            self.stop();
        } else {
            self.state.current_time = time.max(0.0);
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.set_current_time(self.state.current_time + dt);
    }

    /// Rewind the playhead and the loop counter without changing the stopped state.
    pub fn reset(&mut self) {
        self.state.current_time = 0.0;
        self.state.loops_done = 0;
    }

    /// Resume playback. Has no effect on a disabled animation.
    pub fn play(&mut self) {
        if self.state.enabled {
            self.state.stopped = false;
            tracing::debug!(animation = %self.name, "started");
        }
    }

    pub fn stop(&mut self) {
        if !self.state.stopped {
            tracing::debug!(animation = %self.name, time = self.state.current_time, "stopped");
        }
        self.state.stopped = true;
    }

    /// Push the current value of every enabled track into its sink.
    ///
    /// A track is only re-evaluated when the playhead moved since the last call or the track was
    /// modified. Returns the number of tracks that received a value.
    #[tracing::instrument(skip(self), fields(animation = %self.name, time = self.state.current_time))]
    pub fn apply(&mut self) -> AnimResult<usize> {
        if !self.state.enabled || self.state.stopped {
            return Ok(0);
        }

        let time = self.state.current_time;
        let timing = self.timing();
        let moved = self.state.last_applied != Some(time);

        let mut updated = 0usize;
        for track in &mut self.tracks {
            if !moved && !track.is_dirty() {
                continue;
            }
            if !track.is_empty() && track.apply(time, timing)? {
                updated += 1;
            }
            track.clear_dirty();
        }

        self.state.last_applied = Some(time);
        tracing::trace!(updated, "applied tracks");
        Ok(updated)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tracks
            .iter()
            .position(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub(crate) fn from_parts(
        name: String,
        length: f64,
        looped: bool,
        tracks: Vec<Track>,
    ) -> AnimResult<Self> {
        let mut anim = Self::new(name, length)?;
        anim.looped = looped;
        for track in tracks {
            anim.add_track(track)?;
        }
        Ok(anim)
    }
}

fn normalize_length(length: f64) -> f64 {
    if length.is_finite() && length > 0.0 {
        length
    } else {
        f64::MAX
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/clip.rs"]
mod tests;
