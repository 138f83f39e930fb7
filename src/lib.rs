//! Keyframe animation tracks.
//!
//! A [`Track`] stores time-ordered keyframes for one animated property and answers bracket
//! queries ([`Track::find_nearest`]) with wraparound and looping. An [`Animation`] owns a set of
//! named tracks, drives them from a playhead and pushes interpolated values into each track's
//! [`PropertySink`]. [`AnimationBuilder`] assembles animations snapped to a frame rate, and
//! animations round-trip through a versioned JSON document.
//!
//! ```
//! use gorgon_anim::{Animation, Keyframe, Track, ValueKind};
//!
//! let mut anim = Animation::new("Fade", 2.0)?;
//! let mut opacity = Track::new("Opacity", ValueKind::Single);
//! opacity.add_key(Keyframe::new(0.0, 0.0))?;
//! opacity.add_key(Keyframe::new(2.0, 1.0))?;
//! anim.add_track(opacity)?;
//!
//! assert_eq!(anim.sample("Opacity", 0.5)?.as_single(), Some(0.25));
//! # Ok::<(), gorgon_anim::AnimError>(())
//! ```

#![forbid(unsafe_code)]

mod animation;
mod codec;
mod foundation;

pub use animation::builder::{AnimationBuilder, BuildOptions, TrackBuilder};
pub use animation::clip::{Animation, DEFAULT_FPS};
pub use animation::track::{
    InterpolationMode, Keyframe, NearestKeys, PropertySink, Timing, Track,
};
pub use animation::value::{CatmullRom, KeyValue, Lerp, ValueKind};
pub use codec::json::FORMAT_VERSION;
pub use foundation::core::{Color, Quat, Rect, Vec2, Vec3, Vec4};
pub use foundation::error::{AnimError, AnimResult};
pub use foundation::math::{TIME_EPSILON, approx_cmp, approx_eq};
