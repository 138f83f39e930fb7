use crate::animation::value::ValueKind;

/// Convenience result type used across the crate.
pub type AnimResult<T> = Result<T, AnimError>;

/// Top-level error taxonomy for tracks, animations and documents.
#[derive(thiserror::Error, Debug)]
pub enum AnimError {
    /// A bracket query was made against a track without keys.
    #[error("empty track: '{track}' has no keys")]
    EmptyTrack {
        /// Name of the offending track.
        track: String,
    },

    /// A key (or value) does not match the declared kind of its track.
    #[error("type mismatch on '{track}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the offending track.
        track: String,
        /// Kind declared by the track.
        expected: ValueKind,
        /// Kind of the rejected value.
        found: ValueKind,
    },

    /// Index-based access outside `[0, len)`.
    #[error("index {index} is out of range for {len} keys")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of keys at the time of the call.
        len: usize,
    },

    /// Time-based lookup found no key within epsilon.
    #[error("no key found at time {time}")]
    KeyNotFound {
        /// Requested time.
        time: f64,
    },

    /// A named track does not exist in an animation or builder.
    #[error("track '{0}' does not exist")]
    TrackNotFound(String),

    /// Invalid user-provided data (times, lengths, names, documents).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing animation documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimError {
    /// Build an [`AnimError::EmptyTrack`] value.
    pub fn empty_track(track: impl Into<String>) -> Self {
        Self::EmptyTrack {
            track: track.into(),
        }
    }

    /// Build an [`AnimError::TypeMismatch`] value.
    pub fn type_mismatch(track: impl Into<String>, expected: ValueKind, found: ValueKind) -> Self {
        Self::TypeMismatch {
            track: track.into(),
            expected,
            found,
        }
    }

    /// Build an [`AnimError::TrackNotFound`] value.
    pub fn track_not_found(name: impl Into<String>) -> Self {
        Self::TrackNotFound(name.into())
    }

    /// Build an [`AnimError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`AnimError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
