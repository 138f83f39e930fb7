use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::Context;

use crate::{
    animation::clip::{Animation, DEFAULT_FPS},
    animation::track::Track,
    foundation::error::{AnimError, AnimResult},
};

/// Document format version written by [`Animation::to_json_string`] and accepted on read.
pub const FORMAT_VERSION: &str = "1.0";

/// On-disk animation document.
///
/// `length` is `null` (or absent) for animations that never end. Tracks decode through
/// [`Track::add_key`], so unsorted keys are sorted, same-time keys collapse and mistyped keys are
/// rejected.
#[derive(serde::Deserialize)]
struct AnimationDef {
    version: String,
    name: String,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    looped: bool,
    #[serde(default = "default_fps")]
    fps: f64,
    #[serde(default)]
    loop_count: u32,
    #[serde(default)]
    tracks: Vec<Track>,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

#[derive(serde::Serialize)]
struct AnimationDoc<'a> {
    version: &'static str,
    name: &'a str,
    length: Option<f64>,
    looped: bool,
    fps: f64,
    loop_count: u32,
    tracks: &'a [Track],
}

impl Animation {
    /// Parse an animation document from a JSON reader.
    pub fn from_reader<R: Read>(r: R) -> AnimResult<Self> {
        let def: AnimationDef = serde_json::from_reader(r)
            .map_err(|e| AnimError::serde(format!("parse animation JSON: {e}")))?;
        Self::from_def(def)
    }

    pub fn from_json_str(s: &str) -> AnimResult<Self> {
        let def: AnimationDef = serde_json::from_str(s)
            .map_err(|e| AnimError::serde(format!("parse animation JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse an animation document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> AnimResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open animation JSON '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pretty-printed JSON document for this animation. Sinks and playback state are not saved.
    pub fn to_json_string(&self) -> AnimResult<String> {
        serde_json::to_string_pretty(&self.doc())
            .map_err(|e| AnimError::serde(format!("encode animation JSON: {e}")))
    }

    pub fn to_writer<W: Write>(&self, w: W) -> AnimResult<()> {
        serde_json::to_writer_pretty(w, &self.doc())
            .map_err(|e| AnimError::serde(format!("encode animation JSON: {e}")))
    }

    /// Write the document to `path`, creating or truncating the file.
    pub fn save(&self, path: impl AsRef<Path>) -> AnimResult<()> {
        let path = path.as_ref();
        let f = File::create(path)
            .with_context(|| format!("create animation JSON '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        self.to_writer(&mut w)?;
        w.flush()
            .with_context(|| format!("write animation JSON '{}'", path.display()))?;
        Ok(())
    }

    fn doc(&self) -> AnimationDoc<'_> {
        AnimationDoc {
            version: FORMAT_VERSION,
            name: self.name(),
            length: self.is_bounded().then(|| self.length()),
            looped: self.looped(),
            fps: self.fps(),
            loop_count: self.loop_count(),
            tracks: self.tracks(),
        }
    }

    fn from_def(def: AnimationDef) -> AnimResult<Self> {
        if def.version != FORMAT_VERSION {
            return Err(AnimError::validation(format!(
                "unsupported animation document version '{}' (expected '{FORMAT_VERSION}')",
                def.version
            )));
        }
        if def.fps < 1.0 {
            return Err(AnimError::validation(format!(
                "fps must be at least 1 (got {})",
                def.fps
            )));
        }
        // Missing length means unbounded, same as a non-positive one.
        let mut anim = Self::from_parts(
            def.name,
            def.length.unwrap_or(0.0),
            def.looped,
            def.tracks,
        )?;
        anim.set_fps(def.fps);
        anim.set_loop_count(def.loop_count);
        tracing::debug!(
            animation = anim.name(),
            tracks = anim.tracks().len(),
            "decoded animation"
        );
        Ok(anim)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/json.rs"]
mod tests;
