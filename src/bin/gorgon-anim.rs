use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use gorgon_anim::{Animation, KeyValue, Track};

#[derive(Parser, Debug)]
#[command(name = "gorgon-anim", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the animation's length, loop mode, frame rate and tracks.
    Info(InfoArgs),
    /// Evaluate tracks at a time and print the bracketing keys and values as JSON.
    Sample(SampleArgs),
    /// Multiply every key time and the length by a factor.
    Scale(ScaleArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input animation JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input animation JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds.
    #[arg(long, allow_negative_numbers = true)]
    time: f64,

    /// Only sample this track (case-insensitive).
    #[arg(long)]
    track: Option<String>,
}

#[derive(Parser, Debug)]
struct ScaleArgs {
    /// Input animation JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time scale factor (> 0).
    #[arg(long)]
    factor: f64,

    /// Output animation JSON.
    #[arg(long)]
    out: PathBuf,
}

#[derive(serde::Serialize)]
struct SampleReport<'a> {
    animation: &'a str,
    time: f64,
    tracks: Vec<TrackSample<'a>>,
}

#[derive(serde::Serialize)]
struct TrackSample<'a> {
    track: &'a str,
    time: f64,
    previous: KeyRef,
    next: KeyRef,
    delta: f64,
    value: KeyValue,
}

#[derive(serde::Serialize)]
struct KeyRef {
    index: usize,
    time: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Sample(args) => cmd_sample(args),
        Command::Scale(args) => cmd_scale(args),
    }
}

fn read_animation(path: &std::path::Path) -> anyhow::Result<Animation> {
    Animation::from_path(path).with_context(|| format!("load animation '{}'", path.display()))
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let anim = read_animation(&args.in_path)?;

    let length = if anim.is_bounded() {
        format!("{}", anim.length())
    } else {
        "unbounded".to_string()
    };
    println!("name: {}", anim.name());
    println!("length: {length}");
    println!("looped: {}", anim.looped());
    if anim.looped() {
        match anim.loop_count() {
            0 => println!("loops: infinite"),
            n => println!("loops: {n}"),
        }
    }
    println!("fps: {}", anim.fps());
    println!("tracks: {}", anim.tracks().len());
    for track in anim.tracks() {
        let span = match (track.first_key(), track.last_key()) {
            (Some(first), Some(last)) => format!("{:.3}..{:.3}", first.time, last.time),
            _ => "-".to_string(),
        };
        println!(
            "  {} [{}] {:?} keys={} span={}{}",
            track.name(),
            track.kind(),
            track.interpolation(),
            track.len(),
            span,
            if track.enabled() { "" } else { " (disabled)" }
        );
    }
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.time.is_finite(), "--time must be finite");
    let anim = read_animation(&args.in_path)?;

    let selected: Vec<&Track> = match &args.track {
        Some(name) => vec![
            anim.track(name)
                .ok_or_else(|| gorgon_anim::AnimError::track_not_found(name))?,
        ],
        None => anim.tracks().iter().filter(|t| !t.is_empty()).collect(),
    };

    let timing = anim.timing();
    let mut tracks = Vec::with_capacity(selected.len());
    for track in selected {
        let nearest = track
            .find_nearest(args.time, timing)
            .with_context(|| format!("bracket track '{}'", track.name()))?;
        let value = track
            .sample(args.time, timing)
            .with_context(|| format!("sample track '{}'", track.name()))?;
        tracks.push(TrackSample {
            track: track.name(),
            time: nearest.time,
            previous: KeyRef {
                index: nearest.previous_index,
                time: nearest.previous.time,
            },
            next: KeyRef {
                index: nearest.next_index,
                time: nearest.next.time,
            },
            delta: nearest.delta,
            value,
        });
    }

    let report = SampleReport {
        animation: anim.name(),
        time: args.time,
        tracks,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_scale(args: ScaleArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.factor.is_finite() && args.factor > 0.0,
        "--factor must be a positive number (got {})",
        args.factor
    );
    let mut anim = read_animation(&args.in_path)?;
    anim.scale_time(args.factor);

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    anim.save(&args.out)
        .with_context(|| format!("write animation '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
