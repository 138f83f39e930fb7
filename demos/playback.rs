use std::sync::{Arc, Mutex};

use gorgon_anim::{Animation, KeyValue};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let s = include_str!("../tests/data/bounce.json");
    let mut anim = Animation::from_json_str(s)?;

    let latest: Arc<Mutex<Vec<(String, KeyValue)>>> = Arc::new(Mutex::new(Vec::new()));
    let names: Vec<String> = anim.track_names().map(str::to_string).collect();
    for name in names {
        let latest = Arc::clone(&latest);
        let label = name.clone();
        if let Some(track) = anim.track_mut(&name) {
            track.set_sink(move |v| {
                if let Ok(mut out) = latest.lock() {
                    out.push((label.clone(), *v));
                }
            });
        }
    }

    for _ in 0..10 {
        anim.advance(0.25);
        let updated = anim.apply()?;
        let mut out = latest.lock().map_err(|_| anyhow::anyhow!("sink lock poisoned"))?;
        println!("t={:.2} updated={updated}", anim.current_time());
        for (name, value) in out.drain(..) {
            println!("  {name}: {}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
