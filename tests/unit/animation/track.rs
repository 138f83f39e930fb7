use std::sync::{Arc, Mutex};

use super::*;
use crate::foundation::core::{Color, Vec2};

fn single_track(times_values: &[(f64, f64)]) -> Track {
    let mut track = Track::new("Opacity", ValueKind::Single);
    for &(t, v) in times_values {
        track.add_key(Keyframe::new(t, v)).unwrap();
    }
    track
}

fn times(track: &Track) -> Vec<f64> {
    track.keys().map(|k| k.time).collect()
}

fn once(length: f64) -> Timing {
    Timing::new(length, false)
}

fn looped(length: f64) -> Timing {
    Timing::new(length, true)
}

#[test]
fn midpoint_between_two_keys() {
    let track = single_track(&[(0.0, 0.0), (10.0, 100.0)]);
    let n = track.find_nearest(5.0, once(10.0)).unwrap();
    assert_eq!(n.previous_index, 0);
    assert_eq!(n.next_index, 1);
    assert_eq!(n.previous.time, 0.0);
    assert_eq!(n.next.time, 10.0);
    assert_eq!(n.delta, 0.5);
}

#[test]
fn looped_time_wraps_before_bracketing() {
    let track = single_track(&[(0.0, 0.0), (10.0, 100.0)]);
    let n = track.find_nearest(12.0, looped(10.0)).unwrap();
    assert_eq!(n.time, 2.0);
    assert_eq!(n.previous_index, 0);
    assert_eq!(n.next_index, 1);
    assert!((n.delta - 0.2).abs() < 1e-12);
}

#[test]
fn single_key_clamps_with_zero_fraction() {
    let track = single_track(&[(0.0, 7.0)]);
    for t in [0.0, 0.5, 3.0, 9.99] {
        let n = track.find_nearest(t, once(10.0)).unwrap();
        assert_eq!(n.previous_index, 0);
        assert_eq!(n.next_index, 0);
        assert_eq!(n.delta, 0.0);
    }
}

#[test]
fn add_key_within_epsilon_replaces() {
    let mut track = single_track(&[(0.0, 0.0), (5.0, 1.0), (10.0, 2.0)]);
    track.add_key(Keyframe::new(5.0001, 42.0)).unwrap();
    assert_eq!(track.len(), 3);
    assert_eq!(track.key(1).unwrap().value, KeyValue::Single(42.0));
    assert_eq!(track.key(1).unwrap().time, 5.0);
}

#[test]
fn remove_at_time_without_match_leaves_track_alone() {
    let mut track = single_track(&[(0.0, 0.0), (5.0, 1.0)]);
    track.clear_dirty();
    let err = track.remove_at_time(3.0).unwrap_err();
    assert!(matches!(err, AnimError::KeyNotFound { time } if time == 3.0));
    assert_eq!(track.len(), 2);
    assert!(!track.is_dirty());
}

#[test]
fn scale_key_times_preserves_order() {
    let mut track = single_track(&[(0.0, 0.0), (5.0, 1.0), (10.0, 2.0)]);
    track.scale_key_times(2.0);
    assert_eq!(times(&track), vec![0.0, 10.0, 20.0]);
    let values: Vec<_> = track.keys().map(|k| k.value).collect();
    assert_eq!(
        values,
        vec![
            KeyValue::Single(0.0),
            KeyValue::Single(1.0),
            KeyValue::Single(2.0)
        ]
    );
}

#[test]
fn scale_key_times_ignores_identity_and_non_positive_factors() {
    let mut track = single_track(&[(1.0, 0.0), (2.0, 1.0)]);
    track.clear_dirty();
    for factor in [1.0, 1.0005, 0.0, -2.0, f64::NAN, f64::INFINITY] {
        track.scale_key_times(factor);
    }
    assert_eq!(times(&track), vec![1.0, 2.0]);
    assert!(!track.is_dirty());
}

#[test]
fn scale_key_times_merges_collapsed_keys() {
    let mut track = single_track(&[(0.0, 0.0), (1.0, 1.0), (1.5, 2.0)]);
    track.scale_key_times(0.0001);
    assert_eq!(track.len(), 1);
    assert_eq!(track.key(0).unwrap().value, KeyValue::Single(2.0));
}

#[test]
fn keys_stay_sorted_for_any_insertion_order() {
    let inserts = [7.0, 1.0, 9.5, 3.25, 0.0, 8.0, 3.2505, 4.0, 12.0, 1.0004];
    let mut track = Track::new("X", ValueKind::Single);
    for (i, t) in inserts.iter().enumerate() {
        let before = track.len();
        let existed = track.contains(*t);
        track.add_key(Keyframe::new(*t, i as f64)).unwrap();
        let ts = times(&track);
        assert!(ts.windows(2).all(|w| w[0] < w[1]), "unsorted after {t}: {ts:?}");
        assert!(
            ts.windows(2).all(|w| w[1] - w[0] > crate::foundation::math::TIME_EPSILON),
            "duplicate within epsilon after {t}: {ts:?}"
        );
        assert_eq!(track.len(), if existed { before } else { before + 1 });
    }
    assert_eq!(track.len(), 8);
}

#[test]
fn mismatched_kind_is_rejected_without_mutation() {
    let mut track = single_track(&[(0.0, 0.0)]);
    track.clear_dirty();
    let err = track
        .add_key(Keyframe::new(0.0, Color::WHITE))
        .unwrap_err();
    assert!(matches!(
        err,
        AnimError::TypeMismatch {
            expected: ValueKind::Single,
            found: ValueKind::Color,
            ..
        }
    ));
    assert_eq!(track.len(), 1);
    assert_eq!(track.key(0).unwrap().value, KeyValue::Single(0.0));
    assert!(!track.is_dirty());
}

#[test]
fn invalid_times_are_rejected() {
    let mut track = Track::new("X", ValueKind::Single);
    assert!(matches!(
        track.add_key(Keyframe::new(-1.0, 0.0)),
        Err(AnimError::Validation(_))
    ));
    assert!(matches!(
        track.add_key(Keyframe::new(f64::NAN, 0.0)),
        Err(AnimError::Validation(_))
    ));
    assert!(track.is_empty());
}

#[test]
fn remove_at_checks_bounds_and_shifts() {
    let mut track = single_track(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert!(matches!(
        track.remove_at(3),
        Err(AnimError::IndexOutOfRange { index: 3, len: 3 })
    ));
    let removed = track.remove_at(1).unwrap();
    assert_eq!(removed.time, 1.0);
    assert_eq!(times(&track), vec![0.0, 2.0]);
    assert_eq!(track.index_of(2.0), Some(1));
    assert!(track.is_dirty());
}

#[test]
fn lookup_is_epsilon_tolerant() {
    let track = single_track(&[(0.0, 0.0), (2.5, 1.0)]);
    assert!(track.contains(2.5009));
    assert!(!track.contains(2.502));
    assert_eq!(track.index_of(2.4995), Some(1));
    assert_eq!(track.index_of(1.0), None);
    assert_eq!(track.key_at(0.0005).map(|k| k.time), Some(0.0));
}

#[test]
fn clear_all_empties_and_marks_dirty() {
    let mut track = single_track(&[(0.0, 0.0), (2.5, 1.0)]);
    track.clear_dirty();
    track.clear_all();
    assert!(track.is_empty());
    assert!(track.is_dirty());
}

#[test]
fn empty_track_query_fails() {
    let track = Track::new("Empty", ValueKind::Vector2);
    let err = track.find_nearest(1.0, once(10.0)).unwrap_err();
    assert!(matches!(err, AnimError::EmptyTrack { ref track } if track == "Empty"));
}

#[test]
fn fraction_is_never_negative() {
    let track = single_track(&[(1.0, 0.0), (2.0, 1.0), (6.0, 2.0), (9.0, 3.0)]);
    for timing in [once(10.0), looped(10.0)] {
        for step in -40..=80 {
            let t = f64::from(step) * 0.25;
            let n = track.find_nearest(t, timing).unwrap();
            assert!(n.delta >= 0.0, "negative fraction at {t}: {n:?}");
        }
    }
}

#[test]
fn fraction_stays_within_unit_interval_inside_the_animation() {
    let track = single_track(&[(1.0, 0.0), (2.0, 1.0), (6.0, 2.0), (9.0, 3.0)]);
    for timing in [once(10.0), looped(10.0)] {
        for step in 0..=40 {
            let t = f64::from(step) * 0.25;
            let n = track.find_nearest(t, timing).unwrap();
            assert!(n.delta <= 1.0, "fraction above 1 at {t}: {n:?}");
        }
    }
}

#[test]
fn looped_tail_fraction_runs_toward_the_loop_point() {
    // The segment after the last key is measured against the animation length, so the
    // fraction is not 0 here. At the length itself the query is back at the first key.
    let track = single_track(&[(0.0, 0.0), (5.0, 10.0)]);
    let n = track.find_nearest(7.5, looped(10.0)).unwrap();
    assert_eq!(n.previous_index, 1);
    assert_eq!(n.next_index, 0);
    assert_eq!(n.delta, 0.5);
    let end = track.find_nearest(10.0, looped(10.0)).unwrap();
    assert_eq!(end.time, 0.0);
    assert_eq!((end.previous_index, end.next_index, end.delta), (0, 1, 0.0));

    let single = single_track(&[(0.0, 3.0)]);
    let n = single.find_nearest(5.0, looped(10.0)).unwrap();
    assert_eq!(n.delta, 0.5);
    assert_eq!(single.sample(5.0, looped(10.0)).unwrap(), KeyValue::Single(3.0));
}

#[test]
fn looped_queries_repeat_every_period() {
    let track = single_track(&[(0.0, 0.0), (2.0, 1.0), (6.5, 2.0), (8.0, 3.0)]);
    let timing = looped(10.0);
    for base in [0.0, 0.25, 1.0, 2.0, 3.3, 6.5, 7.9, 9.0, 10.0] {
        let reference = track.find_nearest(base, timing).unwrap();
        for k in 1..6 {
            let n = track
                .find_nearest(base + f64::from(k) * timing.length, timing)
                .unwrap();
            assert_eq!(n.previous_index, reference.previous_index, "t={base} k={k}");
            assert_eq!(n.next_index, reference.next_index, "t={base} k={k}");
            assert!((n.delta - reference.delta).abs() < 1e-9, "t={base} k={k}");
        }
    }
}

#[test]
fn looped_loop_point_matches_start() {
    let track = single_track(&[(0.0, 0.0), (5.0, 10.0)]);
    let timing = looped(10.0);
    let start = track.find_nearest(0.0, timing).unwrap();
    for t in [10.0, 20.0, 50.0] {
        let n = track.find_nearest(t, timing).unwrap();
        assert_eq!(
            (n.previous_index, n.next_index, n.delta),
            (start.previous_index, start.next_index, start.delta),
            "t={t}"
        );
        assert_eq!(track.sample(t, timing).unwrap(), KeyValue::Single(0.0));
    }
    // Non-looped timing still lands on the length and holds the last key.
    let n = track.find_nearest(20.0, once(10.0)).unwrap();
    assert_eq!(n.time, 10.0);
    assert_eq!((n.previous_index, n.next_index, n.delta), (1, 1, 0.0));
}

#[test]
fn looped_negative_times_wrap_forward() {
    let track = single_track(&[(0.0, 0.0), (10.0, 100.0)]);
    let n = track.find_nearest(-8.0, looped(10.0)).unwrap();
    assert_eq!(n.time, 2.0);
    assert!((n.delta - 0.2).abs() < 1e-12);
}

#[test]
fn non_looped_clamps_past_last_key() {
    let track = single_track(&[(0.0, 0.0), (4.0, 1.0), (6.0, 2.0)]);
    for t in [6.0, 7.0, 9.5, 10.0] {
        let n = track.find_nearest(t, once(10.0)).unwrap();
        assert_eq!(n.previous_index, 2);
        assert_eq!(n.next_index, 2);
        assert_eq!(n.delta, 0.0);
    }
    assert_eq!(
        track.sample(8.0, once(10.0)).unwrap(),
        KeyValue::Single(2.0)
    );
}

#[test]
fn time_before_first_key_holds_first_key() {
    let track = single_track(&[(2.0, 5.0), (4.0, 9.0)]);
    let n = track.find_nearest(1.0, once(10.0)).unwrap();
    assert_eq!((n.previous_index, n.next_index, n.delta), (0, 0, 0.0));
    assert_eq!(track.sample(1.0, once(10.0)).unwrap(), KeyValue::Single(5.0));
}

#[test]
fn sample_honours_interpolation_mode() {
    let mut track = single_track(&[(0.0, 0.0), (10.0, 100.0)]);
    assert_eq!(track.sample(5.0, once(10.0)).unwrap(), KeyValue::Single(50.0));

    track.set_interpolation(InterpolationMode::None);
    assert_eq!(track.sample(5.0, once(10.0)).unwrap(), KeyValue::Single(0.0));

    track.set_interpolation(InterpolationMode::Spline);
    track.add_key(Keyframe::new(20.0, 200.0)).unwrap();
    track.add_key(Keyframe::new(30.0, 300.0)).unwrap();
    // Evenly spaced, collinear keys: the spline reduces to a line.
    let v = track.sample(15.0, once(30.0)).unwrap().as_single().unwrap();
    assert!((v - 150.0).abs() < 1e-9);
}

#[test]
fn spline_neighbours_wrap_when_looped() {
    let mut track = Track::new("Pos", ValueKind::Vector2);
    track.set_interpolation(InterpolationMode::Spline);
    for (t, x) in [(0.0, 0.0), (1.0, 10.0), (2.0, 0.0), (3.0, 10.0)] {
        track.add_key(Keyframe::new(t, Vec2::new(x, 0.0))).unwrap();
    }
    assert_eq!(track.neighbour(0, -1, true).time, 3.0);
    assert_eq!(track.neighbour(0, -1, false).time, 0.0);
    assert_eq!(track.neighbour(3, 1, true).time, 0.0);
    assert_eq!(track.neighbour(3, 1, false).time, 3.0);

    let at_key = track.sample(1.0, looped(4.0)).unwrap();
    assert_eq!(at_key, KeyValue::Vector2(Vec2::new(10.0, 0.0)));
}

#[test]
fn apply_pushes_value_into_sink() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let mut track = Track::with_sink("Angle", ValueKind::Single, move |v| {
        sink_seen.lock().unwrap().push(*v);
    });
    track.add_key(Keyframe::new(0.0, 0.0)).unwrap();
    track.add_key(Keyframe::new(2.0, 90.0)).unwrap();

    assert!(track.apply(1.0, once(2.0)).unwrap());
    track.set_enabled(false);
    assert!(!track.apply(2.0, once(2.0)).unwrap());

    assert_eq!(*seen.lock().unwrap(), vec![KeyValue::Single(45.0)]);
}

#[test]
fn apply_without_sink_is_a_no_op() {
    let mut track = single_track(&[(0.0, 1.0)]);
    assert!(!track.apply(0.0, once(1.0)).unwrap());
}

#[test]
fn tracks_can_be_queried_from_several_threads() {
    let a = single_track(&[(0.0, 0.0), (10.0, 100.0)]);
    let b = single_track(&[(0.0, 100.0), (10.0, 0.0)]);
    let timing = once(10.0);

    let (va, vb) = std::thread::scope(|s| {
        let ha = s.spawn(|| a.sample(2.5, timing).unwrap());
        let hb = s.spawn(|| b.sample(2.5, timing).unwrap());
        (ha.join().unwrap(), hb.join().unwrap())
    });
    assert_eq!(va, KeyValue::Single(25.0));
    assert_eq!(vb, KeyValue::Single(75.0));
}

#[test]
fn json_roundtrip_replays_keys_through_validation() {
    let json = r#"{
        "name": "Opacity",
        "kind": "single",
        "interpolation": "spline",
        "keys": [
            { "time": 5.0, "value": { "single": 1.0 } },
            { "time": 0.0, "value": { "single": 0.0 } },
            { "time": 5.0004, "value": { "single": 2.0 } }
        ]
    }"#;
    let track: Track = serde_json::from_str(json).unwrap();
    assert_eq!(times(&track), vec![0.0, 5.0]);
    assert_eq!(track.key(1).unwrap().value, KeyValue::Single(2.0));
    assert_eq!(track.interpolation(), InterpolationMode::Spline);
    assert!(track.enabled());
    assert!(!track.is_dirty());

    let bad = r#"{ "name": "X", "kind": "color", "keys": [ { "time": 0.0, "value": { "single": 1.0 } } ] }"#;
    let err = serde_json::from_str::<Track>(bad).unwrap_err();
    assert!(err.to_string().contains("type mismatch"));
}
