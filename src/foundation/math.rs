use std::cmp::Ordering;

/// Tolerance used when comparing key times.
///
/// Two times closer than this are the same key for lookup, insertion and sorting. Nothing else
/// in the crate uses it as a general float equality.
pub const TIME_EPSILON: f64 = 0.001;

/// `true` when `a` and `b` are within [`TIME_EPSILON`] of each other.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// Epsilon-tolerant ordering of key times.
///
/// Returns `Equal` for times within [`TIME_EPSILON`], otherwise the natural order. Keys in a track
/// are always more than epsilon apart, so this is consistent for binary search over them.
pub fn approx_cmp(a: f64, b: f64) -> Ordering {
    if approx_eq(a, b) {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Bring `time` back under `length` by whole periods.
///
/// Without `looped` this matches repeated `time -= length` while `time > length`, so an exact
/// multiple of the length lands on `length` and negative times pass through. With `looped` the
/// result always lies in `[0, length)`.
pub(crate) fn wrap_time(time: f64, length: f64, looped: bool) -> f64 {
    if length <= 0.0 || !length.is_finite() {
        return time;
    }

    let mut t = time;
    if t > length {
        let periods = ((t - length) / length).ceil();
        t -= periods * length;
        // Rounding can leave us a hair on either side of the bound.
        while t > length {
            t -= length;
        }
    }
    if looped {
        if t >= length {
            t -= length;
        }
        if t < 0.0 {
            let periods = (-t / length).ceil();
            t += periods * length;
            if t >= length {
                t -= length;
            }
        }
    }
    t
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
