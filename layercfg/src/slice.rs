//! List slicing: turns `(start?, stop?, step?)` into the concrete index
//! sequence to read out of a list of length `n`.
//!
//! The one subtlety worth a comment: the exclusive→inclusive `stop`
//! adjustment (`stop -= 1` for a positive step, `stop += 1` for a negative
//! one) only fires when the caller actually wrote a `stop`. The default
//! (`N-1`) is already the last valid index, so re-adjusting it would drop
//! an element from a bare `list[:]` — confirmed against the worked slicing
//! examples (`list[:]`, `list[::-1]`, `list[::2][::3]`).

use layercfg_util::{ConfigError, Result};

pub fn resolve_slice(n: i64, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Vec<i64>> {
    let step = match step {
        None => 1,
        Some(0) => return Err(ConfigError::StepIsZero.into()),
        Some(s) => s,
    };

    if n == 0 {
        return Ok(Vec::new());
    }

    let mut start_v = normalize(start.unwrap_or(0), n);
    if start_v >= n {
        start_v = n - 1;
    }

    let mut stop_v = match stop {
        Some(s) => {
            let mut sv = normalize_stop(s, n);
            if step < 0 {
                sv += 1;
            } else {
                sv -= 1;
            }
            sv
        }
        None => n - 1,
    };

    if step < 0 && start_v < stop_v {
        std::mem::swap(&mut start_v, &mut stop_v);
    }

    let mut indices = Vec::new();
    let mut i = start_v;
    if step > 0 {
        while i <= stop_v {
            indices.push(i);
            i += step;
        }
    } else {
        while i >= stop_v {
            indices.push(i);
            i += step;
        }
    }
    Ok(indices)
}

fn normalize(v: i64, n: i64) -> i64 {
    if v < 0 {
        if v >= -n {
            v + n
        } else {
            0
        }
    } else {
        v
    }
}

fn normalize_stop(v: i64, n: i64) -> i64 {
    if v < 0 {
        if v >= -n {
            v + n
        } else {
            0
        }
    } else if v > n {
        n
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(n: i64, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Vec<i64> {
        resolve_slice(n, start, stop, step).unwrap()
    }

    #[test]
    fn full_slice_is_identity() {
        assert_eq!(idx(7, None, None, None), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(idx(7, None, None, Some(1)), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn stop_past_end_clamps() {
        assert_eq!(idx(7, None, Some(20), None), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn negative_step_reverses() {
        assert_eq!(idx(7, None, None, Some(-1)), vec![6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn negative_start_stop_with_negative_step() {
        // test_list[-2:2:-1] over a length-7 list picks indices 5, 4, 3.
        assert_eq!(idx(7, Some(-2), Some(2), Some(-1)), vec![5, 4, 3]);
    }

    #[test]
    fn chained_strides() {
        let first = idx(7, None, None, Some(2));
        assert_eq!(first, vec![0, 2, 4, 6]);
        let second = idx(first.len() as i64, None, None, Some(3));
        assert_eq!(second, vec![0, 3]);
    }

    #[test]
    fn zero_step_errors() {
        assert!(resolve_slice(7, None, None, Some(0)).is_err());
    }

    #[test]
    fn empty_container_slices_to_empty() {
        assert_eq!(idx(0, None, None, None), Vec::<i64>::new());
        assert_eq!(idx(0, None, None, Some(-1)), Vec::<i64>::new());
        assert_eq!(idx(0, Some(-2), Some(2), None), Vec::<i64>::new());
    }
}
