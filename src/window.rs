use crate::error::{TrackplotError, TrackplotResult};

/// One cumulative frame boundary.
///
/// A frame covers every row with `time <= bound`, so consecutive frames grow
/// monotonically; `index` is the 1-based position used in output file names.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameWindow {
    /// 1-based sequential frame index.
    pub index: usize,
    /// Start offset into the distinct-timestamp axis.
    pub start: usize,
    /// Inclusive upper-bound timestamp of this frame.
    pub bound: f64,
    /// Nominal number of distinct timestamps covered, `min(start + size, n)`.
    /// Drives the frame title's elapsed-time figure.
    pub covered: usize,
}

/// Fixed-size windows over the sorted distinct timestamps.
///
/// Windowing is by index into the distinct-time axis, not by time value:
/// window k spans indices `[k*size, (k+1)*size)`, clamped at the end.
#[derive(Clone, Debug)]
pub struct FrameWindows {
    times: Vec<f64>,
    size: usize,
}

impl FrameWindows {
    /// Build windows of `size` distinct-timestamp steps.
    ///
    /// `times` must be the sorted distinct timestamps of the dataset.
    pub fn new(times: Vec<f64>, size: usize) -> TrackplotResult<Self> {
        if size == 0 {
            return Err(TrackplotError::validation("window size must be > 0"));
        }
        if times.is_empty() {
            return Err(TrackplotError::validation(
                "cannot window an empty time axis",
            ));
        }
        Ok(Self { times, size })
    }

    /// Number of frames: `ceil(n_distinct / size)`.
    pub fn len(&self) -> usize {
        self.times.len().div_ceil(self.size)
    }

    /// Always false for a constructed value.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate the frame boundaries in order.
    pub fn iter(&self) -> impl Iterator<Item = FrameWindow> + '_ {
        let n = self.times.len();
        let size = self.size;
        (0..self.len()).map(move |k| {
            let start = k * size;
            let bound_idx = (start + size - 1).min(n - 1);
            FrameWindow {
                index: k + 1,
                start,
                bound: self.times[bound_idx],
                covered: (start + size).min(n),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exact binary fractions, so bound comparisons need no epsilon.
    fn times(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * 0.25).collect()
    }

    #[test]
    fn frame_count_is_ceil_of_distinct_over_size() {
        for (n, expect) in [(1, 1), (9, 1), (10, 1), (11, 2), (25, 3), (30, 3)] {
            let w = FrameWindows::new(times(n), 10).unwrap();
            assert_eq!(w.len(), expect, "n = {n}");
            assert_eq!(w.iter().count(), expect, "n = {n}");
        }
    }

    #[test]
    fn bounds_step_by_window_size_and_clamp_at_the_end() {
        let w = FrameWindows::new(times(25), 10).unwrap();
        let frames: Vec<FrameWindow> = w.iter().collect();
        assert_eq!(frames.len(), 3);

        // First two windows end at indices 9 and 19; the last clamps to 24.
        assert_eq!(frames[0].bound, 2.25);
        assert_eq!(frames[1].bound, 4.75);
        assert_eq!(frames[2].bound, 6.0);

        assert_eq!(frames[0].covered, 10);
        assert_eq!(frames[1].covered, 20);
        assert_eq!(frames[2].covered, 25);
    }

    #[test]
    fn indices_are_one_based_and_sequential() {
        let w = FrameWindows::new(times(21), 10).unwrap();
        let idx: Vec<usize> = w.iter().map(|f| f.index).collect();
        assert_eq!(idx, vec![1, 2, 3]);
    }

    #[test]
    fn zero_size_and_empty_axis_are_rejected() {
        assert!(FrameWindows::new(times(5), 0).is_err());
        assert!(FrameWindows::new(Vec::new(), 10).is_err());
    }

    #[test]
    fn bounds_grow_monotonically() {
        let w = FrameWindows::new(times(42), 10).unwrap();
        let bounds: Vec<f64> = w.iter().map(|f| f.bound).collect();
        assert!(bounds.windows(2).all(|p| p[0] < p[1]));
    }
}
