//! Default visible window
//!
//! Charts open zoomed on the most recent commits. The axis ranges are
//! computed from the points inside that window so small recent changes are
//! readable even after years of growth.

use crate::series::SeriesPoint;
use serde::Serialize;

/// Number of most recent commits visible when a chart opens
pub const DEFAULT_WINDOW: usize = 100;

/// Bytes of headroom added around the visible sizes and deltas
pub const DEFAULT_PADDING: i64 = 64;

/// Closed axis range, serialized as `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisRange(pub i64, pub i64);

impl AxisRange {
    pub fn symmetric(peak: i64) -> Self {
        AxisRange(-peak, peak)
    }

    pub fn start(&self) -> i64 {
        self.0
    }

    pub fn end(&self) -> i64 {
        self.1
    }

    pub fn contains(&self, value: i64) -> bool {
        self.0 <= value && value <= self.1
    }
}

/// Initial axis ranges for a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    /// Index range; may start below zero for short histories
    pub x: AxisRange,
    pub size: AxisRange,
    pub delta: AxisRange,
}

/// Compute the default view over the last `window` points
///
/// The x range always spans `window` indexes ending at the point count. The
/// size and delta ranges cover the visible points plus the one just left of
/// the window, whose step line enters the view.
///
/// Ranges clamp at the `i64` limits instead of overflowing.
pub fn view_window(points: &[SeriesPoint], window: usize, padding: i64) -> ViewWindow {
    let padding = padding.max(0);
    let len = i64::try_from(points.len()).unwrap_or(i64::MAX);
    let span = i64::try_from(window).unwrap_or(i64::MAX);
    let x = AxisRange(len.saturating_sub(span), len);

    let visible = &points[points.len().saturating_sub(window.saturating_add(1))..];

    let size = match (
        visible.iter().map(|p| p.size).min(),
        visible.iter().map(|p| p.size).max(),
    ) {
        (Some(low), Some(high)) => {
            AxisRange(low.saturating_sub(padding), high.saturating_add(padding))
        }
        _ => AxisRange::symmetric(padding),
    };

    let peak = visible
        .iter()
        .map(|p| p.delta.saturating_abs())
        .max()
        .unwrap_or(0)
        .saturating_add(padding);

    ViewWindow {
        x,
        size,
        delta: AxisRange::symmetric(peak),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(sizes: &[i64]) -> Vec<SeriesPoint> {
        let mut prev = 0;
        sizes
            .iter()
            .enumerate()
            .map(|(index, &size)| {
                let delta = if prev == 0 || size == 0 { 0 } else { size - prev };
                if size != 0 {
                    prev = size;
                }
                SeriesPoint {
                    index,
                    short_id: format!("{:08x}", index),
                    message: String::new(),
                    size,
                    delta,
                }
            })
            .collect()
    }

    #[test]
    fn test_short_history_uses_every_point() {
        let pts = points(&[1000, 1100, 1050]);
        let view = view_window(&pts, DEFAULT_WINDOW, DEFAULT_PADDING);

        assert_eq!(view.x, AxisRange(-97, 3));
        assert_eq!(view.size, AxisRange(1000 - 64, 1100 + 64));
        assert_eq!(view.delta, AxisRange(-(100 + 64), 100 + 64));
    }

    #[test]
    fn test_long_history_ignores_old_points() {
        // An early outlier well outside the window must not stretch the axes
        let mut sizes = vec![10_000];
        sizes.extend((0..200).map(|i| 200_000 + i));
        let pts = points(&sizes);
        let view = view_window(&pts, DEFAULT_WINDOW, DEFAULT_PADDING);

        assert_eq!(view.x, AxisRange(101, 201));
        assert_eq!(view.size.start(), 200_000 + 99 - 64);
        assert_eq!(view.size.end(), 200_000 + 199 + 64);
        assert_eq!(view.delta, AxisRange::symmetric(1 + 64));
    }

    #[test]
    fn test_range_contains_all_visible_sizes() {
        let sizes: Vec<i64> = (0..250).map(|i| 150_000 + (i * 37 % 500)).collect();
        let pts = points(&sizes);
        let view = view_window(&pts, DEFAULT_WINDOW, DEFAULT_PADDING);

        for p in &pts[pts.len() - DEFAULT_WINDOW..] {
            assert!(view.size.contains(p.size - 64));
            assert!(view.size.contains(p.size + 64));
            assert!(view.delta.contains(p.delta));
        }
    }

    #[test]
    fn test_single_point() {
        let pts = points(&[4096]);
        let view = view_window(&pts, DEFAULT_WINDOW, DEFAULT_PADDING);

        assert_eq!(view.x, AxisRange(-99, 1));
        assert_eq!(view.size, AxisRange(4032, 4160));
        assert_eq!(view.delta, AxisRange(-64, 64));
    }

    #[test]
    fn test_empty_series() {
        let view = view_window(&[], DEFAULT_WINDOW, DEFAULT_PADDING);
        assert_eq!(view.x, AxisRange(-100, 0));
        assert_eq!(view.size, AxisRange(-64, 64));
        assert_eq!(view.delta, AxisRange(-64, 64));
    }

    #[test]
    fn test_extreme_window_and_padding_clamp() {
        let pts = points(&[1000, 1100]);
        let view = view_window(&pts, usize::MAX, i64::MAX);

        assert_eq!(view.x, AxisRange(2 - i64::MAX, 2));
        assert_eq!(view.size, AxisRange(1000 - i64::MAX, i64::MAX));
        assert_eq!(view.delta, AxisRange::symmetric(i64::MAX));

        let empty = view_window(&[], usize::MAX, i64::MAX);
        assert_eq!(empty.x, AxisRange(-i64::MAX, 0));
    }

    #[test]
    fn test_range_serializes_as_pair() {
        let json = serde_json::to_string(&AxisRange(-3, 7)).unwrap();
        assert_eq!(json, "[-3,7]");
    }
}
