//! Pure geometry for the hand-painted charts (pie, treemap, stacked area).

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// `(start, end)` of each slice as fractions of a full turn.
/// Non-positive values get an empty span; an all-zero input yields all
/// empty spans.
pub fn pie_fractions(values: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let mut start = 0.0;
    values
        .iter()
        .map(|&v| {
            let share = if total > 0.0 && v > 0.0 { v / total } else { 0.0 };
            let span = (start, start + share);
            start += share;
            span
        })
        .collect()
}

/// Points on an arc, `steps + 1` of them, angles in radians.
pub fn arc_points(center: Pos2, radius: f32, from: f32, to: f32, steps: usize) -> Vec<Pos2> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let a = from + (to - from) * i as f32 / steps as f32;
            center + radius * Vec2::angled(a)
        })
        .collect()
}

/// Running totals of stacked layers: `out[k][j] = Σ_{i ≤ k} layers[i][j]`.
pub fn stack_layers(layers: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = Vec::with_capacity(layers.len());
    for layer in layers {
        let next = match out.last() {
            Some(below) => layer.iter().zip(below).map(|(v, b)| v + b).collect(),
            None => layer.clone(),
        };
        out.push(next);
    }
    out
}

// ---------------------------------------------------------------------------
// Squarified treemap
// ---------------------------------------------------------------------------

/// Lay out `values` inside `bounds` with the squarified algorithm.
///
/// The returned rects line up with `values`; non-positive values get an
/// empty rect at `bounds.min`.
pub fn squarify(values: &[f64], bounds: Rect) -> Vec<Rect> {
    let empty = Rect::from_min_size(bounds.min, Vec2::ZERO);
    let mut out = vec![empty; values.len()];

    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let area = f64::from(bounds.width()) * f64::from(bounds.height());
    if total <= 0.0 || area <= 0.0 {
        return out;
    }
    let scale = area / total;

    let mut order: Vec<usize> = (0..values.len()).filter(|&i| values[i] > 0.0).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut free = bounds;
    let mut row: Vec<(usize, f64)> = Vec::new();
    let mut next = 0;
    while next < order.len() {
        let idx = order[next];
        let item = (idx, values[idx] * scale);
        let side = f64::from(free.width().min(free.height()));

        let mut candidate = row.clone();
        candidate.push(item);
        if row.is_empty() || worst_ratio(&candidate, side) <= worst_ratio(&row, side) {
            row = candidate;
            next += 1;
        } else {
            free = place_row(&row, free, &mut out);
            row.clear();
        }
    }
    if !row.is_empty() {
        place_row(&row, free, &mut out);
    }
    out
}

/// Worst aspect ratio of a row laid along a side of length `side`.
fn worst_ratio(row: &[(usize, f64)], side: f64) -> f64 {
    let sum: f64 = row.iter().map(|(_, a)| a).sum();
    let max = row.iter().map(|(_, a)| *a).fold(f64::MIN, f64::max);
    let min = row.iter().map(|(_, a)| *a).fold(f64::MAX, f64::min);
    if sum <= 0.0 || side <= 0.0 {
        return f64::INFINITY;
    }
    let (s2, w2) = (sum * sum, side * side);
    (w2 * max / s2).max(s2 / (w2 * min))
}

/// Place a row along the shorter side of `free`; returns what is left.
fn place_row(row: &[(usize, f64)], free: Rect, out: &mut [Rect]) -> Rect {
    let sum: f64 = row.iter().map(|(_, a)| a).sum();
    if free.width() >= free.height() {
        // Column on the left edge.
        let height = f64::from(free.height());
        let width = (sum / height) as f32;
        let mut y = free.min.y;
        for &(idx, a) in row {
            let h = (a / f64::from(width)) as f32;
            out[idx] = Rect::from_min_size(pos2(free.min.x, y), vec2(width, h));
            y += h;
        }
        Rect::from_min_max(pos2(free.min.x + width, free.min.y), free.max)
    } else {
        // Row along the top edge.
        let width = f64::from(free.width());
        let height = (sum / width) as f32;
        let mut x = free.min.x;
        for &(idx, a) in row {
            let w = (a / f64::from(height)) as f32;
            out[idx] = Rect::from_min_size(pos2(x, free.min.y), vec2(w, height));
            x += w;
        }
        Rect::from_min_max(pos2(free.min.x, free.min.y + height), free.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pie_fractions_cover_a_full_turn() {
        let spans = pie_fractions(&[1.0, 3.0, 0.0, 4.0]);
        assert_eq!(spans[0], (0.0, 0.125));
        assert_eq!(spans[1], (0.125, 0.5));
        assert_eq!(spans[2].0, spans[2].1);
        assert!((spans[3].1 - 1.0).abs() < 1e-12);

        assert!(pie_fractions(&[0.0, 0.0]).iter().all(|(a, b)| a == b));
    }

    #[test]
    fn stacked_layers_accumulate() {
        let stacked = stack_layers(&[vec![1.0, 2.0], vec![0.0, 5.0], vec![3.0, 1.0]]);
        assert_eq!(stacked, vec![vec![1.0, 2.0], vec![1.0, 7.0], vec![4.0, 8.0]]);
        assert!(stack_layers(&[]).is_empty());
    }

    #[test]
    fn arc_spans_requested_angles() {
        let pts = arc_points(Pos2::ZERO, 10.0, 0.0, std::f32::consts::FRAC_PI_2, 4);
        assert_eq!(pts.len(), 5);
        assert!((pts[0].x - 10.0).abs() < 1e-4);
        assert!((pts[4].y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn squarify_areas_are_proportional() {
        let bounds = Rect::from_min_size(pos2(10.0, 20.0), vec2(600.0, 400.0));
        let values = [200.0, 120.0, 60.0, 0.0, 20.0];
        let rects = squarify(&values, bounds);
        let total: f64 = values.iter().sum();
        let bounds_area = f64::from(bounds.area());

        for (rect, &v) in rects.iter().zip(&values) {
            let expected = bounds_area * v / total;
            assert!((f64::from(rect.area()) - expected).abs() < 1.0);
            if v > 0.0 {
                assert!(bounds.expand(0.01).contains_rect(*rect));
            }
        }
        assert_eq!(rects[3].area(), 0.0);
    }

    #[test]
    fn squarify_handles_degenerate_inputs() {
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(squarify(&[], bounds).is_empty());
        assert!(squarify(&[0.0, 0.0], bounds).iter().all(|r| r.area() == 0.0));

        let single = squarify(&[5.0], bounds);
        assert!((single[0].area() - 10_000.0).abs() < 0.5);
    }
}
