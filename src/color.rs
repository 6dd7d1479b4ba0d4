use std::str::FromStr;

use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette: one color per selected cancer type
// ---------------------------------------------------------------------------

/// Fixed, ordered series palette.
pub const PALETTE: [&str; 30] = [
    "#0d9488", "#f43f5e", "#3b82f6", "#eab308", "#8b5cf6",
    "#f97316", "#06b6d4", "#ec4899", "#10b981", "#6366f1",
    "#d946ef", "#f59e0b", "#14b8a6", "#0ea5e9", "#84cc16",
    "#ef4444", "#064e3b", "#4338ca", "#be185d", "#a21caf",
    "#1e40af", "#15803d", "#b45309", "#7c3aed", "#db2777",
    "#0891b2", "#059669", "#78350f", "#4c1d95", "#9f1239",
];

/// Color for the `index`-th selected type; wraps around the palette.
pub fn color_for(index: usize) -> Color32 {
    parse_hex(PALETTE[index % PALETTE.len()]).unwrap_or(Color32::GRAY)
}

fn parse_hex(hex: &str) -> Option<Color32> {
    let rgb = Srgb::<u8>::from_str(hex).ok()?;
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

/// Legend rows for the selected types, in selection order.
pub fn legend_entries<'a>(types: impl IntoIterator<Item = &'a str>) -> Vec<(String, Color32)> {
    types
        .into_iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), color_for(i)))
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential scales
// ---------------------------------------------------------------------------

const SCALE_LOW: (u8, u8, u8) = (0xff, 0xf5, 0xf0);
const SCALE_MID: (u8, u8, u8) = (0xfb, 0x6a, 0x4a);
const SCALE_HIGH: (u8, u8, u8) = (0x67, 0x00, 0x0d);

/// White → red → dark red, for `t` in `[0, 1]` (clamped).
pub fn severity_color(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.0 };
    let (from, to, local) = if t < 0.5 {
        (SCALE_LOW, SCALE_MID, t * 2.0)
    } else {
        (SCALE_MID, SCALE_HIGH, (t - 0.5) * 2.0)
    };
    mix(from, to, local)
}

const HEAT_LOW: (u8, u8, u8) = (0xf0, 0xfd, 0xfa);
const HEAT_HIGH: (u8, u8, u8) = (0x13, 0x4e, 0x4a);

/// Pale → deep teal, for `t` in `[0, 1]` (clamped).
pub fn heat_color(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.0 };
    mix(HEAT_LOW, HEAT_HIGH, t)
}

/// Position of `value` inside `[lo, hi]`, 0 for a degenerate range.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi - lo <= f64::EPSILON {
        0.0
    } else {
        (value - lo) / (hi - lo)
    }
}

fn mix(from: (u8, u8, u8), to: (u8, u8, u8), t: f32) -> Color32 {
    let a: LinSrgb = Srgb::new(from.0, from.1, from.2).into_format::<f32>().into_linear();
    let b: LinSrgb = Srgb::new(to.0, to.1, to.2).into_format::<f32>().into_linear();
    let out: Srgb<u8> = Srgb::<f32>::from_linear(a.mix(b, t)).into_format();
    Color32::from_rgb(out.red, out.green, out.blue)
}

/// Black or white, whichever reads better on `background`.
pub fn contrast_text(background: Color32) -> Color32 {
    let luma = 0.299 * f32::from(background.r())
        + 0.587 * f32::from(background.g())
        + 0.114 * f32::from(background.b());
    if luma > 150.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn palette_parses_and_is_distinct() {
        let colors: HashSet<Color32> = (0..PALETTE.len()).map(color_for).collect();
        assert_eq!(colors.len(), PALETTE.len());
        assert!(!colors.contains(&Color32::GRAY));
        assert_eq!(color_for(0), Color32::from_rgb(0x0d, 0x94, 0x88));
    }

    #[test]
    fn color_wraps_by_index() {
        assert_eq!(color_for(31), color_for(1));
        assert_eq!(color_for(60), color_for(0));
    }

    #[test]
    fn legend_follows_selection_order() {
        let legend = legend_entries(["Breast", "Lung"]);
        assert_eq!(legend[0], ("Breast".to_string(), color_for(0)));
        assert_eq!(legend[1], ("Lung".to_string(), color_for(1)));
    }

    fn near(a: Color32, b: Color32) -> bool {
        let d = |x: u8, y: u8| (i16::from(x) - i16::from(y)).abs() <= 1;
        d(a.r(), b.r()) && d(a.g(), b.g()) && d(a.b(), b.b())
    }

    #[test]
    fn severity_scale_endpoints() {
        assert!(near(severity_color(0.0), Color32::from_rgb(0xff, 0xf5, 0xf0)));
        assert!(near(severity_color(1.0), Color32::from_rgb(0x67, 0x00, 0x0d)));
        assert_eq!(severity_color(7.0), severity_color(1.0));
        assert_eq!(severity_color(f64::NAN), severity_color(0.0));
        assert!(near(heat_color(1.0), Color32::from_rgb(0x13, 0x4e, 0x4a)));
        assert_eq!(normalize(5.0, 5.0, 5.0), 0.0);
        assert_eq!(normalize(7.5, 5.0, 10.0), 0.5);
    }

    #[test]
    fn text_contrast_flips_on_dark_backgrounds() {
        assert_eq!(contrast_text(Color32::WHITE), Color32::BLACK);
        assert_eq!(contrast_text(Color32::from_rgb(0x67, 0x00, 0x0d)), Color32::WHITE);
    }
}
