use std::f32::consts::TAU;

use eframe::egui::{
    self, Align2, FontId, Rect, Sense, Shape, Stroke, Ui, pos2, vec2,
};
use egui_plot::{Bar, BarChart, Line, LineStyle, Plot, PlotPoints};
use num_format::{Locale, ToFormattedString};

use crate::color::{color_for, contrast_text, heat_color, normalize, severity_color};
use crate::config::DashboardConfig;
use crate::data::aggregate::{
    AreaSeries, BarEntry, DerivedSeries, HeatmapGrid, PieSlice, TreemapSeries, TrendLine,
};
use crate::data::filter::FilterState;
use crate::insight::ChartId;

use super::layout::{arc_points, pie_fractions, squarify, stack_layers};

// ---------------------------------------------------------------------------
// Chart dispatch
// ---------------------------------------------------------------------------

/// Draw one chart card's body at the given height.
pub fn draw_chart(
    ui: &mut Ui,
    chart: ChartId,
    derived: &DerivedSeries,
    filter: &FilterState,
    config: &DashboardConfig,
    height: f32,
) {
    match chart {
        ChartId::Trend => trend_chart(ui, &derived.trend, filter, config, height),
        ChartId::Bar => bar_chart(ui, &derived.bar, filter, height),
        ChartId::Pie => pie_chart(ui, &derived.pie, height),
        ChartId::Area => area_chart(ui, &derived.area, filter, height),
        ChartId::Treemap => treemap_chart(ui, &derived.treemap, filter, height),
        ChartId::Heatmap => heatmap_chart(ui, &derived.heatmap, height),
    }
}

fn empty_notice(ui: &mut Ui, height: f32, text: &str) {
    ui.allocate_ui(vec2(ui.available_width(), height), |ui: &mut Ui| {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.weak(text);
        });
    });
}

// ---------------------------------------------------------------------------
// Trend lines (+ projection)
// ---------------------------------------------------------------------------

fn trend_chart(
    ui: &mut Ui,
    lines: &[TrendLine],
    filter: &FilterState,
    config: &DashboardConfig,
    height: f32,
) {
    if lines.is_empty() {
        empty_notice(ui, height, "No rows match the current filters");
        return;
    }

    let x_max = filter.year_max
        + if filter.show_projection {
            config.projection_years
        } else {
            0
        };

    Plot::new("trend_plot")
        .height(height)
        .x_axis_label("Year")
        .y_axis_label(filter.metric.column_name())
        .include_x(f64::from(filter.year_min))
        .include_x(f64::from(x_max))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for line in lines {
                let color = color_for(line.color_index);
                plot_ui.line(
                    Line::new(PlotPoints::from(line.points.clone()))
                        .name(&line.cancer_type)
                        .color(color)
                        .width(2.5),
                );

                if let Some(proj) = &line.projection {
                    plot_ui.line(
                        Line::new(PlotPoints::from(proj.points.to_vec()))
                            .name(format!("{} (projection)", line.cancer_type))
                            .color(color)
                            .width(1.0)
                            .style(LineStyle::dotted_dense()),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Ranked bars
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, entries: &[BarEntry], filter: &FilterState, height: f32) {
    if entries.is_empty() {
        empty_notice(ui, height, "No rows match the current filters");
        return;
    }

    let labels: Vec<String> = entries.iter().map(|e| e.cancer_type.clone()).collect();
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            Bar::new(i as f64, e.mean)
                .name(&e.cancer_type)
                .fill(color_for(e.color_index))
                .width(0.7)
        })
        .collect();

    Plot::new("bar_plot")
        .height(height)
        .y_axis_label(format!("Avg {}", filter.metric))
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels
                .get(idx as usize)
                .map(|l| abbreviate(l, 12))
                .unwrap_or_default()
        })
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn abbreviate(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let head: String = label.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Donut
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, slices: &[PieSlice], height: f32) {
    let values: Vec<f64> = slices.iter().map(|s| s.sum).collect();
    if slices.is_empty() || values.iter().all(|v| *v <= 0.0) {
        empty_notice(ui, height, "Nothing to apportion");
        return;
    }

    let size = vec2(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let center = rect.center();
    let radius = rect.width().min(rect.height()) * 0.45;
    let hole = radius * 0.4;
    // Start at twelve o'clock.
    let offset = -TAU / 4.0;

    let spans = pie_fractions(&values);
    for (slice, &(from, to)) in slices.iter().zip(&spans) {
        if to <= from {
            continue;
        }
        let a0 = offset + from as f32 * TAU;
        let a1 = offset + to as f32 * TAU;
        let color = color_for(slice.color_index);

        // Fan of convex wedges, at most ~6° each.
        let steps = (((a1 - a0) / TAU) * 60.0).ceil().max(1.0) as usize;
        let arc = arc_points(center, radius, a0, a1, steps);
        for pair in arc.windows(2) {
            painter.add(Shape::convex_polygon(
                vec![center, pair[0], pair[1]],
                color,
                Stroke::NONE,
            ));
        }

        let share = to - from;
        if share > 0.04 {
            let mid = (a0 + a1) / 2.0;
            let at = center + (hole + radius) / 2.0 * vec2(mid.cos(), mid.sin());
            painter.text(
                at,
                Align2::CENTER_CENTER,
                format!("{:.0}%", share * 100.0),
                FontId::proportional(12.0),
                contrast_text(color),
            );
        }
    }
    painter.circle_filled(center, hole, ui.visuals().panel_fill);

    if let Some(pointer) = response.hover_pos() {
        let d = pointer - center;
        if d.length() <= radius && d.length() >= hole {
            let turn = ((d.y.atan2(d.x) - offset).rem_euclid(TAU) / TAU) as f64;
            if let Some((slice, (from, to))) = slices
                .iter()
                .zip(&spans)
                .find(|(_, (from, to))| turn >= *from && turn < *to)
            {
                response.on_hover_text_at_pointer(format!(
                    "{}\n{:.2} ({:.1}%)",
                    slice.cancer_type,
                    slice.sum,
                    (to - from) * 100.0
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stacked area
// ---------------------------------------------------------------------------

fn area_chart(ui: &mut Ui, area: &AreaSeries, filter: &FilterState, height: f32) {
    if area.layers.is_empty() {
        empty_notice(ui, height, "No rows match the current filters");
        return;
    }

    let values: Vec<Vec<f64>> = area.layers.iter().map(|l| l.values.clone()).collect();
    let stacked = stack_layers(&values);
    let years: Vec<f64> = area.years.iter().map(|&y| f64::from(y)).collect();

    Plot::new("area_plot")
        .height(height)
        .x_axis_label("Year")
        .y_axis_label(format!("Stacked {}", filter.metric))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            // Top of the stack first so lower bands paint over it.
            for (layer, totals) in area.layers.iter().zip(&stacked).rev() {
                let points: PlotPoints = years
                    .iter()
                    .zip(totals)
                    .map(|(&x, &y)| [x, y])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&layer.cancer_type)
                        .color(color_for(layer.color_index))
                        .width(1.0)
                        .fill(0.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Snapshot treemap
// ---------------------------------------------------------------------------

fn treemap_chart(ui: &mut Ui, treemap: &TreemapSeries, filter: &FilterState, height: f32) {
    ui.label(
        egui::RichText::new(format!(
            "{} · {} · {} cases",
            treemap.root_label,
            treemap.year,
            format_count(treemap.root_total)
        ))
        .strong(),
    );
    if treemap.leaves.is_empty() || treemap.root_total == 0 {
        empty_notice(ui, height - 20.0, "No records for the snapshot year");
        return;
    }

    let size = vec2(ui.available_width(), height - 20.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let bounds = response.rect.shrink(2.0);

    let sizes: Vec<f64> = treemap.leaves.iter().map(|l| l.total_cases as f64).collect();
    let rects = squarify(&sizes, bounds);

    let mut hovered = None;
    for (leaf, rect) in treemap.leaves.iter().zip(&rects) {
        if rect.area() < 1.0 {
            continue;
        }
        let cell = rect.shrink(1.0);
        let fill = severity_color(treemap.shade(leaf.value));
        painter.rect_filled(cell, 2.0, fill);

        if cell.width() > 60.0 && cell.height() > 30.0 {
            painter.text(
                cell.left_top() + vec2(4.0, 4.0),
                Align2::LEFT_TOP,
                format!("{}\n{}", leaf.cancer_type, format_count(leaf.total_cases)),
                FontId::proportional(11.0),
                contrast_text(fill),
            );
        }
        if response.hover_pos().is_some_and(|p| rect.contains(p)) {
            hovered = Some(leaf);
        }
    }

    if let Some(leaf) = hovered {
        response.on_hover_text_at_pointer(format!(
            "{}\nCases: {}\n{}: {:.2}",
            leaf.cancer_type,
            format_count(leaf.total_cases),
            filter.metric,
            leaf.value
        ));
    }
}

/// Thousands-separated integer, e.g. `12,345`.
pub fn format_count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn heatmap_chart(ui: &mut Ui, grid: &HeatmapGrid, height: f32) {
    if grid.years.is_empty() || grid.rows.is_empty() {
        empty_notice(ui, height, "No rows match the current filters");
        return;
    }

    let size = vec2(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;

    let label_width = (rect.width() * 0.3).min(170.0);
    let axis_height = 18.0;
    let area = Rect::from_min_max(
        pos2(rect.min.x + label_width, rect.min.y),
        pos2(rect.max.x, rect.max.y - axis_height),
    );
    let cell_w = area.width() / grid.years.len() as f32;
    let cell_h = area.height() / grid.rows.len() as f32;
    let max = grid.max_value();
    let text_color = ui.visuals().text_color();

    let mut hovered = None;
    for (r, row) in grid.rows.iter().enumerate() {
        let y = area.min.y + r as f32 * cell_h;
        if cell_h >= 9.0 {
            painter.text(
                pos2(area.min.x - 4.0, y + cell_h / 2.0),
                Align2::RIGHT_CENTER,
                abbreviate(&row.cancer_type, 22),
                FontId::proportional(cell_h.clamp(9.0, 12.0)),
                text_color,
            );
        }
        for (c, &value) in row.values.iter().enumerate() {
            let cell = Rect::from_min_size(
                pos2(area.min.x + c as f32 * cell_w, y),
                vec2(cell_w, cell_h),
            );
            painter.rect_filled(cell.shrink(0.5), 0.0, heat_color(normalize(value, 0.0, max)));
            if response.hover_pos().is_some_and(|p| cell.contains(p)) {
                hovered = Some((row.cancer_type.as_str(), grid.years[c], value));
            }
        }
    }

    // At most about six year labels.
    let every = (grid.years.len() / 6).max(1);
    for (c, year) in grid.years.iter().enumerate().step_by(every) {
        painter.text(
            pos2(area.min.x + (c as f32 + 0.5) * cell_w, area.max.y + 2.0),
            Align2::CENTER_TOP,
            year.to_string(),
            FontId::proportional(11.0),
            text_color,
        );
    }

    if let Some((cancer_type, year, value)) = hovered {
        response.on_hover_text_at_pointer(format!("{cancer_type}\nYear: {year}\nValue: {value:.2}"));
    }
}
