use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use eframe::egui::ColorImage;
use serde::Serialize;

use crate::data::aggregate::DerivedSeries;
use crate::data::filter::FilterState;
use crate::insight::{ChartId, Insight, describe};
use crate::kpi::Kpis;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Snapshot of the current dashboard
// ---------------------------------------------------------------------------

/// Everything the dashboard currently shows, in serialisable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub filter: FilterState,
    pub kpis: Option<Kpis>,
    pub derived: DerivedSeries,
    pub insights: Vec<Insight>,
}

impl Snapshot {
    pub fn new(
        filter: &FilterState,
        kpis: Option<&Kpis>,
        derived: &DerivedSeries,
        horizon: i32,
    ) -> Self {
        Self {
            filter: filter.clone(),
            kpis: kpis.cloned(),
            derived: derived.clone(),
            insights: ChartId::ALL
                .iter()
                .map(|&chart| describe(chart, filter, kpis, horizon))
                .collect(),
        }
    }

    /// Capture the app state, if a dataset is loaded and derived.
    pub fn capture(state: &AppState) -> Option<Self> {
        let filter = state.filters.as_ref()?;
        let derived = state.derived.as_ref()?;
        Some(Self::new(
            filter,
            state.kpis.as_ref(),
            derived,
            state.config.projection_years,
        ))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialising snapshot")
    }
}

/// Write a snapshot as pretty JSON.
pub fn write_json(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let text = snapshot.to_json()?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported snapshot to {}", path.display());
    Ok(())
}

/// Encode a captured viewport image as PNG.
pub fn save_png(image: &ColorImage, path: &Path) -> Result<()> {
    let [width, height] = image.size;
    if width == 0 || height == 0 {
        bail!("screenshot is empty");
    }
    image::save_buffer(
        path,
        image.as_raw(),
        u32::try_from(width).context("screenshot too wide")?,
        u32::try_from(height).context("screenshot too tall")?,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {width}×{height} screenshot to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn pick_png_path() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export dashboard image")
        .set_file_name("dashboard.png")
        .add_filter("PNG image", &["png"])
        .save_file()
}

pub fn pick_json_path() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export dashboard data")
        .set_file_name("dashboard.json")
        .add_filter("JSON", &["json"])
        .save_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::filter::{filter_records, init_filter_state};
    use crate::data::loader::load_embedded;
    use eframe::egui::Color32;

    #[test]
    fn snapshot_round_trips_through_disk() {
        let ds = load_embedded().unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(ds);
        let snapshot = Snapshot::capture(&state).unwrap();
        assert_eq!(snapshot.insights.len(), ChartId::ALL.len());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        write_json(&snapshot, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["filter"]["metric"], "ASR (World)");
        assert_eq!(value["derived"]["treemap"]["year"], 2023);
        assert!(value["kpis"]["avg_rate"].is_number());
    }

    #[test]
    fn snapshot_requires_loaded_data() {
        let state = AppState::new(DashboardConfig::default());
        assert!(Snapshot::capture(&state).is_none());
    }

    #[test]
    fn snapshots_of_equal_state_are_identical() {
        let ds = load_embedded().unwrap();
        let filter = init_filter_state(&ds).with_projection(true);
        let config = DashboardConfig::default();
        let rows = filter_records(&ds.records, &filter);
        let a = DerivedSeries::from_rows(&ds, &filter, &rows, &config).unwrap();
        let b = DerivedSeries::from_rows(&ds, &filter, &rows, &config).unwrap();
        let ja = Snapshot::new(&filter, None, &a, 5).to_json().unwrap();
        let jb = Snapshot::new(&filter, None, &b, 5).to_json().unwrap();
        assert_eq!(ja, jb);
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let image = ColorImage::new([4, 3], Color32::RED);
        save_png(&image, &path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));

        let empty = ColorImage::new([0, 0], Color32::RED);
        assert!(save_png(&empty, &dir.path().join("empty.png")).is_err());
    }
}
