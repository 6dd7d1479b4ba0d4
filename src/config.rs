use std::path::PathBuf;

use crate::cli::CliArgs;

/// Tunables for the pipeline and the window.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Year shown by the treemap, independent of the year filter.
    pub snapshot_year: i32,
    /// How far past the last observed year a projection extends.
    pub projection_years: i32,
    /// Maximum number of bars in the ranking chart.
    pub bar_limit: usize,
    /// Label of the synthetic treemap root.
    pub root_label: String,
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    /// External dataset to load instead of the embedded one.
    pub data_path: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            snapshot_year: 2023,
            projection_years: 5,
            bar_limit: 15,
            root_label: "All Cancers".to_string(),
            window_size: [1400.0, 900.0],
            min_window_size: [800.0, 500.0],
            data_path: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_args(args: &CliArgs) -> Self {
        Self {
            data_path: args.data.clone(),
            ..Self::default()
        }
    }
}
