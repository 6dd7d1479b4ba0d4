mod app;
mod cli;
mod color;
mod config;
mod data;
mod export;
mod insight;
mod kpi;
mod report;
mod state;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use app::DashboardApp;
use clap::Parser;
use cli::CliArgs;
use config::DashboardConfig;
use data::model::Dataset;
use eframe::egui;
use state::AppState;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = DashboardConfig::from_args(&args);

    if args.headless {
        return match run_headless(&args, &config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{e:#}");
                ExitCode::FAILURE
            }
        };
    }

    match run_gui(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_dataset(config: &DashboardConfig) -> Result<Dataset> {
    let dataset = match &config.data_path {
        Some(path) => data::loader::load_file(path)?,
        None => data::loader::load_embedded()?,
    };
    log::info!(
        "Loaded {} rows, {} cancer types, years {}–{}",
        dataset.len(),
        dataset.cancer_types.len(),
        dataset.bounds.first,
        dataset.bounds.last
    );
    Ok(dataset)
}

fn run_headless(args: &CliArgs, config: &DashboardConfig) -> Result<()> {
    let dataset = load_dataset(config)?;
    let filter = report::filter_from_args(&dataset, args)?;
    let report = report::Report::build(&dataset, filter, config)?;
    if args.json {
        println!("{}", report.render_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

fn run_gui(config: DashboardConfig) -> eframe::Result {
    let mut state = AppState::new(config.clone());
    match load_dataset(&config) {
        Ok(dataset) => state.set_dataset(dataset),
        Err(e) => {
            log::error!("Failed to load dataset: {e:#}");
            state.set_fatal(format!("{e:#}"));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size),
        ..Default::default()
    };

    eframe::run_native(
        "Cancer Statistics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
