//! District Scatter - shooting vs. non-shooting crimes by district
//!
//! Loads a crime CSV, groups it by district and shooting flag, and plots one
//! point per district. A year filter re-aggregates and re-plots the points.

mod charts;
mod cli;
mod config;
mod data;
mod gui;
mod pipeline;

use anyhow::{bail, Context, Result};
use charts::{ChartFormat, StaticChartRenderer};
use cli::{Args, Command, DataArgs, ImageFormat, SummaryFormat};
use config::Config;
use data::{DataLoader, Dataset};
use eframe::egui;
use gui::ScatterApp;
use pipeline::{build_plot, PlotModel};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse_args();
    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .try_init();
}

fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::InitConfig { path } => handle_init_config(path),
        Command::Render {
            data,
            output,
            format,
            open: open_after,
        } => {
            let (config, year) = prepare_config(&args, data)?;
            let dataset = load_dataset(&config)?;
            let model = build_model(&dataset, &config, year.as_deref())?;

            let format = match format {
                Some(ImageFormat::Svg) => ChartFormat::Svg,
                Some(ImageFormat::Png) => ChartFormat::Png,
                None => ChartFormat::from_path(output),
            };
            let drawn = StaticChartRenderer::render_to_file(
                &model.series,
                &model.scales,
                &config.layout,
                output,
                format,
            )
            .with_context(|| format!("Failed to render {}", output.display()))?;
            info!("Drew {} districts to {}", drawn, output.display());
            println!("Wrote {} ({} points)", output.display(), drawn);

            if *open_after {
                open::that(output)
                    .with_context(|| format!("Failed to open {}", output.display()))?;
            }
            Ok(())
        }
        Command::Summary { data, format } => {
            let (config, year) = prepare_config(&args, data)?;
            let dataset = load_dataset(&config)?;
            let model = build_model(&dataset, &config, year.as_deref())?;
            match format {
                SummaryFormat::Json => println!("{}", summary_json(&model)?),
                SummaryFormat::Text => print!("{}", summary_text(&model)),
            }
            Ok(())
        }
        Command::View { data } => {
            let (config, year) = prepare_config(&args, data)?;
            run_viewer(config, year)
        }
    }
}

/// Handle init-config: write the default configuration file.
fn handle_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "{} already exists. Remove it first or edit it manually.",
            path.display()
        );
    }
    let content = Config::default_toml().context("Cannot build the default configuration")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn prepare_config(args: &Args, data: &DataArgs) -> Result<(Config, Option<String>)> {
    let mut config = Config::resolve(args.config.as_deref())?;
    config.merge_with_args(data);
    config.validate()?;
    let year = config.initial_year(data);
    debug!("Year filter: {:?}", year);
    Ok((config, year))
}

fn load_dataset(config: &Config) -> Result<Dataset> {
    let path = &config.data.csv_path;
    DataLoader::load_with_columns(path, &config.required_columns())
        .with_context(|| format!("Could not load crime data from {}", path.display()))
}

fn build_model(dataset: &Dataset, config: &Config, year: Option<&str>) -> Result<PlotModel> {
    build_plot(dataset, &config.plot_settings(), &config.layout, year)
        .context("Failed to aggregate crime data")
}

fn summary_json(model: &PlotModel) -> Result<String> {
    let value = serde_json::json!({
        "year": model.year,
        "table": model.table,
        "points": model.series.points,
        "bounds": model.bounds,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn summary_text(model: &PlotModel) -> String {
    let mut out = format!("Year: {}\n", model.year.as_deref().unwrap_or("all years"));
    if model.table.is_empty() {
        out.push_str("No matching records.\n");
    }
    for entry in model.table.entries() {
        let buckets: Vec<String> = entry
            .values
            .iter()
            .map(|a| {
                let key = if a.key.is_empty() { "(blank)" } else { a.key.as_str() };
                format!("{}={}", key, a.value)
            })
            .collect();
        out.push_str(&format!("{:<12} {}\n", entry.key, buckets.join(", ")));
    }

    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    out.push_str(&format!(
        "x: [{}, {}]  y: [{}, {}]\n",
        fmt(model.bounds.x_min()),
        fmt(model.bounds.x_max()),
        fmt(model.bounds.y_min()),
        fmt(model.bounds.y_max()),
    ));
    out
}

fn run_viewer(config: Config, year: Option<String>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([800.0, 500.0])
            .with_title("District Scatter"),
        ..Default::default()
    };

    eframe::run_native(
        "District Scatter",
        options,
        Box::new(move |cc| Ok(Box::new(ScatterApp::new(cc, config, year)))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {}", e))
}
