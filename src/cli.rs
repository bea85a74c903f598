//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// District Scatter - shooting vs. non-shooting crimes by district
///
/// Groups a crime CSV by district and shooting flag, then plots one point
/// per district. Pick a year to re-plot just that year's rows.
///
/// Examples:
///   district_scatter render --csv crime.csv -o crime.svg
///   district_scatter render --preset count --year 2017 -o crime.png
///   district_scatter summary --all-years --format json
///   district_scatter view --csv crime.csv
///   district_scatter init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for district_scatter.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the scatter plot to an SVG or PNG file
    Render {
        #[command(flatten)]
        data: DataArgs,

        /// Output file
        #[arg(short, long, default_value = "crime_scatter.svg", value_name = "FILE")]
        output: PathBuf,

        /// Image format (defaults to the output file's extension)
        #[arg(long, value_name = "FORMAT")]
        format: Option<ImageFormat>,

        /// Open the image with the system viewer afterwards
        #[arg(long)]
        open: bool,
    },

    /// Print the aggregate table and axis bounds
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Output format
        #[arg(long, default_value = "text", value_name = "FORMAT")]
        format: SummaryFormat,
    },

    /// Open the interactive viewer with a year dropdown
    View {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Write a default district_scatter.toml
    InitConfig {
        /// Where to write the file
        #[arg(long, default_value = "district_scatter.toml", value_name = "FILE")]
        path: PathBuf,
    },
}

/// Data selection flags shared by every chart command.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DataArgs {
    /// CSV file to load
    #[arg(long, value_name = "FILE", env = "DISTRICT_SCATTER_CSV")]
    pub csv: Option<PathBuf>,

    /// Year to plot
    #[arg(long, value_name = "YEAR", conflicts_with = "all_years")]
    pub year: Option<String>,

    /// Plot every year together
    #[arg(long)]
    pub all_years: bool,

    /// Start from a named preset (applied before the other flags)
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<PresetArg>,

    /// Reduce each bucket by summing a field or counting rows
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Field summed in sum mode
    #[arg(long, value_name = "FIELD")]
    pub sum_field: Option<String>,

    /// Fix the lower bound of the y axis
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub y_min: Option<f64>,

    /// Let the axes follow the selected year instead of every year
    #[arg(long)]
    pub follow_filter: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetArg {
    /// Sum of the amount field
    Amount,
    /// Row counts, y axis starting at 1026
    Count,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Sum,
    Count,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Text,
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level from the verbosity flags.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_args() {
        let args = Args::try_parse_from([
            "district_scatter",
            "render",
            "--csv",
            "crime.csv",
            "--year",
            "2017",
            "--preset",
            "count",
            "-o",
            "out.png",
        ])
        .unwrap();

        match args.command {
            Command::Render { data, output, format, open } => {
                assert_eq!(data.csv, Some(PathBuf::from("crime.csv")));
                assert_eq!(data.year.as_deref(), Some("2017"));
                assert_eq!(data.preset, Some(PresetArg::Count));
                assert_eq!(output, PathBuf::from("out.png"));
                assert_eq!(format, None);
                assert!(!open);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_year_conflicts_with_all_years() {
        let result = Args::try_parse_from([
            "district_scatter",
            "summary",
            "--year",
            "2018",
            "--all-years",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["district_scatter", "summary", "-v", "--format", "json"])
            .unwrap();
        assert_eq!(args.log_level(), Level::DEBUG);
        assert!(matches!(
            args.command,
            Command::Summary {
                format: SummaryFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_y_min() {
        let args =
            Args::try_parse_from(["district_scatter", "summary", "--y-min", "-10"]).unwrap();
        match args.command {
            Command::Summary { data, .. } => assert_eq!(data.y_min, Some(-10.0)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
