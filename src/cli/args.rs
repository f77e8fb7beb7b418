//! CLI argument definitions using clap.
//!
//! Commands:
//! - civiq timeseries --fixtures <dir> -p dataset_name=crimes -p agg=month
//! - civiq detail --fixtures <dir> -p dataset_name=crimes -p iucr=1150
//! - civiq detail-aggregate --fixtures <dir> -p ...
//! - civiq grid --fixtures <dir> -p ...

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// civiq - a query-condition engine for civic datasets
#[derive(Parser, Debug)]
#[command(name = "civiq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory of dataset fixture files (`<dataset>.json`)
    #[arg(long, default_value = "./fixtures")]
    pub fixtures: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time-bucketed counts across one or many datasets
    Timeseries {
        /// Request parameter, repeatable
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Row-level results for one dataset, newest first
    Detail {
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Bucketed counts for a single dataset with its filters
    DetailAggregate {
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Snap-to-grid point counts as GeoJSON cells
    Grid {
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
