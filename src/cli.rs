use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dune-gas-chart", version, about = "Monthly blockchain gas fees from Dune, as a stacked bar chart")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the query once and write the chart as SVG
    Render {
        /// Output file, defaults to CHART_OUTPUT or chart.svg
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the query once and print the pivoted rows as JSON
    Rows,
    /// Serve the dashboard page; the query runs once at startup
    Serve {
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
}
