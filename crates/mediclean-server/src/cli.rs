use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediclean")]
#[command(
    author,
    version,
    about = "Medical-record cleaning, anonymization and classifier training"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long, default_value = "mediclean.yaml", env = "MEDICLEAN_CONFIG")]
        config: PathBuf,

        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run the pipeline once on a CSV file and print the report
    Run {
        /// Input CSV file
        file: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "mediclean.yaml", env = "MEDICLEAN_CONFIG")]
        config: PathBuf,

        /// Artifact directory (defaults to the configured processed_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}
