use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Turn a UI screenshot into region-grouped requirement tables"
)]
pub struct Cli {
    /// Show progress and request details
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a screenshot (PNG, JPEG or WEBP) and print the requirements
    Analyze {
        /// Path to the screenshot, or a `data:image/...;base64,` URL
        image: String,

        /// Write one CSV file per region into this directory
        #[clap(long)]
        csv_dir: Option<PathBuf>,

        /// Only output this region
        #[clap(long, short = 'r')]
        region: Option<String>,

        /// Output format when a region is selected
        #[clap(long, value_enum, default_value = "csv", requires = "region")]
        format: ExportFormat,

        /// Print all items as JSON
        #[clap(long, conflicts_with = "region")]
        json: bool,

        /// Copy the selected region to the clipboard as tab-separated text
        #[clap(long, requires = "region")]
        copy: bool,

        /// Use a saved model reply instead of calling the API
        #[clap(long)]
        response_file: Option<PathBuf>,
    },

    /// Manage the Gemini API key
    #[clap(subcommand)]
    Key(KeyCommand),

    /// Show or create the configuration
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Save an API key (prompts when no value is given)
    Set {
        /// The key to save
        #[clap(long)]
        value: Option<String>,
    },

    /// Show the key in use (masked) and where it came from
    Show,

    /// Remove the saved key
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the path to the config file
    Path,

    /// Print the effective configuration
    Show,

    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing config file
        #[clap(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}
