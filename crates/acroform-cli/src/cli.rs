use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// List, fill and transcribe the fields of PDF forms.
#[derive(Debug, Parser)]
#[command(name = "acroform", about, version)]
pub struct Cli {
    /// Log recovered problems and pipeline steps to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List form fields in reading order with their labels
    Fields {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages, plus unplaced fields
        #[arg(long)]
        pages: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Horizontal reach of the nearby-text label search, in points
        #[arg(long, default_value_t = 250.0)]
        label_search_left: f64,
    },

    /// Fill form fields and write the result to a new file
    Fill {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Where to write the filled PDF
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// A field value as NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// JSON object mapping field names to strings or booleans
        #[arg(long, value_name = "JSON_FILE")]
        values: Option<PathBuf>,

        /// Bake values into the page content and remove the form
        #[arg(long)]
        flatten: bool,
    },

    /// Print page transcripts with inline field markers
    Text {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },
}

/// Output format for the text subcommand.
#[derive(Debug, Clone, ValueEnum)]
pub enum TextFormat {
    /// Plain text output
    Text,
    /// JSON output, one object per page
    Json,
}

/// Output format for the fields subcommand.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Plain text (tab-separated)
    Text,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}
