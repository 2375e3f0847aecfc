//! CLI commands using clap

use crate::domain::entities::{FileCategory, FileTypeSelection};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Reclaim - File Recovery Tool
///
/// Copies still-listed files of the selected types off a volume and, with
/// --deep-scan, carves raw device bytes for known file signatures.
#[derive(Parser)]
#[command(name = "reclaim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recover files from storage volumes", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recover files from a volume
    Recover {
        /// Mount point, drive root, device node or image file
        volume: String,

        /// Base directory; a recovered_files_<timestamp> folder is created inside
        #[arg(short, long)]
        output: PathBuf,

        /// Extensions to recover (pdf,jpg,...)
        #[arg(short = 't', long, value_delimiter = ',')]
        types: Vec<String>,

        /// Add every extension of a category
        #[arg(long, value_enum, value_delimiter = ',')]
        category: Vec<CategoryArg>,

        /// Also carve raw device bytes for signatures
        #[arg(long)]
        deep_scan: bool,

        /// Device to carve instead of the one behind VOLUME
        #[arg(long)]
        raw_device: Option<String>,

        /// Carving chunk size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,

        /// TOML file with scan options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a JSON job report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List supported file signatures
    ListSignatures,

    /// Show device information
    Info {
        /// Path to device or image file
        device: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Documents,
    Images,
    Videos,
    Audio,
    Archives,
}

impl From<CategoryArg> for FileCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Documents => FileCategory::Documents,
            CategoryArg::Images => FileCategory::Images,
            CategoryArg::Videos => FileCategory::Videos,
            CategoryArg::Audio => FileCategory::Audio,
            CategoryArg::Archives => FileCategory::Archives,
        }
    }
}

/// Builds the selection from --types and --category
pub fn build_selection(types: &[String], categories: &[CategoryArg]) -> FileTypeSelection {
    let mut selection = FileTypeSelection::new(types);
    for category in categories {
        selection.extend_category((*category).into());
    }
    selection
}
