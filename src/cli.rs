use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Get the default data directory for chemviz
/// Uses platform-specific data directories:
/// - Linux: ~/.local/share/chemviz
/// - macOS: ~/Library/Application Support/chemviz
/// - Windows: %APPDATA%/chemviz
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map(|p| p.join("chemviz")).unwrap_or_else(|| PathBuf::from(".chemviz"))
}

/// Default location of the optional TOML config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chemviz").join("config.toml"))
}

#[derive(Parser, Debug, Clone)]
#[command(name = "chemviz")]
#[command(about = "Ingest chemical equipment CSV files, summarize them and render reports")]
#[command(version)]
pub struct CliArgs {
    /// SQLite database file (env: CHEMVIZ_DB)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Owner the datasets belong to (env: CHEMVIZ_OWNER)
    #[arg(long, global = true, value_name = "ID")]
    pub owner: Option<String>,

    /// Datasets kept per owner; older ones are evicted on upload
    #[arg(long, global = true, value_name = "K")]
    pub retention: Option<usize>,

    /// TOML config file
    /// Default: ~/.config/chemviz/config.toml (Linux)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Override console width (default: auto-detect)
    #[arg(long, global = true, value_name = "COLUMNS")]
    pub console_width: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Ingest a CSV file and print its summary
    Upload {
        /// CSV file with Equipment Name, Type, Flowrate, Pressure and Temperature columns
        file: PathBuf,
    },

    /// List stored datasets, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one dataset as a text report
    Show {
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a dataset and its records
    Delete { id: i64 },

    /// Write the PDF report for a dataset
    Report {
        id: i64,

        /// Output file (default: report_<source>_<id>.pdf in the report directory)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.retention == Some(0) {
            return Err("--retention must keep at least one dataset".to_string());
        }

        if let Some(owner) = &self.owner
            && owner.trim().is_empty()
        {
            return Err("--owner must not be blank".to_string());
        }

        if self.console_width == Some(0) {
            return Err("--console-width must be positive".to_string());
        }

        if let Command::Upload { file } = &self.command
            && !file.is_file()
        {
            return Err(format!("Upload file not found: {}", file.display()));
        }

        Ok(())
    }
}
