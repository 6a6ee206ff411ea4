//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "taxa")]
#[command(about = "taxa - catalog competition math problems under a hierarchical tag taxonomy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the catalog database
    #[arg(long, global = true, env = "TAXA_DB", default_value = "taxa.db")]
    pub db: PathBuf,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the tag hierarchy
    #[command(subcommand)]
    Tag(TagCommands),

    /// Manage problem records
    #[command(subcommand)]
    Problem(ProblemCommands),
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Create a single tag
    Create {
        /// Slug id, e.g. angle-chase
        id: String,

        /// Optional longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Parent tag id (omit for a root tag)
        #[arg(short, long)]
        parent: Option<String>,

        /// Create an umbrella tag (not usable as a filter). Required for
        /// root tags, which may never be filters.
        #[arg(short, long)]
        umbrella: bool,
    },

    /// Show one tag with its ancestors and children
    Show {
        /// Tag id or display name ("Angle Chase")
        name: String,
    },

    /// Replace a tag's description
    Edit {
        id: String,
        #[arg(short, long)]
        description: String,
    },

    /// Move a tag under a new parent, or detach it to a root
    Move {
        id: String,

        /// New parent tag id
        #[arg(short, long, conflicts_with = "root", required_unless_present = "root")]
        parent: Option<String>,

        /// Detach the tag to a root
        #[arg(long)]
        root: bool,
    },

    /// Delete a tag (refused while it has children)
    Rm { id: String },

    /// List root tags, or the children of a tag
    Ls {
        /// Parent tag id; omit to list roots
        parent: Option<String>,
    },

    /// Print the whole tag tree
    Tree,

    /// Create several children under one parent, atomically
    AddChildren {
        /// Parent tag id
        parent: String,

        /// Space/comma/newline separated child names
        names: String,

        /// Create the children as umbrella tags instead of filters
        #[arg(short, long)]
        umbrella: bool,
    },

    /// Enable or disable `use_filter` across a set of tags
    Filter {
        /// Tag ids to update
        #[arg(required = true)]
        ids: Vec<String>,

        /// Enable filtering (default is disable)
        #[arg(long)]
        on: bool,
    },
}

#[derive(Subcommand)]
pub enum ProblemCommands {
    /// Add a problem record
    Add {
        /// Short one-line description, e.g. "Fiendish inequality"
        description: String,

        /// Problem source, unique, e.g. "IMO 2023/6"
        #[arg(short, long)]
        source: Option<String>,

        /// e.g. "Abel George Mathew (IND)"
        #[arg(short, long)]
        author: Option<String>,

        /// MOHS hardness, 0..=60 in steps of 5
        #[arg(long)]
        hardness: Option<u8>,

        /// Problem number within its contest or set
        #[arg(short = 'n', long)]
        number: Option<u32>,

        /// Link to the problem on AoPS
        #[arg(long)]
        aops_url: Option<String>,

        /// Read-only git pull link
        #[arg(long)]
        git_url: Option<String>,

        /// Proposal date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },

    /// Show one problem with its tags
    Show { id: i64 },

    /// Delete a problem
    Rm { id: i64 },

    /// List problems, optionally filtered by a tag (descendants included)
    Ls {
        /// Tag id to filter by
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Attach a tag to a problem
    Tag { id: i64, tag: String },

    /// Detach a tag from a problem
    Untag { id: i64, tag: String },
}
