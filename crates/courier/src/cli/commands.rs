//! CLI command definitions.

use courier::{SearchSort, Sort, TimeWindow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Courier - resilient relayed reader for a content platform's JSON API
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Resilient relayed reader for a content platform's JSON API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Load configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one page of a listing
    Listing {
        /// Category name; omit for the front page
        category: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t = Sort::Hot)]
        sort: Sort,

        /// Time window for `top`
        #[arg(long, value_enum)]
        time: Option<TimeWindow>,

        /// Entries per page
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor returned by the previous page
        #[arg(long)]
        after: Option<String>,

        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Fetch a post and its comment tree
    Comments {
        /// Permalink path or URL of the post
        permalink: String,

        /// Maximum number of comments
        #[arg(long)]
        limit: Option<u32>,

        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Search posts
    Search {
        /// Search text
        query: String,

        /// Restrict results to this category
        #[arg(long)]
        scope: Option<String>,

        /// Result ordering
        #[arg(long, value_enum, default_value_t = SearchSort::Relevance)]
        sort: SearchSort,

        /// Time window
        #[arg(long, value_enum)]
        time: Option<TimeWindow>,

        /// Entries per page
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor returned by the previous page
        #[arg(long)]
        after: Option<String>,

        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Show metadata for a category
    About {
        /// Category name
        name: String,

        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Fetch a comment tree and expand every truncated branch once
    Expand {
        /// Permalink path or URL of the post
        permalink: String,
    },
}
