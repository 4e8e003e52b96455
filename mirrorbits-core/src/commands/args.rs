// src/commands/args.rs
//! Per-verb arguments. Each struct is parsed on its own once the dispatcher
//! has picked the verb.

use clap::{ArgAction, Parser};

/// Arguments for verbs that take no arguments at all.
#[derive(Parser, Debug, Clone, Default)]
pub struct NoArgs {}

/// A single mirror identifier or any unique substring of it.
#[derive(Parser, Debug, Clone)]
pub struct TargetArgs {
    /// Identifier (or a unique part of it)
    pub identifier: String,
}

#[derive(Parser, Debug, Clone, Default)]
pub struct AddArgs {
    /// Unique identifier of the new mirror
    pub identifier: String,
    /// HTTP base URL
    #[arg(long)]
    pub http: Option<String>,
    /// RSYNC base URL (for scanning only)
    #[arg(long, default_value = "")]
    pub rsync: String,
    /// FTP base URL (for scanning only)
    #[arg(long, default_value = "")]
    pub ftp: String,
    /// Name of the sponsor
    #[arg(long, default_value = "")]
    pub sponsor_name: String,
    /// URL of the sponsor
    #[arg(long, default_value = "")]
    pub sponsor_url: String,
    /// URL of a logo to display for this mirror
    #[arg(long, default_value = "")]
    pub sponsor_logo: String,
    /// Admin's name
    #[arg(long, default_value = "")]
    pub admin_name: String,
    /// Admin's email
    #[arg(long, default_value = "")]
    pub admin_email: String,
    /// Associated data to return when the mirror is selected (i.e. json document)
    #[arg(long, default_value = "")]
    pub custom_data: String,
    /// The mirror should only handle its continent
    #[arg(long)]
    pub continent_only: bool,
    /// The mirror should only handle its country
    #[arg(long)]
    pub country_only: bool,
    /// The mirror should only handle clients in the same AS number
    #[arg(long)]
    pub as_only: bool,
    /// Weight to give to the mirror during selection
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub score: i64,
}

#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Print HTTP addresses
    #[arg(long)]
    pub http: bool,
    /// Print rsync addresses
    #[arg(long)]
    pub rsync: bool,
    /// Print FTP addresses
    #[arg(long)]
    pub ftp: bool,
    /// Print the state of the mirror
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub state: bool,
    /// List disabled mirrors only
    #[arg(long)]
    pub disabled: bool,
    /// List enabled mirrors only
    #[arg(long)]
    pub enabled: bool,
    /// List only mirrors currently down
    #[arg(long)]
    pub down: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Output format (mirmon)
    pub format: String,
    /// Export rsync URLs
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub rsync: bool,
    /// Export http URLs
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub http: bool,
    /// Export ftp URLs
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub ftp: bool,
    /// Export disabled mirrors
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub disabled: bool,
}
