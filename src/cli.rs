use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::document::ResourceKind;

pub const DEFAULT_CONFIG_PATH: &str = "orgmigrate.json";

#[derive(Parser, Debug)]
#[command(
    name = "orgmigrate",
    version,
    about = "Copy dashboards, visualizations and semantic models between orgs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a dashboard together with its visualizations and semantic models.
    MigrateDashboard(MigrateDashboardArgs),
    MigrateVisualization(MigrateVisualizationArgs),
    MigrateSemanticModel(MigrateSemanticModelArgs),
    /// Print one resource as JSON.
    Fetch(FetchArgs),
    List(ListArgs),
    /// Strip server-assigned fields from a saved document. Works offline.
    Sanitize(SanitizeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MigrateDashboardArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(long)]
    pub dashboard: String,

    /// Label of the created dashboard. Defaults to the source label.
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long, default_value = "Cloned Viz - ")]
    pub visualization_label_prefix: String,

    #[arg(long, default_value = "Cloned Model - ")]
    pub semantic_model_label_prefix: String,

    #[arg(long, default_value_t = false)]
    pub without_dependencies: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateVisualizationArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(long)]
    pub visualization_id: String,

    #[arg(long)]
    pub label: Option<String>,

    #[arg(long, default_value = "Cloned Viz - ")]
    pub label_prefix: String,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateSemanticModelArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(long)]
    pub model_api_name: String,

    /// Api name of the copy. Generated from the source api name when unset.
    #[arg(long)]
    pub new_api_name: Option<String>,

    #[arg(long)]
    pub label: Option<String>,

    #[arg(long, default_value = "Cloned Model - ")]
    pub label_prefix: String,

    /// Dataspace of the copy. Defaults to the source model's dataspace.
    #[arg(long)]
    pub dataspace: Option<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OrgRole {
    Source,
    Destination,
}

impl OrgRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = OrgRole::Source)]
    pub org: OrgRole,

    #[arg(long, value_enum)]
    pub kind: ResourceKind,

    #[arg(long)]
    pub id: String,

    /// Print the payload that would be submitted on create instead of the raw document.
    #[arg(long, default_value_t = false)]
    pub sanitized: bool,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = OrgRole::Source)]
    pub org: OrgRole,

    #[arg(long, value_enum)]
    pub kind: ResourceKind,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SanitizeArgs {
    #[arg(long, value_enum)]
    pub kind: ResourceKind,

    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}
