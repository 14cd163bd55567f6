use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "surfpatch - find conserved, solvent-accessible patches on protein structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to analyse units in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score surface residues and extract conserved patches.
    Analyze(AnalyzeArgs),
    /// Compute residue accessibility and spatial neighbours only.
    Surface(SurfaceArgs),
    /// Split a predicted structure into domains using its PAE matrix.
    Domains(DomainsArgs),
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    // --- Core Arguments ---
    /// Path to the input structure in PDB format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the conservation scores (JSON, or CSV with a `.csv` extension).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub conservation: PathBuf,

    /// Path for the JSON result.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Predicted aligned error matrix (JSON) used to split chains into domains.
    #[arg(long, value_name = "PATH")]
    pub pae: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Overrides ---
    /// Override the maximum number of patches per unit.
    #[arg(short = 'n', long, value_name = "INT")]
    pub iterations: Option<usize>,

    /// Override the minimum atom gap (Å) that opens a surface face.
    #[arg(long, value_name = "FLOAT")]
    pub probe_gap: Option<f64>,

    /// Disable domain splitting, even if a PAE matrix is given.
    #[arg(long)]
    pub no_domains: bool,

    /// Disable cavity peeling; only the mesh hull counts as surface.
    #[arg(long)]
    pub no_peel: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S centrality.max-patches=5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `surface` subcommand.
#[derive(Args, Debug)]
pub struct SurfaceArgs {
    /// Path to the input structure in PDB format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Restrict the computation to one chain.
    #[arg(long, value_name = "ID")]
    pub chain: Option<char>,

    /// Path for the JSON result. Printed to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the minimum atom gap (Å) that opens a surface face.
    #[arg(long, value_name = "FLOAT")]
    pub probe_gap: Option<f64>,

    /// Disable cavity peeling; only the mesh hull counts as surface.
    #[arg(long)]
    pub no_peel: bool,
}

/// Arguments for the `domains` subcommand.
#[derive(Args, Debug)]
pub struct DomainsArgs {
    /// Path to the input structure in PDB format; its B-factors are read as pLDDT.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Predicted aligned error matrix (JSON).
    #[arg(long, required = true, value_name = "PATH")]
    pub pae: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
