use super::{load_structure, write_json};
use crate::cli::SurfaceArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use surfpatch::workflows;
use tracing::info;

pub fn run(args: SurfaceArgs) -> Result<()> {
    let config =
        PartialAnalysisConfig::load(args.config.as_deref())?.merge_with_surface_args(&args)?;
    let structure = load_structure(&args.input)?;

    let reports = workflows::surface::run(&structure, args.chain, &config)?;
    info!(chains = reports.len(), "Surface computed.");

    write_json(args.output.as_deref(), &reports)?;
    if let Some(path) = &args.output {
        println!("✓ Surface of {} chain(s) written to: {}", reports.len(), path.display());
    }
    Ok(())
}
