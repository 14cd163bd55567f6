use super::{file_error, load_structure, write_json};
use crate::cli::AnalyzeArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use surfpatch::core::io::conservation::ConservationTable;
use surfpatch::core::io::pae::PaeMatrix;
use surfpatch::engine::progress::ProgressReporter;
use surfpatch::workflows;
use tracing::{info, warn};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config =
        PartialAnalysisConfig::load(args.config.as_deref())?.merge_with_analyze_args(&args)?;

    let structure = load_structure(&args.input)?;

    info!("Loading conservation scores from {:?}", &args.conservation);
    let conservation = ConservationTable::read_from_path(&args.conservation)
        .map_err(|e| file_error(&args.conservation, e))?;
    if conservation.is_empty() {
        warn!("Conservation table is empty; no residue will be scored.");
    }

    let pae = match &args.pae {
        Some(path) => {
            info!("Loading PAE matrix from {:?}", path);
            Some(PaeMatrix::read_from_path(path).map_err(|e| file_error(path, e))?)
        }
        None => None,
    };
    if pae.is_none() && config.domains.is_some() {
        info!("No PAE matrix given; chains are analysed whole.");
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting surface patch analysis...");
    let result =
        workflows::analyze::run(&structure, &conservation, pae.as_ref(), &config, &reporter)?;

    write_json(Some(&args.output), &result)?;

    let units = result.iter().count();
    let failed = result.failed_count();
    if failed > 0 {
        warn!(failed, "Some units could not be analysed.");
        println!("Warning: {failed} of {units} unit(s) failed; see the output for details.");
    }
    println!(
        "✓ Results for {} unit(s) written to: {}",
        units,
        args.output.display()
    );
    Ok(())
}
