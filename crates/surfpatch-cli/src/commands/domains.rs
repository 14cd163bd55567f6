use super::{file_error, load_structure};
use crate::cli::DomainsArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use surfpatch::core::io::pae::PaeMatrix;
use surfpatch::workflows;
use tracing::info;

pub fn run(args: DomainsArgs) -> Result<()> {
    let config =
        PartialAnalysisConfig::load(args.config.as_deref())?.merge_with_domains_args(&args)?;
    let structure = load_structure(&args.input)?;

    info!("Loading PAE matrix from {:?}", &args.pae);
    let pae = PaeMatrix::read_from_path(&args.pae).map_err(|e| file_error(&args.pae, e))?;

    let domains = workflows::domains::run(&structure, &pae, &config)?;
    if domains.is_empty() {
        println!("No domains found; the structure would be analysed as whole chains.");
        return Ok(());
    }
    for (i, members) in domains.iter().enumerate() {
        println!(
            "Domain {} ({} residues): {}",
            i + 1,
            members.len(),
            format_ranges(members)
        );
    }
    Ok(())
}

/// Compresses ascending residue numbers into `1-4,7,9-10` form.
fn format_ranges(members: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut iter = members.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{start}-{end}")
        });
    }
    parts.join(",")
}
