pub mod analyze;
pub mod domains;
pub mod surface;

use crate::error::{CliError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use surfpatch::core::io::pdb::{PdbFile, PdbMetadata};
use surfpatch::core::io::traits::StructureFile;
use surfpatch::core::models::structure::Structure;
use tracing::info;

/// Reads and cleans a PDB file, logging what the cleaning dropped.
pub(crate) fn load_structure(path: &Path) -> Result<Structure> {
    info!("Loading input structure from {:?}", path);
    let (structure, metadata) =
        PdbFile::read_from_path(path).map_err(|e| file_error(path, e))?;
    log_cleaning(&metadata);
    info!(
        chains = structure.chains_iter().count(),
        residues = structure.residue_count(),
        atoms = structure.atom_count(),
        "Structure loaded."
    );
    Ok(structure)
}

fn log_cleaning(metadata: &PdbMetadata) {
    info!(
        waters = metadata.skipped_waters,
        hydrogens = metadata.skipped_hydrogens,
        alternates = metadata.skipped_alternates,
        replaced_residues = metadata.replaced_residues,
        incomplete_residues = metadata.dropped_residues,
        "Structure cleaned."
    );
}

pub(crate) fn file_error<E>(path: &Path, error: E) -> CliError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CliError::FileParsing {
        path: PathBuf::from(path),
        source: error.into(),
    }
}

/// Pretty-prints `value` as JSON to `path`, or to stdout when no path is given.
pub(crate) fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) => {
            info!("Writing JSON output to {:?}", path);
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let value = BTreeMap::from([("patch_1", vec!["12", "13A"])]);

        write_json(Some(&path), &value).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["patch_1"][1], "13A");
    }

    #[test]
    fn missing_structure_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_structure(&dir.path().join("absent.pdb"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
