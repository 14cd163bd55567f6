use super::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::residue::ResidueKey;
use crate::core::models::structure::Structure;
use crate::core::utils::identifiers::{
    REQUIRED_BACKBONE_ATOMS, is_hydrogen, is_standard_amino_acid, is_water_residue,
};
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("No amino-acid residue with a complete backbone was found")]
    NoResidues,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

/// What the reader saw and discarded while cleaning a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdbMetadata {
    pub header: Option<String>,
    pub models: usize,
    pub skipped_waters: usize,
    pub skipped_hydrogens: usize,
    pub skipped_alternates: usize,
    /// Residues whose first-seen name lost to a standard amino acid at the same key.
    pub replaced_residues: usize,
    pub dropped_residues: usize,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_coordinate(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

struct AtomRecord<'a> {
    serial: usize,
    name: &'a str,
    residue_name: &'a str,
    chain: char,
    key: ResidueKey,
    position: Point3<f64>,
    occupancy: f64,
    b_factor: f64,
    element: Option<&'a str>,
}

fn parse_atom_record(line: &str, line_num: usize) -> Result<AtomRecord<'_>, PdbError> {
    if line.len() < 54 {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }

    let name = slice_and_trim(line, 12, 16);
    if name.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }

    let number_str = slice_and_trim(line, 22, 26);
    let number: isize = number_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "23-26".into(),
            value: number_str.into(),
        },
    })?;
    let key = match column_char(line, 26) {
        Some(code) => ResidueKey::with_insertion(number, code),
        None => ResidueKey::new(number),
    };

    let position = Point3::new(
        parse_coordinate(line, line_num, 30, 38)?,
        parse_coordinate(line, line_num, 38, 46)?,
        parse_coordinate(line, line_num, 46, 54)?,
    );

    // Serial numbers overflow into hybrid-36 in large files; they are informational only.
    let serial = slice_and_trim(line, 6, 11).parse().unwrap_or(0);
    let occupancy = slice_and_trim(line, 54, 60).parse().unwrap_or(1.0);
    let b_factor = slice_and_trim(line, 60, 66).parse().unwrap_or(0.0);
    let element = Some(slice_and_trim(line, 76, 78)).filter(|e| !e.is_empty());

    Ok(AtomRecord {
        serial,
        name,
        residue_name: slice_and_trim(line, 17, 20),
        chain: column_char(line, 21).unwrap_or(' '),
        key,
        position,
        occupancy,
        b_factor,
        element,
    })
}

/// Reader for the fixed-column PDB format.
///
/// Only the first model is read. Waters and hydrogens are skipped, and
/// residues lacking any of the N, CA and C atoms are dropped once the whole
/// model has been read.
///
/// Alternate locations resolve to the conformer with the highest occupancy
/// (the first one on ties). When two residue names share one key, a standard
/// amino acid replaces a non-standard one; otherwise the first name stays.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut structure = Structure::new();
        let mut metadata = PdbMetadata::default();
        let mut atoms_read = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "HEADER" if metadata.header.is_none() => {
                    metadata.header = Some(line.get(10..).unwrap_or("").trim().to_string());
                }
                "MODEL" => {
                    metadata.models += 1;
                    if metadata.models > 1 {
                        break;
                    }
                }
                "ENDMDL" if atoms_read > 0 => break,
                "END" => break,
                "ATOM" | "HETATM" => {
                    let record = parse_atom_record(&line, line_num)?;

                    if is_water_residue(record.residue_name) {
                        metadata.skipped_waters += 1;
                        continue;
                    }
                    if is_hydrogen(record.name, record.element) {
                        metadata.skipped_hydrogens += 1;
                        continue;
                    }

                    let chain_id = structure.add_chain(record.chain);
                    let Some(residue_id) =
                        structure.add_residue(chain_id, record.key, record.residue_name)
                    else {
                        continue;
                    };

                    let Some(residue) = structure.residue(residue_id) else {
                        continue;
                    };
                    if residue.name != record.residue_name {
                        if is_standard_amino_acid(&residue.name)
                            || !is_standard_amino_acid(record.residue_name)
                        {
                            metadata.skipped_alternates += 1;
                            continue;
                        }
                        debug!(
                            chain = %record.chain,
                            residue = %record.key,
                            from = %residue.name,
                            to = %record.residue_name,
                            "Standard amino acid replaces a heterogeneous residue."
                        );
                        structure.replace_residue(residue_id, record.residue_name);
                        metadata.replaced_residues += 1;
                    }

                    let existing = structure
                        .residue(residue_id)
                        .and_then(|residue| residue.get_atom_id_by_name(record.name));
                    if let Some(atom_id) = existing {
                        metadata.skipped_alternates += 1;
                        if let Some(atom) = structure.atom_mut(atom_id) {
                            if record.occupancy > atom.occupancy {
                                atom.position = record.position;
                                atom.occupancy = record.occupancy;
                                atom.b_factor = record.b_factor;
                                atom.element = record.element.map(str::to_string);
                                atom.serial = record.serial;
                            }
                        }
                        continue;
                    }

                    let mut atom = Atom::new(record.name, residue_id, record.position);
                    atom.occupancy = record.occupancy;
                    atom.b_factor = record.b_factor;
                    atom.element = record.element.map(str::to_string);
                    atom.serial = record.serial;
                    structure.add_atom_to_residue(residue_id, atom);
                    atoms_read += 1;
                }
                _ => {}
            }
        }

        let incomplete: Vec<_> = structure
            .residues_iter()
            .filter(|(_, residue)| {
                !REQUIRED_BACKBONE_ATOMS
                    .iter()
                    .all(|name| residue.has_atom(name))
            })
            .map(|(id, _)| id)
            .collect();
        for residue_id in incomplete {
            if let Some(residue) = structure.remove_residue(residue_id) {
                debug!(
                    residue = %residue.key,
                    name = %residue.name,
                    "Dropped residue without a complete backbone."
                );
                metadata.dropped_residues += 1;
            }
        }
        structure.prune_empty_chains();

        if structure.residue_count() == 0 {
            warn!("Structure file contained no usable residues.");
            return Err(PdbError::NoResidues);
        }

        debug!(
            residues = structure.residue_count(),
            atoms = structure.atom_count(),
            waters = metadata.skipped_waters,
            hydrogens = metadata.skipped_hydrogens,
            alternates = metadata.skipped_alternates,
            replaced = metadata.replaced_residues,
            dropped = metadata.dropped_residues,
            "Read PDB structure."
        );
        Ok((structure, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::Residue;
    use std::io::{BufReader, Cursor, Write};
    use tempfile::NamedTempFile;

    fn atom_line(
        record: &str,
        serial: usize,
        name: &str,
        altloc: char,
        residue: &str,
        chain: char,
        number: isize,
        icode: char,
        position: (f64, f64, f64),
        b_factor: f64,
        element: &str,
    ) -> String {
        format!(
            "{:<6}{:>5} {:<4}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record,
            serial,
            name,
            altloc,
            residue,
            chain,
            number,
            icode,
            position.0,
            position.1,
            position.2,
            1.0,
            b_factor,
            element
        )
    }

    fn backbone(residue: &str, chain: char, number: isize, b_factor: f64) -> Vec<String> {
        ["N", "CA", "C", "O"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                atom_line(
                    "ATOM",
                    i + 1,
                    name,
                    ' ',
                    residue,
                    chain,
                    number,
                    ' ',
                    (number as f64, i as f64, 0.0),
                    b_factor,
                    &name[..1],
                )
            })
            .collect()
    }

    fn with_occupancy(mut line: String, occupancy: f64) -> String {
        line.replace_range(54..60, &format!("{occupancy:>6.2}"));
        line
    }

    fn residue_at<'a>(structure: &'a Structure, chain: char, number: isize) -> &'a Residue {
        let chain_id = structure.find_chain_by_id(chain).unwrap();
        let residue_id = structure
            .find_residue(chain_id, ResidueKey::new(number))
            .unwrap();
        structure.residue(residue_id).unwrap()
    }

    fn read(lines: &[String]) -> Result<(Structure, PdbMetadata), PdbError> {
        let text = lines.join("\n");
        let mut reader = BufReader::new(Cursor::new(text));
        PdbFile::read_from(&mut reader)
    }

    #[test]
    fn reads_atoms_with_b_factors_and_insertion_codes() {
        let mut lines = backbone("ALA", 'A', 1, 91.5);
        lines.push(atom_line(
            "ATOM", 5, "CB", ' ', "ALA", 'A', 1, ' ', (1.0, 1.0, 1.0), 91.5, "C",
        ));
        for name in ["N", "CA", "C"] {
            lines.push(atom_line(
                "ATOM", 6, name, ' ', "GLY", 'A', 1, 'A', (2.0, 0.0, 0.0), 80.0, &name[..1],
            ));
        }

        let (structure, _) = read(&lines).unwrap();
        let chain_id = structure.find_chain_by_id('A').unwrap();
        let ala = structure.find_residue(chain_id, ResidueKey::new(1)).unwrap();
        let gly = structure
            .find_residue(chain_id, ResidueKey::with_insertion(1, 'A'))
            .unwrap();

        let ala = structure.residue(ala).unwrap();
        assert_eq!(ala.name, "ALA");
        assert_eq!(ala.atoms().len(), 5);
        let ca = structure.atom(ala.get_atom_id_by_name("CA").unwrap()).unwrap();
        assert_eq!(ca.b_factor, 91.5);
        assert_eq!(ca.position, Point3::new(1.0, 1.0, 0.0));
        assert_eq!(structure.residue(gly).unwrap().atoms().len(), 3);
    }

    #[test]
    fn skips_waters_hydrogens_and_incomplete_residues() {
        let mut lines = backbone("SER", 'A', 1, 50.0);
        lines.push(atom_line(
            "ATOM", 5, "HA", ' ', "SER", 'A', 1, ' ', (0.0, 0.0, 1.0), 50.0, "H",
        ));
        lines.push(atom_line(
            "HETATM", 6, "O", ' ', "HOH", 'A', 101, ' ', (9.0, 9.0, 9.0), 10.0, "O",
        ));
        lines.push(atom_line(
            "HETATM", 7, "C1", ' ', "NAG", 'A', 201, ' ', (5.0, 5.0, 5.0), 10.0, "C",
        ));
        lines.push(atom_line(
            "ATOM", 8, "CA", ' ', "LYS", 'A', 2, ' ', (3.0, 0.0, 0.0), 40.0, "C",
        ));

        let (structure, metadata) = read(&lines).unwrap();
        assert_eq!(structure.residue_count(), 1);
        assert_eq!(structure.atom_count(), 4);
        assert_eq!(metadata.skipped_waters, 1);
        assert_eq!(metadata.skipped_hydrogens, 1);
        assert_eq!(metadata.dropped_residues, 2);
    }

    #[test]
    fn equal_occupancy_keeps_first_alternate() {
        let mut lines = backbone("VAL", 'A', 3, 70.0);
        lines.push(atom_line(
            "ATOM", 5, "CB", 'A', "VAL", 'A', 3, ' ', (1.0, 2.0, 3.0), 70.0, "C",
        ));
        lines.push(atom_line(
            "ATOM", 6, "CB", 'B', "VAL", 'A', 3, ' ', (7.0, 8.0, 9.0), 70.0, "C",
        ));

        let (structure, metadata) = read(&lines).unwrap();
        let residue = residue_at(&structure, 'A', 3);
        let cb = structure
            .atom(residue.get_atom_id_by_name("CB").unwrap())
            .unwrap();
        assert_eq!(cb.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(metadata.skipped_alternates, 1);
    }

    #[test]
    fn highest_occupancy_alternate_wins() {
        let mut lines = backbone("SER", 'A', 4, 60.0);
        lines.push(with_occupancy(
            atom_line(
                "ATOM", 5, "OG", 'A', "SER", 'A', 4, ' ', (1.0, 2.0, 3.0), 60.0, "O",
            ),
            0.3,
        ));
        lines.push(with_occupancy(
            atom_line(
                "ATOM", 6, "OG", 'B', "SER", 'A', 4, ' ', (7.0, 8.0, 9.0), 65.0, "O",
            ),
            0.7,
        ));
        lines.push(with_occupancy(
            atom_line(
                "ATOM", 7, "OG", 'C', "SER", 'A', 4, ' ', (4.0, 4.0, 4.0), 66.0, "O",
            ),
            0.5,
        ));

        let (structure, metadata) = read(&lines).unwrap();
        let residue = residue_at(&structure, 'A', 4);
        assert_eq!(residue.atoms().len(), 5);
        let og = structure
            .atom(residue.get_atom_id_by_name("OG").unwrap())
            .unwrap();
        assert_eq!(og.position, Point3::new(7.0, 8.0, 9.0));
        assert_eq!(og.occupancy, 0.7);
        assert_eq!(og.b_factor, 65.0);
        assert_eq!(metadata.skipped_alternates, 2);
    }

    #[test]
    fn standard_amino_acid_replaces_modified_residue_at_same_key() {
        let mut lines = backbone("MSE", 'A', 5, 50.0);
        lines.push(atom_line(
            "HETATM", 5, "SE", 'A', "MSE", 'A', 5, ' ', (9.0, 9.0, 9.0), 50.0, "SE",
        ));
        lines.extend(backbone("MET", 'A', 5, 55.0));
        lines.push(atom_line(
            "ATOM", 10, "SD", 'B', "MET", 'A', 5, ' ', (5.0, 5.0, 5.0), 55.0, "S",
        ));

        let (structure, metadata) = read(&lines).unwrap();
        let residue = residue_at(&structure, 'A', 5);
        assert_eq!(residue.name, "MET");
        assert!(residue.has_atom("SD"));
        assert!(!residue.has_atom("SE"));
        assert_eq!(residue.atoms().len(), 5);
        assert_eq!(structure.residue_confidences()[&5], 55.0);
        assert_eq!(metadata.replaced_residues, 1);
    }

    #[test]
    fn first_residue_name_stays_unless_replaced_by_a_standard_one() {
        // Standard first: the modified variant is ignored.
        let mut lines = backbone("MET", 'A', 6, 50.0);
        lines.extend(backbone("MSE", 'A', 6, 40.0));
        // Two standard names: the first one wins.
        lines.extend(backbone("SER", 'A', 7, 50.0));
        lines.extend(backbone("THR", 'A', 7, 40.0));

        let (structure, metadata) = read(&lines).unwrap();
        assert_eq!(residue_at(&structure, 'A', 6).name, "MET");
        assert_eq!(residue_at(&structure, 'A', 7).name, "SER");
        assert_eq!(structure.residue_confidences()[&6], 50.0);
        assert_eq!(metadata.replaced_residues, 0);
        assert_eq!(metadata.skipped_alternates, 8);
    }

    #[test]
    fn reads_only_the_first_model() {
        let mut lines = vec!["MODEL        1".to_string()];
        lines.extend(backbone("ALA", 'A', 1, 10.0));
        lines.push("ENDMDL".to_string());
        lines.push("MODEL        2".to_string());
        lines.extend(backbone("ALA", 'A', 2, 10.0));
        lines.push("ENDMDL".to_string());

        let (structure, metadata) = read(&lines).unwrap();
        assert_eq!(structure.residue_count(), 1);
        assert_eq!(metadata.models, 1);
    }

    #[test]
    fn keeps_chain_order_from_file() {
        let mut lines = backbone("ALA", 'B', 1, 10.0);
        lines.extend(backbone("ALA", 'A', 1, 10.0));
        let (structure, _) = read(&lines).unwrap();
        let order: Vec<char> = structure.chains_iter().map(|(_, c)| c.id).collect();
        assert_eq!(order, vec!['B', 'A']);
    }

    #[test]
    fn malformed_coordinates_report_line_number() {
        let mut lines = backbone("ALA", 'A', 1, 10.0);
        lines[2].replace_range(30..38, "   abc  ");
        let err = read(&lines).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 3,
                kind: PdbParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn short_atom_line_is_rejected() {
        let lines = vec!["ATOM      1  N   ALA A   1".to_string()];
        assert!(matches!(
            read(&lines),
            Err(PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            })
        ));
    }

    #[test]
    fn file_without_residues_is_an_error() {
        let lines = vec!["HEADER    EMPTY".to_string(), "END".to_string()];
        assert!(matches!(read(&lines), Err(PdbError::NoResidues)));
    }

    #[test]
    fn read_from_path_parses_file_on_disk() {
        let mut file = NamedTempFile::new().unwrap();
        for line in backbone("GLY", 'C', 12, 88.0) {
            writeln!(file, "{line}").unwrap();
        }
        writeln!(file, "END").unwrap();

        let (structure, _) = PdbFile::read_from_path(file.path()).unwrap();
        assert!(structure.find_chain_by_id('C').is_some());
        assert_eq!(structure.residue_confidences()[&12], 88.0);
    }
}
