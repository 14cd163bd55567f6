use phf::{Set, phf_set};

/// Main-chain heavy atoms; every other heavy atom counts as side chain.
static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "CA", "C", "O",
};

/// Atoms a residue must carry to be kept as an amino acid.
pub static REQUIRED_BACKBONE_ATOMS: [&str; 3] = ["N", "CA", "C"];

static WATER_RESIDUE_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "DOD", "TIP", "TIP3", "SOL",
};

static STANDARD_AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_water_residue(residue_name: &str) -> bool {
    WATER_RESIDUE_NAMES.contains(residue_name.trim())
}

/// One of the twenty standard amino acids; modified residues such as MSE are not.
pub fn is_standard_amino_acid(residue_name: &str) -> bool {
    STANDARD_AMINO_ACIDS.contains(residue_name.trim())
}

/// Decides whether an atom is hydrogen (or deuterium).
///
/// The element column wins when present; otherwise the first letter of the
/// atom name is used, which is how PDB files without element columns mark
/// hydrogens.
pub fn is_hydrogen(atom_name: &str, element: Option<&str>) -> bool {
    if let Some(element) = element.map(str::trim).filter(|e| !e.is_empty()) {
        return element.eq_ignore_ascii_case("H") || element.eq_ignore_ascii_case("D");
    }
    let first_char = atom_name
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase());
    matches!(first_char, Some('H') | Some('D'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_backbone_atom_recognizes_main_chain_heavy_atoms() {
        for name in ["N", "CA", "C", "O", " CA "] {
            assert!(is_backbone_atom(name), "{name}");
        }
    }

    #[test]
    fn is_backbone_atom_rejects_side_chain_and_terminal_atoms() {
        for name in ["CB", "OG", "OXT", "ca", ""] {
            assert!(!is_backbone_atom(name), "{name}");
        }
    }

    #[test]
    fn water_names_are_recognized() {
        assert!(is_water_residue("HOH"));
        assert!(is_water_residue("WAT"));
        assert!(!is_water_residue("SER"));
    }

    #[test]
    fn only_the_twenty_standard_amino_acids_are_standard() {
        assert!(is_standard_amino_acid("MET"));
        assert!(is_standard_amino_acid(" GLY"));
        assert!(!is_standard_amino_acid("MSE"));
        assert!(!is_standard_amino_acid("HOH"));
    }

    #[test]
    fn is_hydrogen_prefers_element_column() {
        assert!(is_hydrogen("HG", Some("H")));
        assert!(!is_hydrogen("HG", Some("HG")));
        assert!(is_hydrogen("D1", Some(" D")));
        assert!(!is_hydrogen("CA", Some("C")));
    }

    #[test]
    fn is_hydrogen_falls_back_to_atom_name() {
        assert!(is_hydrogen("HA", None));
        assert!(is_hydrogen("1HB", None));
        assert!(is_hydrogen("HB2", Some("  ")));
        assert!(!is_hydrogen("CB", None));
        assert!(!is_hydrogen("NZ", None));
    }
}
