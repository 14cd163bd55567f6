use phf::{Map, phf_map};

/// Radius used for any residue/atom pair missing from [`VDW_RADII`].
pub const DEFAULT_VDW_RADIUS: f64 = 1.7;

/// United-atom van der Waals radii in Angstroms, keyed by residue name
/// immediately followed by atom name (`"SEROG"`, `"TRPNE1"`).
static VDW_RADII: Map<&'static str, f64> = phf_map! {
    // ALA
    "ALAN" => 1.65, "ALACA" => 1.87, "ALAC" => 1.76, "ALAO" => 1.40, "ALACB" => 1.87,
    // ARG
    "ARGN" => 1.65, "ARGCA" => 1.87, "ARGC" => 1.76, "ARGO" => 1.40, "ARGCB" => 1.87, "ARGCG" => 1.87, "ARGCD" => 1.87, "ARGNE" => 1.65, "ARGCZ" => 1.76, "ARGNH1" => 1.65, "ARGNH2" => 1.65,
    // ASP
    "ASPN" => 1.65, "ASPCA" => 1.87, "ASPC" => 1.76, "ASPO" => 1.40, "ASPCB" => 1.87, "ASPCG" => 1.76, "ASPOD1" => 1.40, "ASPOD2" => 1.40,
    // ASN
    "ASNN" => 1.65, "ASNCA" => 1.87, "ASNC" => 1.76, "ASNO" => 1.40, "ASNCB" => 1.87, "ASNCG" => 1.76, "ASNOD1" => 1.40, "ASNND2" => 1.65,
    // CYS
    "CYSN" => 1.65, "CYSCA" => 1.87, "CYSC" => 1.76, "CYSO" => 1.40, "CYSCB" => 1.87, "CYSSG" => 1.85,
    // GLU
    "GLUN" => 1.65, "GLUCA" => 1.87, "GLUC" => 1.76, "GLUO" => 1.40, "GLUCB" => 1.87, "GLUCG" => 1.87, "GLUCD" => 1.76, "GLUOE1" => 1.40, "GLUOE2" => 1.40,
    // GLN
    "GLNN" => 1.65, "GLNCA" => 1.87, "GLNC" => 1.76, "GLNO" => 1.40, "GLNCB" => 1.87, "GLNCG" => 1.87, "GLNCD" => 1.76, "GLNOE1" => 1.40, "GLNNE2" => 1.65,
    // GLY
    "GLYN" => 1.65, "GLYCA" => 1.87, "GLYC" => 1.76, "GLYO" => 1.40,
    // HIS
    "HISN" => 1.65, "HISCA" => 1.87, "HISC" => 1.76, "HISO" => 1.40, "HISCB" => 1.87, "HISCG" => 1.76, "HISND1" => 1.65, "HISCD2" => 1.76, "HISCE1" => 1.76, "HISNE2" => 1.65,
    // ILE
    "ILEN" => 1.65, "ILECA" => 1.87, "ILEC" => 1.76, "ILEO" => 1.40, "ILECB" => 1.87, "ILECG1" => 1.87, "ILECG2" => 1.87, "ILECD1" => 1.87,
    // LEU
    "LEUN" => 1.65, "LEUCA" => 1.87, "LEUC" => 1.76, "LEUO" => 1.40, "LEUCB" => 1.87, "LEUCG" => 1.87, "LEUCD1" => 1.87, "LEUCD2" => 1.87,
    // LYS
    "LYSN" => 1.65, "LYSCA" => 1.87, "LYSC" => 1.76, "LYSO" => 1.40, "LYSCB" => 1.87, "LYSCG" => 1.87, "LYSCD" => 1.87, "LYSCE" => 1.87, "LYSNZ" => 1.50,
    // MET
    "METN" => 1.65, "METCA" => 1.87, "METC" => 1.76, "METO" => 1.40, "METCB" => 1.87, "METCG" => 1.87, "METSD" => 1.85, "METCE" => 1.87,
    // PHE
    "PHEN" => 1.65, "PHECA" => 1.87, "PHEC" => 1.76, "PHEO" => 1.40, "PHECB" => 1.87, "PHECG" => 1.76, "PHECD1" => 1.76, "PHECD2" => 1.76, "PHECE1" => 1.76, "PHECE2" => 1.76, "PHECZ" => 1.76,
    // PRO
    "PRON" => 1.65, "PROCA" => 1.87, "PROC" => 1.76, "PROO" => 1.40, "PROCB" => 1.87, "PROCG" => 1.87, "PROCD" => 1.87,
    // SER
    "SERN" => 1.65, "SERCA" => 1.87, "SERC" => 1.76, "SERO" => 1.40, "SERCB" => 1.87, "SEROG" => 1.40,
    // THR
    "THRN" => 1.65, "THRCA" => 1.87, "THRC" => 1.76, "THRO" => 1.40, "THRCB" => 1.87, "THROG1" => 1.40, "THRCG2" => 1.87,
    // TRP
    "TRPN" => 1.65, "TRPCA" => 1.87, "TRPC" => 1.76, "TRPO" => 1.40, "TRPCB" => 1.87, "TRPCG" => 1.76, "TRPCD1" => 1.76, "TRPCD2" => 1.76, "TRPNE1" => 1.65, "TRPCE2" => 1.76, "TRPCE3" => 1.76, "TRPCZ2" => 1.76, "TRPCZ3" => 1.76, "TRPCH2" => 1.76,
    // TYR
    "TYRN" => 1.65, "TYRCA" => 1.87, "TYRC" => 1.76, "TYRO" => 1.40, "TYRCB" => 1.87, "TYRCG" => 1.76, "TYRCD1" => 1.76, "TYRCD2" => 1.76, "TYRCE1" => 1.76, "TYRCE2" => 1.76, "TYRCZ" => 1.76, "TYROH" => 1.40,
    // VAL
    "VALN" => 1.65, "VALCA" => 1.87, "VALC" => 1.76, "VALO" => 1.40, "VALCB" => 1.87, "VALCG1" => 1.87, "VALCG2" => 1.87,
};

/// Looks up the van der Waals radius of an atom.
///
/// Unknown residue/atom combinations (ligands, modified residues, terminal
/// oxygens) fall back to [`DEFAULT_VDW_RADIUS`].
pub fn vdw_radius(residue_name: &str, atom_name: &str) -> f64 {
    let mut key = String::with_capacity(residue_name.len() + atom_name.len());
    key.push_str(residue_name.trim());
    key.push_str(atom_name.trim());
    VDW_RADII.get(key.as_str()).copied().unwrap_or(DEFAULT_VDW_RADIUS)
}
