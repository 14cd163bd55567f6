use super::ids::{AtomId, ChainId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid residue key '{0}': expected a sequence number with an optional insertion code")]
pub struct ParseResidueKeyError(pub String);

/// Identifies a residue within a chain: sequence number plus optional insertion code.
///
/// Keys order numerically by sequence number, and a residue without an
/// insertion code sorts before its inserted siblings (`52 < 52A < 52B < 53`).
/// The textual form (`"52"`, `"52A"`, `"-1"`) is used as the residue key in
/// every serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub number: isize,
    pub insertion_code: Option<char>,
}

impl ResidueKey {
    pub const fn new(number: isize) -> Self {
        Self {
            number,
            insertion_code: None,
        }
    }

    pub const fn with_insertion(number: isize, insertion_code: char) -> Self {
        Self {
            number,
            insertion_code: Some(insertion_code),
        }
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.insertion_code {
            Some(code) => write!(f, "{}{}", self.number, code),
            None => write!(f, "{}", self.number),
        }
    }
}

impl FromStr for ResidueKey {
    type Err = ParseResidueKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseResidueKeyError(s.to_string());

        let (digits, insertion_code) = match trimmed.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => (&trimmed[..trimmed.len() - 1], Some(c)),
            Some(_) => (trimmed, None),
            None => return Err(err()),
        };
        let number = digits.parse::<isize>().map_err(|_| err())?;

        Ok(Self {
            number,
            insertion_code,
        })
    }
}

impl From<isize> for ResidueKey {
    fn from(number: isize) -> Self {
        Self::new(number)
    }
}

impl Serialize for ResidueKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResidueKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone)]
pub struct Residue {
    pub key: ResidueKey,                    // Sequence number and insertion code from source file
    pub name: String,                       // Name of the residue (e.g., "ALA", "GLY")
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms in file order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(key: ResidueKey, name: &str, chain_id: ChainId) -> Self {
        Self {
            key,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
        self.atom_name_map.remove(atom_name);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom_name_map.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn residue_key_parses_number_and_insertion_code() {
        assert_eq!("52".parse::<ResidueKey>(), Ok(ResidueKey::new(52)));
        assert_eq!(
            "52A".parse::<ResidueKey>(),
            Ok(ResidueKey::with_insertion(52, 'A'))
        );
        assert_eq!("-4".parse::<ResidueKey>(), Ok(ResidueKey::new(-4)));
        assert_eq!(" 7 ".parse::<ResidueKey>(), Ok(ResidueKey::new(7)));
    }

    #[test]
    fn residue_key_rejects_garbage() {
        assert!("".parse::<ResidueKey>().is_err());
        assert!("A".parse::<ResidueKey>().is_err());
        assert!("12AB".parse::<ResidueKey>().is_err());
        assert!("1.5".parse::<ResidueKey>().is_err());
    }

    #[test]
    fn residue_key_orders_insertions_after_plain_number() {
        let mut keys = vec![
            ResidueKey::new(53),
            ResidueKey::with_insertion(52, 'B'),
            ResidueKey::new(52),
            ResidueKey::with_insertion(52, 'A'),
            ResidueKey::new(-1),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["-1", "52", "52A", "52B", "53"]);
    }

    #[test]
    fn residue_key_serializes_as_string_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ResidueKey::with_insertion(10, 'A'), 1.5);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"10A":1.5}"#);

        let back: std::collections::BTreeMap<ResidueKey, f64> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn add_atom_adds_atom_and_maps_name() {
        let mut residue = Residue::new(ResidueKey::new(5), "ALA", dummy_chain_id(2));
        let atom_id = dummy_atom_id(42);
        residue.add_atom("CA", atom_id);
        assert_eq!(residue.atoms(), &[atom_id]);
        assert_eq!(residue.get_atom_id_by_name("CA"), Some(atom_id));
        assert!(residue.has_atom("CA"));
        assert!(!residue.has_atom("CB"));
    }

    #[test]
    fn remove_atom_removes_atom_and_name_mapping() {
        let mut residue = Residue::new(ResidueKey::new(8), "THR", dummy_chain_id(4));
        let atom_id = dummy_atom_id(100);
        residue.add_atom("OG1", atom_id);
        residue.remove_atom("OG1", atom_id);
        assert!(residue.atoms().is_empty());
        assert_eq!(residue.get_atom_id_by_name("OG1"), None);
    }
}
