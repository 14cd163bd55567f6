use super::atom::{Atom, AtomLabel};
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::{Residue, ResidueKey};
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const CONFIDENCE_ATOM_NAME: &str = "CA";

/// Atom coordinates and labels for one analysis unit, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitAtoms {
    pub positions: Vec<Point3<f64>>,
    pub labels: Vec<AtomLabel>,
}

impl UnitAtoms {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A protein structure: chains of residues made of atoms.
///
/// Storage is slot-map based so that residues dropped during cleaning leave
/// every other ID valid. Chains keep the order in which they were first seen
/// in the source file.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    /// Chain IDs in first-seen order.
    chain_order: Vec<ChainId>,
    /// Lookup map for finding residues by chain ID and residue key.
    residue_id_map: HashMap<(ChainId, ResidueKey), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns an iterator over all chains in the order they were first added.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds a residue ID by its chain ID and residue key.
    pub fn find_residue(&self, chain_id: ChainId, key: ResidueKey) -> Option<ResidueId> {
        self.residue_id_map.get(&(chain_id, key)).copied()
    }

    /// Adds a new chain to the structure or returns the existing one.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(&id) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(id));
        self.chain_id_map.insert(id, chain_id);
        self.chain_order.push(chain_id);
        chain_id
    }

    /// Adds a new residue to a chain or returns the existing one.
    ///
    /// This method is idempotent on `(chain_id, key)`; the residue name of an
    /// existing residue is left untouched.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (the chain doesn't exist).
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        key: ResidueKey,
        name: &str,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;

        let residue_id = *self
            .residue_id_map
            .entry((chain_id, key))
            .or_insert_with(|| self.residues.insert(Residue::new(key, name, chain_id)));

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (the residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }

        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.residues.get_mut(residue_id)?.add_atom(&name, atom_id);

        Some(atom_id)
    }

    /// Removes an atom from the structure and from its parent residue.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Option<Atom> {
        let atom = self.atoms.remove(atom_id)?;
        if let Some(residue) = self.residues.get_mut(atom.residue_id) {
            residue.remove_atom(&atom.name, atom_id);
        }
        Some(atom)
    }

    /// Drops every atom of a residue and gives it a new name, keeping its key
    /// and its place in the chain.
    pub fn replace_residue(&mut self, residue_id: ResidueId, name: &str) -> Option<()> {
        let atom_ids = self.residues.get(residue_id)?.atoms().to_vec();
        for atom_id in atom_ids {
            self.remove_atom(atom_id);
        }
        self.residues.get_mut(residue_id)?.name = name.to_string();
        Some(())
    }

    /// Removes a residue together with all of its atoms.
    pub fn remove_residue(&mut self, residue_id: ResidueId) -> Option<Residue> {
        let atom_ids = self.residues.get(residue_id)?.atoms().to_vec();
        for atom_id in atom_ids {
            self.remove_atom(atom_id);
        }

        let residue = self.residues.remove(residue_id)?;
        if let Some(chain) = self.chains.get_mut(residue.chain_id) {
            chain.residues.retain(|&id| id != residue_id);
        }
        self.residue_id_map.remove(&(residue.chain_id, residue.key));

        Some(residue)
    }

    /// Removes a chain that no longer has any residue.
    pub(crate) fn prune_empty_chains(&mut self) {
        let empty: Vec<ChainId> = self
            .chains
            .iter()
            .filter(|(_, chain)| chain.residues.is_empty())
            .map(|(id, _)| id)
            .collect();
        for chain_id in empty {
            if let Some(chain) = self.chains.remove(chain_id) {
                self.chain_id_map.remove(&chain.id);
            }
            self.chain_order.retain(|&id| id != chain_id);
        }
    }

    /// Collects the atoms of one chain, optionally restricted to a set of residue numbers.
    ///
    /// Residues are visited in chain order and atoms in file order, so the
    /// label at index `i` always describes the position at index `i`.
    pub fn unit_atoms(
        &self,
        chain_id: ChainId,
        residue_numbers: Option<&BTreeSet<isize>>,
    ) -> UnitAtoms {
        let mut unit = UnitAtoms::default();
        let Some(chain) = self.chains.get(chain_id) else {
            return unit;
        };

        for residue in chain.residues.iter().filter_map(|&id| self.residues.get(id)) {
            if residue_numbers.is_some_and(|set| !set.contains(&residue.key.number)) {
                continue;
            }
            for atom in residue.atoms().iter().filter_map(|&id| self.atoms.get(id)) {
                unit.positions.push(atom.position);
                unit.labels
                    .push(AtomLabel::new(residue.key, &residue.name, &atom.name));
            }
        }

        unit
    }

    /// Per-residue confidence keyed by residue number.
    ///
    /// The value is the B-factor of the residue's CA atom (its first atom when
    /// CA is absent). When several chains share a residue number, the first
    /// chain in file order wins.
    pub fn residue_confidences(&self) -> BTreeMap<isize, f64> {
        let mut confidences = BTreeMap::new();
        for (_, chain) in self.chains_iter() {
            for residue in chain.residues.iter().filter_map(|&id| self.residues.get(id)) {
                let atom_id = residue
                    .get_atom_id_by_name(CONFIDENCE_ATOM_NAME)
                    .or_else(|| residue.atoms().first().copied());
                if let Some(atom) = atom_id.and_then(|id| self.atoms.get(id)) {
                    confidences
                        .entry(residue.key.number)
                        .or_insert(atom.b_factor);
                }
            }
        }
        confidences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_two_chain_structure() -> Structure {
        let mut structure = Structure::new();
        let chain_b = structure.add_chain('B');
        let chain_a = structure.add_chain('A');

        for (chain_id, offset) in [(chain_b, 0.0), (chain_a, 10.0)] {
            for n in 1..=3 {
                let residue_id = structure
                    .add_residue(chain_id, ResidueKey::new(n), "GLY")
                    .unwrap();
                for (i, name) in ["N", "CA", "C", "O"].iter().enumerate() {
                    let mut atom = Atom::new(
                        name,
                        residue_id,
                        Point3::new(offset + n as f64, i as f64, 0.0),
                    );
                    atom.b_factor = offset + n as f64 * 10.0 + i as f64;
                    structure.add_atom_to_residue(residue_id, atom).unwrap();
                }
            }
        }
        structure
    }

    #[test]
    fn chains_iterate_in_insertion_order() {
        let structure = build_two_chain_structure();
        let ids: Vec<char> = structure.chains_iter().map(|(_, c)| c.id).collect();
        assert_eq!(ids, vec!['B', 'A']);
    }

    #[test]
    fn add_chain_and_residue_are_idempotent() {
        let mut structure = Structure::new();
        let first = structure.add_chain('A');
        let second = structure.add_chain('A');
        assert_eq!(first, second);

        let r1 = structure.add_residue(first, ResidueKey::new(1), "ALA").unwrap();
        let r2 = structure.add_residue(first, ResidueKey::new(1), "GLY").unwrap();
        assert_eq!(r1, r2);
        assert_eq!(structure.residue(r1).unwrap().name, "ALA");
        assert_eq!(structure.chain(first).unwrap().residues().len(), 1);
    }

    #[test]
    fn add_atom_to_missing_residue_returns_none() {
        let mut structure = Structure::new();
        let chain_id = structure.add_chain('A');
        let residue_id = structure
            .add_residue(chain_id, ResidueKey::new(1), "ALA")
            .unwrap();
        structure.remove_residue(residue_id);
        let atom = Atom::new("CA", residue_id, Point3::origin());
        assert!(structure.add_atom_to_residue(residue_id, atom).is_none());
    }

    #[test]
    fn residue_removal_updates_structure_correctly() {
        let mut structure = build_two_chain_structure();
        let chain_a = structure.find_chain_by_id('A').unwrap();
        let residue_id = structure.find_residue(chain_a, ResidueKey::new(2)).unwrap();

        let removed = structure.remove_residue(residue_id).unwrap();
        assert_eq!(removed.key, ResidueKey::new(2));
        assert_eq!(structure.residue_count(), 5);
        assert_eq!(structure.atom_count(), 20);
        assert!(structure.find_residue(chain_a, ResidueKey::new(2)).is_none());
        assert_eq!(structure.chain(chain_a).unwrap().residues().len(), 2);
    }

    #[test]
    fn prune_empty_chains_drops_chain_and_lookup() {
        let mut structure = build_two_chain_structure();
        let chain_b = structure.find_chain_by_id('B').unwrap();
        for residue_id in structure.chain(chain_b).unwrap().residues().to_vec() {
            structure.remove_residue(residue_id);
        }
        structure.prune_empty_chains();
        assert!(structure.find_chain_by_id('B').is_none());
        let ids: Vec<char> = structure.chains_iter().map(|(_, c)| c.id).collect();
        assert_eq!(ids, vec!['A']);
    }

    #[test]
    fn unit_atoms_keeps_labels_aligned_with_positions() {
        let structure = build_two_chain_structure();
        let chain_a = structure.find_chain_by_id('A').unwrap();

        let unit = structure.unit_atoms(chain_a, None);
        assert_eq!(unit.len(), 12);
        assert_eq!(unit.labels[0].to_string(), "1_GLY_N");
        assert_eq!(unit.positions[0], Point3::new(11.0, 0.0, 0.0));
        assert_eq!(unit.labels[5].to_string(), "2_GLY_CA");
        assert_eq!(unit.positions[5], Point3::new(12.0, 1.0, 0.0));
    }

    #[test]
    fn unit_atoms_honours_residue_selection() {
        let structure = build_two_chain_structure();
        let chain_a = structure.find_chain_by_id('A').unwrap();
        let selection: BTreeSet<isize> = [1, 3].into_iter().collect();

        let unit = structure.unit_atoms(chain_a, Some(&selection));
        assert_eq!(unit.len(), 8);
        assert!(unit.labels.iter().all(|l| l.residue_key.number != 2));
    }

    #[test]
    fn residue_confidences_use_ca_of_first_chain() {
        let structure = build_two_chain_structure();
        let confidences = structure.residue_confidences();
        assert_eq!(confidences.len(), 3);
        // Chain B comes first; its CA (index 1) carries n * 10 + 1.
        assert_eq!(confidences[&1], 11.0);
        assert_eq!(confidences[&3], 31.0);
    }
}
