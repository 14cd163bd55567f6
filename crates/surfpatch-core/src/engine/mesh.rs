//! Face bookkeeping over a tetrahedralization.
//!
//! Every tetrahedron contributes four triangular faces. A face shared by two
//! live tetrahedra is interior; a face with a single live owner lies on the
//! current boundary of the mesh. Peeling erodes boundary tetrahedra and keeps
//! these counts up to date.

use crate::core::geometry::Tetrahedron;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Atom indices of a face, ascending.
pub type Face = [usize; 3];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRecord {
    pub atoms: Face,
    /// Number of live tetrahedra owning this face; 1 or 2 after build, never increases.
    pub count: u8,
    /// The owner to erode when this face is an open boundary.
    pub first_owner: usize,
    pub second_owner: Option<usize>,
    /// Set once the count has reached zero.
    pub removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeelSummary {
    pub passes: usize,
    pub eroded: usize,
}

#[derive(Debug, Clone)]
pub struct FaceTable {
    tetrahedra: Vec<[usize; 4]>,
    eroded: Vec<bool>,
    faces: Vec<FaceRecord>,
    index: HashMap<Face, usize>,
}

fn tetrahedron_faces(sorted: &[usize; 4]) -> [Face; 4] {
    [
        [sorted[1], sorted[2], sorted[3]],
        [sorted[0], sorted[2], sorted[3]],
        [sorted[0], sorted[1], sorted[3]],
        [sorted[0], sorted[1], sorted[2]],
    ]
}

impl FaceTable {
    /// Builds the table; faces are numbered in first-seen order.
    pub fn build(tetrahedra: &[Tetrahedron]) -> Self {
        let mut table = Self {
            tetrahedra: Vec::with_capacity(tetrahedra.len()),
            eroded: vec![false; tetrahedra.len()],
            faces: Vec::with_capacity(tetrahedra.len() * 2 + 4),
            index: HashMap::with_capacity(tetrahedra.len() * 2 + 4),
        };

        for (tet_index, tetrahedron) in tetrahedra.iter().enumerate() {
            let mut sorted = *tetrahedron;
            sorted.sort_unstable();
            table.tetrahedra.push(sorted);

            for face in tetrahedron_faces(&sorted) {
                match table.index.get(&face) {
                    Some(&face_index) => {
                        let record = &mut table.faces[face_index];
                        record.count += 1;
                        record.second_owner = Some(tet_index);
                    }
                    None => {
                        table.index.insert(face, table.faces.len());
                        table.faces.push(FaceRecord {
                            atoms: face,
                            count: 1,
                            first_owner: tet_index,
                            second_owner: None,
                            removed: false,
                        });
                    }
                }
            }
        }

        debug!(
            tetrahedra = table.tetrahedra.len(),
            faces = table.faces.len(),
            "Built face table."
        );
        table
    }

    pub fn faces(&self) -> &[FaceRecord] {
        &self.faces
    }

    pub fn tetrahedra(&self) -> &[[usize; 4]] {
        &self.tetrahedra
    }

    pub fn face(&self, atoms: &Face) -> Option<&FaceRecord> {
        self.index.get(atoms).map(|&i| &self.faces[i])
    }

    pub fn is_eroded(&self, tet_index: usize) -> bool {
        self.eroded.get(tet_index).copied().unwrap_or(false)
    }

    /// Faces with exactly one live owner.
    pub fn boundary_faces(&self) -> impl Iterator<Item = &FaceRecord> {
        self.faces.iter().filter(|face| face.count == 1)
    }

    /// Erodes one tetrahedron, returning `false` if it was already gone.
    pub fn erode(&mut self, tet_index: usize) -> bool {
        if self.eroded.get(tet_index).copied().unwrap_or(true) {
            return false;
        }
        self.eroded[tet_index] = true;

        for face in tetrahedron_faces(&self.tetrahedra[tet_index]) {
            let Some(&face_index) = self.index.get(&face) else {
                continue;
            };
            let record = &mut self.faces[face_index];
            record.count = record.count.saturating_sub(1);
            if record.count == 0 {
                record.removed = true;
            }
            if record.first_owner == tet_index {
                if let Some(second) = record.second_owner {
                    record.first_owner = second;
                }
            }
        }
        true
    }

    /// Repeats full passes over the faces until a pass erodes nothing.
    ///
    /// During a pass every boundary face for which `is_open` holds erodes its
    /// live owner. Counts change mid-pass, so later faces in the same pass see
    /// the effect of earlier erosions.
    pub fn peel(&mut self, is_open: impl Fn(&Face) -> bool) -> PeelSummary {
        let mut summary = PeelSummary::default();
        loop {
            summary.passes += 1;
            let mut changed = false;
            for face_index in 0..self.faces.len() {
                let face = &self.faces[face_index];
                if face.count != 1 || !is_open(&face.atoms) {
                    continue;
                }
                let owner = face.first_owner;
                if self.erode(owner) {
                    trace!(face = ?self.faces[face_index].atoms, tetrahedron = owner, "Eroded tetrahedron.");
                    summary.eroded += 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        summary
    }
}
