use super::predicates::{Sign, coplanar_incircle, insphere_sign, orient3d, orient3d_sign};
use super::{GeometryError, GeometryProvider, Tetrahedron};
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, trace};

/// Vertex index standing for the point at infinity.
const INFINITE: usize = usize::MAX;
const DUPLICATE_TOLERANCE_SQ: f64 = 1e-20;
const COPLANARITY_TOLERANCE: f64 = 1e-12;
const MORTON_BITS: u32 = 10;

/// Incremental Bowyer-Watson tetrahedralizer.
///
/// The triangulation is closed with a vertex at infinity: every convex-hull
/// face is shared by one finite tetrahedron and one infinite cell made of the
/// face and the infinite vertex. A point outside the current hull conflicts
/// with the infinite cells whose hull face it sees, so the hull grows with the
/// point set and the finite cells always cover exactly its convex hull.
///
/// Insertion starts from four well-spread input points and continues in
/// Morton (Z-order) sequence. Each point is located by a visibility walk,
/// the cavity of cells in conflict with it is carved out, and the cavity is
/// re-triangulated as a star around the point. All decisions go through the
/// filtered predicates of [`super::predicates`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BowyerWatson;

impl BowyerWatson {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProvider for BowyerWatson {
    #[instrument(skip_all, name = "delaunay_tetrahedralize", fields(points = points.len()))]
    fn tetrahedralize(&self, points: &[Point3<f64>]) -> Result<Vec<Tetrahedron>, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(GeometryError::NonFinite { index });
        }
        let seed = spanning_tetrahedron(points)?;

        let mut mesh = Mesh::new(points, seed);
        let mut skipped = 0usize;
        for index in insertion_order(points) {
            if seed.contains(&index) {
                continue;
            }
            if !mesh.insert(index)? {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(skipped, "Ignored duplicated points.");
        }

        let tetrahedra = mesh.into_tetrahedra();
        debug!(tetrahedra = tetrahedra.len(), "Tetrahedralization complete.");
        if tetrahedra.is_empty() {
            return Err(GeometryError::Degenerate(
                "no tetrahedron spans the input points".to_string(),
            ));
        }
        Ok(tetrahedra)
    }
}

#[derive(Debug, Clone)]
struct Cell {
    /// Positively oriented; an infinite cell holds [`INFINITE`] in one slot.
    vertices: [usize; 4],
    /// `neighbors[i]` shares the face opposite `vertices[i]`.
    neighbors: [Option<usize>; 4],
    alive: bool,
}

impl Cell {
    fn new(vertices: [usize; 4]) -> Self {
        Self {
            vertices,
            neighbors: [None; 4],
            alive: true,
        }
    }

    fn infinite_slot(&self) -> Option<usize> {
        self.vertices.iter().position(|&v| v == INFINITE)
    }

    fn is_finite(&self) -> bool {
        self.infinite_slot().is_none()
    }
}

struct Mesh<'a> {
    points: &'a [Point3<f64>],
    cells: Vec<Cell>,
    /// First cell created by the latest insertion; walks start next to it.
    last: usize,
}

impl<'a> Mesh<'a> {
    /// One finite tetrahedron over `seed` closed by four infinite cells.
    fn new(points: &'a [Point3<f64>], seed: [usize; 4]) -> Self {
        let mut finite = seed;
        let [a, b, c, d] = finite.map(|v| &points[v]);
        if orient3d(a, b, c, d) < 0.0 {
            finite.swap(0, 1);
        }

        let mut cells = vec![Cell::new(finite)];
        for slot in 0..4 {
            let mut vertices = finite;
            vertices[slot] = INFINITE;
            // An infinite cell sees its hull face from outside.
            let [j, k] = remaining_slots(slot, (slot + 1) % 4);
            vertices.swap(j, k);
            cells.push(Cell::new(vertices));
        }

        let mut mesh = Self {
            points,
            cells,
            last: 0,
        };
        mesh.glue_faces();
        mesh
    }

    fn glue_faces(&mut self) {
        let mut open: HashMap<[usize; 3], (usize, usize)> = HashMap::new();
        for cell in 0..self.cells.len() {
            for slot in 0..4 {
                let key = face_key(self.cells[cell].vertices, slot);
                match open.remove(&key) {
                    Some((other, other_slot)) => {
                        self.cells[cell].neighbors[slot] = Some(other);
                        self.cells[other].neighbors[other_slot] = Some(cell);
                    }
                    None => {
                        open.insert(key, (cell, slot));
                    }
                }
            }
        }
    }

    /// Orientation of four finite vertices.
    fn orientation(&self, vertices: [usize; 4]) -> Sign {
        let [a, b, c, d] = vertices.map(|v| &self.points[v]);
        orient3d_sign(a, b, c, d)
    }

    /// Orientation of `cell` with the vertex at `slot` replaced by point `p`.
    /// The other three vertices must be finite.
    fn orient_with(&self, cell: usize, slot: usize, p: usize) -> Sign {
        let mut vertices = self.cells[cell].vertices;
        vertices[slot] = p;
        self.orientation(vertices)
    }

    /// Whether inserting `p` destroys `cell`.
    ///
    /// A finite cell conflicts when `p` is strictly inside its circumsphere.
    /// An infinite cell conflicts when `p` lies strictly beyond its hull face,
    /// or in the plane of that face and strictly inside its circumcircle.
    fn in_conflict(&self, cell: usize, p: usize) -> bool {
        let vertices = self.cells[cell].vertices;
        let target = &self.points[p];
        match self.cells[cell].infinite_slot() {
            None => {
                let [a, b, c, d] = vertices.map(|v| &self.points[v]);
                insphere_sign(a, b, c, d, target) == Sign::Positive
            }
            Some(slot) => match self.orient_with(cell, slot, p) {
                Sign::Positive => true,
                Sign::Negative => false,
                Sign::Zero => {
                    let [a, b, c] = face_slots(slot).map(|s| &self.points[vertices[s]]);
                    coplanar_incircle(a, b, c, target) == Sign::Positive
                }
            },
        }
    }

    fn contains(&self, cell: usize, p: usize) -> bool {
        self.cells[cell].is_finite()
            && (0..4).all(|slot| self.orient_with(cell, slot, p) != Sign::Negative)
    }

    /// A live finite cell near the latest insertion.
    fn walk_start(&self) -> Option<usize> {
        let last = &self.cells[self.last];
        if last.alive {
            match last.infinite_slot() {
                None => return Some(self.last),
                Some(slot) => {
                    if let Some(inner) = last.neighbors[slot]
                        && self.cells[inner].alive
                        && self.cells[inner].is_finite()
                    {
                        return Some(inner);
                    }
                }
            }
        }
        self.cells.iter().position(|c| c.alive && c.is_finite())
    }

    /// Finite cell containing `p`, or an infinite cell whose hull face `p` sees.
    fn locate(&self, p: usize) -> Result<usize, GeometryError> {
        let mut current = self
            .walk_start()
            .ok_or_else(|| GeometryError::Inconsistent("no finite cell is left".to_string()))?;
        let limit = 4 * self.cells.len() + 16;

        'walk: for step in 0..limit {
            if !self.cells[current].is_finite() {
                return Ok(current);
            }
            for k in 0..4 {
                let slot = (k + step) % 4;
                if self.orient_with(current, slot, p) == Sign::Negative {
                    let from = current;
                    current = self.cells[from].neighbors[slot].ok_or_else(|| {
                        GeometryError::Inconsistent(format!("cell {from} has an open face"))
                    })?;
                    continue 'walk;
                }
            }
            return Ok(current);
        }

        trace!(point = p, "Visibility walk did not terminate, scanning all cells.");
        let cells = &self.cells;
        let alive = move || (0..cells.len()).filter(move |&cell| cells[cell].alive);
        alive()
            .find(|&cell| self.contains(cell, p))
            .or_else(|| alive().find(|&cell| self.in_conflict(cell, p)))
            .ok_or_else(|| GeometryError::Inconsistent(format!("no cell holds point {p}")))
    }

    /// Whether the cone from `p` over the face of `cell` opposite `slot` is a
    /// valid cell while `outer` stays outside the cavity.
    fn cone_is_valid(&self, cell: usize, slot: usize, outer: usize, p: usize) -> bool {
        let mut cone = self.cells[cell].vertices;
        cone[slot] = p;
        match cone.iter().position(|&v| v == INFINITE) {
            None => self.orientation(cone) == Sign::Positive,
            Some(infinite) => {
                // The new hull face must keep the adjacent hull vertex on its inner side.
                let Some(back) = self.cells[outer]
                    .neighbors
                    .iter()
                    .position(|&n| n == Some(cell))
                else {
                    return false;
                };
                cone[infinite] = self.cells[outer].vertices[back];
                self.orientation(cone) != Sign::Positive
            }
        }
    }

    /// Inserts point `p`, returning `false` when it duplicates an existing vertex.
    fn insert(&mut self, p: usize) -> Result<bool, GeometryError> {
        let start = self.locate(p)?;
        let position = self.points[p];
        if self.cells[start]
            .vertices
            .iter()
            .filter(|&&v| v != INFINITE)
            .any(|&v| (self.points[v] - position).norm_squared() <= DUPLICATE_TOLERANCE_SQ)
        {
            return Ok(false);
        }

        let mut cavity = vec![start];
        let mut in_cavity: HashSet<usize> = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(cell) = stack.pop() {
            for neighbor in self.cells[cell].neighbors.into_iter().flatten() {
                if !in_cavity.contains(&neighbor) && self.in_conflict(neighbor, p) {
                    in_cavity.insert(neighbor);
                    cavity.push(neighbor);
                    stack.push(neighbor);
                }
            }
        }

        // Grow the cavity until it is star-shaped around `p`.
        let boundary = loop {
            let mut boundary = Vec::new();
            let mut grow = Vec::new();
            for &cell in &cavity {
                for slot in 0..4 {
                    let outer = self.cells[cell].neighbors[slot].ok_or_else(|| {
                        GeometryError::Inconsistent(format!("cell {cell} has an open face"))
                    })?;
                    if in_cavity.contains(&outer) {
                        continue;
                    }
                    if self.cone_is_valid(cell, slot, outer, p) {
                        boundary.push((cell, slot, outer));
                    } else {
                        grow.push(outer);
                    }
                }
            }
            if grow.is_empty() {
                break boundary;
            }
            for n in grow {
                if in_cavity.insert(n) {
                    cavity.push(n);
                }
            }
        };
        if boundary.is_empty() {
            return Err(GeometryError::Inconsistent(format!(
                "cavity of point {p} swallowed the whole triangulation"
            )));
        }

        let first_new = self.cells.len();
        let mut open_faces: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for (old, slot, outer) in boundary {
            let new_id = self.cells.len();
            let mut vertices = self.cells[old].vertices;
            vertices[slot] = p;

            let back = self.cells[outer]
                .neighbors
                .iter()
                .position(|&n| n == Some(old))
                .ok_or_else(|| {
                    GeometryError::Inconsistent(format!(
                        "cells {old} and {outer} disagree on adjacency"
                    ))
                })?;
            self.cells[outer].neighbors[back] = Some(new_id);
            let mut cell = Cell::new(vertices);
            cell.neighbors[slot] = Some(outer);
            self.cells.push(cell);

            for other in (0..4).filter(|&s| s != slot) {
                let [u, w] = remaining_slots(slot, other).map(|s| vertices[s]);
                let key = (u.min(w), u.max(w));
                match open_faces.remove(&key) {
                    Some((partner, partner_slot)) => {
                        self.cells[new_id].neighbors[other] = Some(partner);
                        self.cells[partner].neighbors[partner_slot] = Some(new_id);
                    }
                    None => {
                        open_faces.insert(key, (new_id, other));
                    }
                }
            }
        }

        if !open_faces.is_empty() {
            return Err(GeometryError::Inconsistent(format!(
                "cavity of point {p} is not closed ({} unmatched faces)",
                open_faces.len()
            )));
        }
        for cell in cavity {
            self.cells[cell].alive = false;
        }
        self.last = first_new;
        Ok(true)
    }

    fn into_tetrahedra(self) -> Vec<Tetrahedron> {
        self.cells
            .into_iter()
            .filter(|cell| cell.alive && cell.is_finite())
            .map(|cell| cell.vertices)
            .collect()
    }
}

fn bounding_box(points: &[Point3<f64>]) -> (Point3<f64>, Point3<f64>) {
    let mut min = points[0];
    let mut max = points[0];
    for p in points.iter().skip(1) {
        min = min.inf(p);
        max = max.sup(p);
    }
    (min, max)
}

/// Picks four well-spread points spanning a proper tetrahedron, rejecting
/// point sets that do not span three dimensions.
fn spanning_tetrahedron(points: &[Point3<f64>]) -> Result<[usize; 4], GeometryError> {
    let (min, max) = bounding_box(points);
    let scale = (max - min).norm();
    if scale == 0.0 {
        return Err(GeometryError::Degenerate("all points coincide".to_string()));
    }

    let origin = points[0];
    let second = farthest_point(points, |p| (p - origin).norm_squared());
    let axis = points[second] - origin;
    let third = farthest_point(points, |p| axis.cross(&(p - origin)).norm_squared());
    let fourth = farthest_point(points, |p| {
        orient3d(&origin, &points[second], &points[third], p).abs()
    });
    let volume = orient3d(&origin, &points[second], &points[third], &points[fourth]).abs();

    if volume <= COPLANARITY_TOLERANCE * scale.powi(3) {
        return Err(GeometryError::Degenerate("all points are coplanar".to_string()));
    }
    Ok([0, second, third, fourth])
}

/// Index of the first point with the highest score.
fn farthest_point(points: &[Point3<f64>], score: impl Fn(&Point3<f64>) -> f64) -> usize {
    let mut best = 0;
    let mut best_score = score(&points[0]);
    for (i, p) in points.iter().enumerate().skip(1) {
        let s = score(p);
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

/// The two slots of a tetrahedron other than `a` and `b`.
fn remaining_slots(a: usize, b: usize) -> [usize; 2] {
    let mut out = [0; 2];
    let mut k = 0;
    for slot in (0..4).filter(|&s| s != a && s != b) {
        out[k] = slot;
        k += 1;
    }
    out
}

/// The three slots of the face opposite `slot`, in cell order.
fn face_slots(slot: usize) -> [usize; 3] {
    let mut out = [0; 3];
    let mut k = 0;
    for s in (0..4).filter(|&s| s != slot) {
        out[k] = s;
        k += 1;
    }
    out
}

fn face_key(vertices: [usize; 4], slot: usize) -> [usize; 3] {
    let mut key = face_slots(slot).map(|s| vertices[s]);
    key.sort_unstable();
    key
}

/// Orders point indices along a Z-order curve over the bounding box.
fn insertion_order(points: &[Point3<f64>]) -> Vec<usize> {
    let (min, max) = bounding_box(points);
    let extent = max - min;
    let cells = f64::from((1u32 << MORTON_BITS) - 1);
    let quantize = |value: f64, lo: f64, span: f64| -> u32 {
        if span <= 0.0 {
            0
        } else {
            (((value - lo) / span) * cells).round() as u32
        }
    };

    let mut keyed: Vec<(u64, usize)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let code = morton_code(
                quantize(p.x, min.x, extent.x),
                quantize(p.y, min.y, extent.y),
                quantize(p.z, min.z, extent.z),
            );
            (code, i)
        })
        .collect();
    keyed.sort_unstable();
    keyed.into_iter().map(|(_, i)| i).collect()
}

fn morton_code(x: u32, y: u32, z: u32) -> u64 {
    let mut code = 0u64;
    for bit in 0..MORTON_BITS {
        code |= u64::from((x >> bit) & 1) << (3 * bit);
        code |= u64::from((y >> bit) & 1) << (3 * bit + 1);
        code |= u64::from((z >> bit) & 1) << (3 * bit + 2);
    }
    code
}
