//! Orientation and in-sphere predicates.
//!
//! [`orient3d`] and [`insphere`] return the raw floating-point determinants.
//! The triangulation decides with [`orient3d_sign`] and [`insphere_sign`]
//! instead. These evaluate the points in lexicographic order and fix the sign
//! by the parity of the reordering, so every permutation of the same points
//! yields the same magnitude and a consistent sign; two cells sharing a face
//! therefore never disagree about which side a point is on. A determinant
//! whose magnitude falls within the static rounding-error bound of its
//! evaluation is reported as [`Sign::Zero`].
//!
//! There is no exact-arithmetic stage. Configurations closer to degenerate
//! than the error bound are classified as degenerate rather than resolved,
//! and callers must treat [`Sign::Zero`] as "undecided".

use nalgebra::{Matrix4, Point3, Vector3};
use std::cmp::Ordering;

/// Relative error bound of the `orient3d` determinant, with slack over (7 + 56ε)ε.
const ORIENT3D_ERROR_BOUND: f64 = 8.0 * f64::EPSILON;
/// Relative error bound of the lifted `insphere` determinant, with slack over (16 + 224ε)ε.
const INSPHERE_ERROR_BOUND: f64 = 20.0 * f64::EPSILON;

/// Outcome of a filtered predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    fn classify(value: f64, bound: f64) -> Self {
        if value > bound {
            Sign::Positive
        } else if value < -bound {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Sign::Negative => Sign::Positive,
            Sign::Zero => Sign::Zero,
            Sign::Positive => Sign::Negative,
        }
    }
}

/// Signed volume predicate (six times the tetrahedron volume).
///
/// Positive when `d` lies on the side of plane `abc` that makes `(a, b, c, d)`
/// positively oriented, i.e. `(b - a) · ((c - a) × (d - a)) > 0`.
pub fn orient3d(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    ab.dot(&ac.cross(&ad))
}

/// In-sphere predicate for a positively oriented tetrahedron `(a, b, c, d)`.
///
/// Returns a positive value when `e` lies strictly inside the circumsphere,
/// negative when outside, and zero when the five points are cospherical.
pub fn insphere(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
    e: &Point3<f64>,
) -> f64 {
    let rows = [a - e, b - e, c - e, d - e];
    let m = Matrix4::from_fn(|r, col| {
        let v = rows[r];
        if col < 3 { v[col] } else { v.norm_squared() }
    });
    -m.determinant()
}

/// Filtered sign of [`orient3d`].
pub fn orient3d_sign(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Sign {
    let ([a, b, c, d], odd) = canonical([a, b, c, d]);
    let (det, permanent) = det3(&(b - a), &(c - a), &(d - a));
    let sign = Sign::classify(det, ORIENT3D_ERROR_BOUND * permanent);
    if odd { sign.flip() } else { sign }
}

/// Filtered sign of [`insphere`]; `Positive` means `e` is strictly inside.
pub fn insphere_sign(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
    e: &Point3<f64>,
) -> Sign {
    let (sorted, odd) = canonical([a, b, c, d, e]);
    let origin = sorted[4];
    let rows = [0, 1, 2, 3].map(|i| sorted[i] - origin);

    // Expansion of the lifted determinant along the squared-norm column.
    let mut det = 0.0;
    let mut permanent = 0.0;
    for (i, row) in rows.iter().enumerate() {
        let [j, k, l] = others(i);
        let (minor, bound) = det3(&rows[j], &rows[k], &rows[l]);
        let lift = row.norm_squared();
        let cofactor = if i % 2 == 1 { 1.0 } else { -1.0 };
        det += cofactor * lift * minor;
        permanent += lift * bound;
    }

    let sign = Sign::classify(-det, INSPHERE_ERROR_BOUND * permanent);
    if odd { sign.flip() } else { sign }
}

/// In-circle test for a point `p` lying in the plane of triangle `abc`.
///
/// `Positive` when `p` is strictly inside the circumcircle. Every sphere
/// through the circumcircle meets the plane in exactly that circle, so the
/// triangle is lifted to a tetrahedron with an apex above its plane.
pub fn coplanar_incircle(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    p: &Point3<f64>,
) -> Sign {
    let normal = (b - a).cross(&(c - a));
    let length = normal.norm();
    if length == 0.0 {
        return Sign::Zero;
    }
    let apex = a + normal * ((b - a).norm() / length);
    insphere_sign(a, b, c, &apex, p)
}

/// Circumcenter and squared circumradius of a tetrahedron, or `None` when flat.
pub fn circumsphere(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Option<(Point3<f64>, f64)> {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let denom = 2.0 * ab.dot(&ac.cross(&ad));
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let offset = (ac.cross(&ad) * ab.norm_squared()
        + ad.cross(&ab) * ac.norm_squared()
        + ab.cross(&ac) * ad.norm_squared())
        / denom;
    Some((a + offset, offset.norm_squared()))
}

/// Determinant of the 3x3 matrix with rows `r0`, `r1`, `r2`, together with
/// the same expansion taken over absolute values.
fn det3(r0: &Vector3<f64>, r1: &Vector3<f64>, r2: &Vector3<f64>) -> (f64, f64) {
    let m0 = r1.y * r2.z - r1.z * r2.y;
    let m1 = r1.x * r2.z - r1.z * r2.x;
    let m2 = r1.x * r2.y - r1.y * r2.x;
    let p0 = (r1.y * r2.z).abs() + (r1.z * r2.y).abs();
    let p1 = (r1.x * r2.z).abs() + (r1.z * r2.x).abs();
    let p2 = (r1.x * r2.y).abs() + (r1.y * r2.x).abs();
    (
        r0.x * m0 - r0.y * m1 + r0.z * m2,
        r0.x.abs() * p0 + r0.y.abs() * p1 + r0.z.abs() * p2,
    )
}

/// The three row indices of a 4x4 matrix other than `skip`, ascending.
fn others(skip: usize) -> [usize; 3] {
    match skip {
        0 => [1, 2, 3],
        1 => [0, 2, 3],
        2 => [0, 1, 3],
        _ => [0, 1, 2],
    }
}

fn lexicographic(a: &Point3<f64>, b: &Point3<f64>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

/// Sorts the points lexicographically; the flag is set for an odd permutation.
fn canonical<const N: usize>(mut points: [&Point3<f64>; N]) -> ([&Point3<f64>; N], bool) {
    let mut odd = false;
    for i in 1..N {
        let mut j = i;
        while j > 0 && lexicographic(points[j - 1], points[j]) == Ordering::Greater {
            points.swap(j - 1, j);
            odd = !odd;
            j -= 1;
        }
    }
    (points, odd)
}
