//! # Curvature Math Kernel
//!
//! Pure functions that map Euclidean offsets onto the constant-curvature model
//! spaces and build the matrices a flat projective rasterizer needs to draw them.
//!
//! ## Models
//! - `curve > 0`: the unit 3-sphere in R⁴, `x² + y² + z² + w² = 1`
//! - `curve < 0`: the upper sheet of the unit hyperboloid, `x² + y² + z² − w² = −1`
//! - `curve = 0`: plain homogeneous affine points `(x, y, z, 1)`
//!
//! The origin of every model is `(0, 0, 0, 1)`. A Euclidean offset `p` is read as a
//! tangent vector at the origin and carried along the geodesic of length `|p|`.
//!
//! Every function here is total. Degenerate inputs (zero-length vectors, the
//! antipode of the origin) take an explicit branch instead of producing NaNs.

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};

/// Offsets shorter than this are treated as the origin itself.
pub const EPSILON: f32 = 1e-4;

/// Curvatures with a magnitude below this are treated as exactly Euclidean.
pub const CURVE_EPSILON: f32 = 1e-3;

/// The origin of every model space.
pub const ORIGIN: Vector4<f32> = Vector4::new(0.0, 0.0, 0.0, 1.0);

/// Embeds a Euclidean offset (as a homogeneous point) into the model of curvature `curve`.
///
/// # Arguments
/// * `point` - Offset from the curved-space origin; only `xyz` is read on the curved branches
/// * `curve` - Signed curvature selecting the model
///
/// # Returns
/// The curved point. Offsets shorter than [`EPSILON`] and flat curvature return `point` unchanged.
pub fn euc_to_curved(point: Vector4<f32>, curve: f32) -> Vector4<f32> {
    let offset = point.truncate();
    let distance = offset.magnitude();
    if distance < EPSILON {
        return point;
    }

    let direction = offset / distance;
    if curve > CURVE_EPSILON {
        (direction * distance.sin()).extend(distance.cos())
    } else if curve < -CURVE_EPSILON {
        (direction * distance.sinh()).extend(distance.cosh())
    } else {
        point
    }
}

/// Embeds a Euclidean offset given as a 3-vector (read as the affine point `(p, 1)`).
pub fn euc_to_curved3(point: Vector3<f32>, curve: f32) -> Vector4<f32> {
    euc_to_curved(point.extend(1.0), curve)
}

/// Inverse of [`euc_to_curved`]: recovers the Euclidean offset of a curved point.
///
/// On the sphere the geodesic distance is read with `atan2`, which stays accurate
/// near both the origin and the antipode. Only offsets shorter than π round-trip on
/// the sphere, since longer geodesics wrap around.
pub fn curved_to_euc(point: Vector4<f32>, curve: f32) -> Vector3<f32> {
    let spatial = point.truncate();
    let sine = spatial.magnitude();

    if curve > CURVE_EPSILON {
        if sine < EPSILON && point.w > 0.0 {
            return spatial;
        }
        let distance = sine.atan2(point.w);
        if sine < EPSILON {
            // Antipode: every direction is equally valid.
            return Vector3::new(distance, 0.0, 0.0);
        }
        spatial / sine * distance
    } else if curve < -CURVE_EPSILON {
        if sine < EPSILON {
            return spatial;
        }
        spatial / sine * sine.asinh()
    } else if point.w.abs() > EPSILON {
        spatial / point.w
    } else {
        spatial
    }
}

/// The bilinear form of the model: `x·x + y·y + z·z + sign(curve)·w·w`.
///
/// Flat curvature drops the `w` term.
pub fn minkowski_dot(a: Vector4<f32>, b: Vector4<f32>, curve: f32) -> f32 {
    let spatial = a.truncate().dot(b.truncate());
    if curve > CURVE_EPSILON {
        spatial + a.w * b.w
    } else if curve < -CURVE_EPSILON {
        spatial - a.w * b.w
    } else {
        spatial
    }
}

/// Geodesic distance between two points of the same model.
pub fn curved_distance(a: Vector4<f32>, b: Vector4<f32>, curve: f32) -> f32 {
    if curve > CURVE_EPSILON {
        let cosine = a.dot(b);
        let sine = (a.magnitude2() * b.magnitude2() - cosine * cosine).max(0.0).sqrt();
        sine.atan2(cosine)
    } else if curve < -CURVE_EPSILON {
        (-minkowski_dot(a, b, curve)).max(1.0).acosh()
    } else {
        (a.truncate() - b.truncate()).magnitude()
    }
}

/// Builds the matrix that carries the model origin to `to`.
///
/// For `|curve| < CURVE_EPSILON` this is the affine translation by `to.xyz`. Otherwise
/// it is the closed-form composition of two reflections:
///
/// ```text
/// | I − k·p·pᵀ/(1+w)   p |
/// | −k·pᵀ              w |      p = to.xyz, w = to.w, k = curve
/// ```
///
/// The formula is continuous in `k` and collapses to the affine translation at `k = 0`.
/// The antipode `to.w = −1` has no unique translation; it is answered with the
/// half-turn in the x–w plane, which also maps the origin there.
pub fn translation_matrix(to: Vector4<f32>, curve: f32) -> Matrix4<f32> {
    if curve.abs() < CURVE_EPSILON {
        return Matrix4::from_translation(to.truncate());
    }

    let denominator = 1.0 + to.w;
    if denominator.abs() < EPSILON {
        return Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0) * half_turn_w();
    }

    let (x, y, z) = (to.x, to.y, to.z);
    let k = curve / denominator;

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        1.0 - k * x * x, -k * x * y,       -k * x * z,       -curve * x,
        -k * y * x,      1.0 - k * y * y,  -k * y * z,       -curve * y,
        -k * z * x,      -k * z * y,       1.0 - k * z * z,  -curve * z,
        x,               y,                z,                to.w,
    );
    matrix
}

/// Flips the sign of `w`; combined with an x flip it forms the x–w half-turn.
fn half_turn_w() -> Matrix4<f32> {
    let mut matrix = Matrix4::identity();
    matrix.w.w = -1.0;
    matrix
}

/// Builds the curved view matrix for an eye at `position` looking along `front`.
///
/// The Euclidean look-at basis `(s, u, −f)` is carried to the embedded eye by
/// [`translation_matrix`]; the rows of the result are the carried basis vectors with
/// the translation column and the curvature-scaled bottom row appended. At `curve = 0`
/// the result is exactly `Matrix4::look_to_rh(position, front, up)`.
pub fn view_matrix(
    position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    curve: f32,
) -> Matrix4<f32> {
    let f = front.normalize();
    let s = f.cross(up).normalize();
    let u = s.cross(f);

    let eye = euc_to_curved3(Vector3::new(position.x, position.y, position.z), curve);
    let carry = translation_matrix(eye, curve);

    let ic = carry * s.extend(0.0);
    let jc = carry * u.extend(0.0);
    let kc = carry * (-f).extend(0.0);
    let e = eye.truncate();

    let rows = Matrix4::from_cols(
        Vector4::new(ic.x, ic.y, ic.z, -e.dot(s)),
        Vector4::new(jc.x, jc.y, jc.z, -e.dot(u)),
        Vector4::new(kc.x, kc.y, kc.z, e.dot(f)),
        Vector4::new(curve * e.x, curve * e.y, curve * e.z, eye.w),
    );
    rows.transpose()
}

/// Builds the projection matrix.
///
/// `curve <= CURVE_EPSILON` (flat and hyperbolic) uses the standard OpenGL perspective.
/// On the sphere the field-of-view scale factors are kept and the depth row projects
/// through `tan(near)`: clip depth becomes `−tan(near)·w` over `−z`, which maps the
/// geodesic distance `near` to −1 and the antipodal distance `π − near` to +1, so both
/// hemispheres in front of the eye stay inside the depth range.
pub fn projection_matrix(fov: Rad<f32>, near: f32, far: f32, aspect_ratio: f32, curve: f32) -> Matrix4<f32> {
    if curve <= CURVE_EPSILON {
        return cgmath::perspective(fov, aspect_ratio, near, far);
    }

    let sy = 1.0 / (fov.0 / 2.0).tan();
    let sx = sy / aspect_ratio;
    let curved_near = near.tan();

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        sx,  0.0, 0.0,          0.0,
        0.0, sy,  0.0,          0.0,
        0.0, 0.0, 0.0,          -1.0,
        0.0, 0.0, -curved_near, 0.0,
    );
    matrix
}

/// Reflects `vector` across the plane with normal `normal`.
///
/// The normal does not need to be unit length and its sign does not matter. A zero
/// normal leaves the vector unchanged.
pub fn reflect_vector(vector: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
    let length = normal.magnitude();
    if length < EPSILON {
        return vector;
    }
    let unit = normal / length;
    vector - unit * (2.0 * vector.dot(unit))
}
