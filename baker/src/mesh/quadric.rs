use std::ops;

use glam::{DMat3, DVec3};

use super::plane::Plane;

/// Relative determinant below which a quadric has no unique minimum
const SINGULAR_EPSILON: f64 = 1e-6;

/// The error quadric `K = w p p^T` for planes `p`, such that `v^T K v` is the weighted sum of
/// squared distances from `v` to every plane. Only the 10 unique coefficients of the symmetric
/// matrix are stored.
/// Properties: Additive, Symmetric.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Quadric {
    xx: f64,
    yy: f64,
    zz: f64,
    xy: f64,
    xz: f64,
    yz: f64,
    dx: f64,
    dy: f64,
    dz: f64,
    dd: f64,
    /// Surface area the error is spread over
    pub area: f64,
}

impl Quadric {
    pub fn from_plane(plane: Plane, weight: f64) -> Self {
        let DVec3 { x: a, y: b, z: c } = plane.normal;
        let d = plane.d;

        Self {
            xx: weight * a * a,
            yy: weight * b * b,
            zz: weight * c * c,
            xy: weight * a * b,
            xz: weight * a * c,
            yz: weight * b * c,
            dx: weight * a * d,
            dy: weight * b * d,
            dz: weight * c * d,
            dd: weight * d * d,
            area: weight,
        }
    }

    /// Plane quadric of a triangle, weighted by its area. Degenerate triangles contribute nothing.
    pub fn from_triangle(p0: DVec3, p1: DVec3, p2: DVec3) -> Self {
        let area = 0.5 * (p1 - p0).cross(p2 - p0).length();

        match Plane::from_three_points(p0, p1, p2) {
            Some(plane) => Self::from_plane(plane, area),
            None => Self::default(),
        }
    }

    /// Plane through the open edge `p0 -> p1`, perpendicular to the face with `face_normal`.
    /// Resists moving the edge sideways, without adding any area.
    pub fn from_boundary_edge(p0: DVec3, p1: DVec3, face_normal: DVec3, weight: f64) -> Self {
        let edge = p1 - p0;

        let Some(normal) = edge.cross(face_normal).try_normalize() else {
            return Self::default();
        };

        let plane = Plane::from_normal_and_point(normal, p0);

        Self {
            area: 0.0,
            ..Self::from_plane(plane, weight * edge.length_squared())
        }
    }

    /// Calculate error from the quadric and a point, `v^T K v`
    pub fn quadric_error(&self, v: DVec3) -> f64 {
        let DVec3 { x, y, z } = v;

        x * x * self.xx
            + y * y * self.yy
            + z * z * self.zz
            + 2.0 * (x * y * self.xy + x * z * self.xz + y * z * self.yz)
            + 2.0 * (x * self.dx + y * self.dy + z * self.dz)
            + self.dd
    }

    /// Error per unit of area, never negative.
    pub fn evaluate(&self, v: DVec3) -> f64 {
        let error = self.quadric_error(v).max(0.0);

        if self.area > 0.0 {
            error / self.area
        } else {
            error
        }
    }

    /// The point of least error, if the planes pin one down.
    pub fn optimal_point(&self) -> Option<DVec3> {
        let m = DMat3::from_cols(
            DVec3::new(self.xx, self.xy, self.xz),
            DVec3::new(self.xy, self.yy, self.yz),
            DVec3::new(self.xz, self.yz, self.zz),
        );

        let scale = self.xx + self.yy + self.zz;
        if scale <= 0.0 || m.determinant().abs() <= SINGULAR_EPSILON * scale * scale * scale {
            return None;
        }

        let p = m.inverse() * -DVec3::new(self.dx, self.dy, self.dz);

        p.is_finite().then_some(p)
    }
}

impl ops::Add for Quadric {
    type Output = Quadric;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl ops::AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Self) {
        self.xx += rhs.xx;
        self.yy += rhs.yy;
        self.zz += rhs.zz;
        self.xy += rhs.xy;
        self.xz += rhs.xz;
        self.yz += rhs.yz;
        self.dx += rhs.dx;
        self.dy += rhs.dy;
        self.dz += rhs.dz;
        self.dd += rhs.dd;
        self.area += rhs.area;
    }
}
