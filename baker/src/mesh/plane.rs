use glam::DVec3;

/// Plane `normal . p + d = 0`, with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    pub fn from_normal_and_point(normal: DVec3, p: DVec3) -> Self {
        Self {
            normal,
            d: -p.dot(normal),
        }
    }

    /// Generate plane from the 3 points a,b,c, wound counter clockwise. `None` if they are colinear.
    pub fn from_three_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let normal = (b - a).cross(c - a).try_normalize()?;

        Some(Self::from_normal_and_point(normal, a))
    }

    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }
}
