use crate::vec3::Vec3;

/// Relative slack added whenever a sphere grows, so containment survives float rounding.
const GROWTH_EPSILON: f32 = 1e-5;

#[derive(Debug, Default, Clone, Copy, bincode::Decode, bincode::Encode, PartialEq)]
pub struct BoundingSphere {
    center: Vec3,
    radius: f32,
}

impl BoundingSphere {
    pub fn new(center: glam::Vec3, radius: f32) -> Self {
        Self {
            center: center.into(),
            radius,
        }
    }

    /// Ritter's sphere: start from the most distant pair of axis extremes, then grow to cover
    /// every outlier. Within a few percent of the minimal sphere.
    pub fn from_points(points: &[glam::Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Self::default();
        };

        let mut min_point = [first; 3];
        let mut max_point = [first; 3];
        for &p in points {
            for axis in 0..3 {
                if p[axis] < min_point[axis][axis] {
                    min_point[axis] = p;
                }
                if p[axis] > max_point[axis][axis] {
                    max_point[axis] = p;
                }
            }
        }

        let axis = (0..3)
            .max_by(|&a, &b| {
                let da = min_point[a].distance_squared(max_point[a]);
                let db = min_point[b].distance_squared(max_point[b]);
                da.total_cmp(&db)
            })
            .unwrap_or(0);

        let mut center = (min_point[axis] + max_point[axis]) * 0.5;
        let mut radius = min_point[axis].distance(max_point[axis]) * 0.5;

        for &p in points {
            let d = p.distance(center);
            if d > radius {
                let new_radius = (radius + d) * 0.5;
                center += (p - center) * ((new_radius - radius) / d);
                radius = new_radius;
            }
        }

        // Rounding in the growth step can leave the last points a hair outside
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(radius, f32::max);

        Self::new(center, radius * (1.0 + GROWTH_EPSILON))
    }

    /// Smallest sphere found by merging each sphere in turn. Contains every input.
    pub fn from_spheres(spheres: &[BoundingSphere]) -> Self {
        let Some((first, rest)) = spheres.split_first() else {
            return Self::default();
        };

        let mut sphere = *first;
        for other in rest {
            sphere.include_sphere(other);
        }
        sphere
    }

    pub fn center(&self) -> glam::Vec3 {
        self.center.0
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn packed(&self) -> glam::Vec4 {
        (self.center.0, self.radius).into()
    }

    pub fn translate(&mut self, offset: glam::Vec3) {
        self.center = (self.center() + offset).into();
    }

    /// Wrapper around including a sphere with 0 radius
    pub fn include_point(&mut self, point: glam::Vec3) {
        self.include_sphere(&BoundingSphere::new(point, 0.0))
    }

    /// Shift this bounding sphere so it completely envelops `other`, with the minimal increase in volume.
    pub fn include_sphere(&mut self, other: &BoundingSphere) {
        let towards_other = other.center() - self.center();
        let distance = towards_other.length();

        if distance + other.radius <= self.radius {
            return;
        }
        if distance + self.radius <= other.radius {
            *self = *other;
            return;
        }

        // The new sphere spans from our far side to the other's far side
        let new_radius = (distance + self.radius + other.radius) * 0.5;
        let shift = new_radius - self.radius;

        self.translate(towards_other * (shift / distance));
        self.radius = new_radius * (1.0 + GROWTH_EPSILON);

        debug_assert!(self.contains_sphere(other), "{self:?} {other:?}");
    }

    /// Containment with a small tolerance for float rounding.
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> bool {
        let max_dist = self.center().distance(sphere.center()) + sphere.radius();
        max_dist <= self.radius * (1.0 + GROWTH_EPSILON) + f32::EPSILON
    }

    pub fn contains_point(&self, point: glam::Vec3) -> bool {
        self.contains_sphere(&BoundingSphere::new(point, 0.0))
    }

    pub fn assert_contains_sphere(&self, sphere: &BoundingSphere) {
        assert!(
            self.contains_sphere(sphere),
            "{self:?} does not contain {sphere:?}"
        )
    }
}

#[cfg(test)]
pub mod test {
    use glam::{vec3, Vec3};

    use crate::bounding_sphere::BoundingSphere;

    #[test]
    fn test_sphere_include_0() {
        let mut s0 = BoundingSphere::new(Vec3::ONE, 1.0);
        let s1 = BoundingSphere::new(Vec3::ONE * 2.0, 1.0);
        let before = s0;

        s0.include_sphere(&s1);

        s0.assert_contains_sphere(&s1);
        s0.assert_contains_sphere(&before);
    }

    #[test]
    fn test_point_include_0() {
        let mut s0 = BoundingSphere::new(Vec3::ONE, 0.0);

        s0.include_point(Vec3::ONE * 2.0);

        assert!(s0.contains_point(Vec3::ONE));
        assert!(s0.contains_point(Vec3::ONE * 2.0));
        assert!((s0.radius() - 3f32.sqrt() / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_sphere_include_1() {
        let mut s0 = BoundingSphere::new(Vec3::ONE, 1.0);
        let s1 = BoundingSphere::new(Vec3::ONE * 2.0, 3.0);

        s0.include_sphere(&s1);

        // s1 already swallows s0
        assert_eq!(s0, s1);
    }

    #[test]
    fn test_sphere_include_2() {
        let mut s0 = BoundingSphere::new(Vec3::ONE, 1.0);
        let s1 = BoundingSphere::new(Vec3::ONE * 2.0, 2.0);
        let before = s0;

        s0.include_sphere(&s1);

        s0.assert_contains_sphere(&s1);
        s0.assert_contains_sphere(&before);
    }

    #[test]
    fn test_sphere_include_3() {
        let mut s0 = BoundingSphere::new(vec3(6.6490693, -9.154039, 18.179909), 2.1208615);
        let s1 = BoundingSphere::new(vec3(6.9035482, -9.225378, 18.632265), 1.5969583);
        let before = s0;

        s0.include_sphere(&s1);

        s0.assert_contains_sphere(&s1);
        s0.assert_contains_sphere(&before);
    }

    #[test]
    fn test_from_points() {
        let points: Vec<_> = (0..100)
            .map(|i| {
                let t = i as f32 * 0.37;
                vec3(t.sin() * 3.0, t.cos() * 2.0, (t * 0.5).sin() - 4.0)
            })
            .collect();

        let sphere = BoundingSphere::from_points(&points);

        for &p in &points {
            assert!(sphere.contains_point(p), "{p} outside {sphere:?}");
        }
        assert!(sphere.radius() < 4.5);
    }

    #[test]
    fn test_from_spheres() {
        let spheres = [
            BoundingSphere::new(vec3(0.0, 0.0, 0.0), 1.0),
            BoundingSphere::new(vec3(5.0, 0.0, 0.0), 0.5),
            BoundingSphere::new(vec3(2.0, 3.0, -1.0), 2.0),
        ];

        let merged = BoundingSphere::from_spheres(&spheres);

        for s in &spheres {
            merged.assert_contains_sphere(s);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(BoundingSphere::from_points(&[]), BoundingSphere::default());
        assert_eq!(BoundingSphere::from_spheres(&[]), BoundingSphere::default());
    }
}
