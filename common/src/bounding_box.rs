use crate::vec3::Vec3;

/// Axis aligned bounding box. The default box is empty and absorbs the first point included.
#[derive(Debug, Clone, Copy, bincode::Decode, bincode::Encode, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: glam::Vec3::INFINITY.into(),
            max: glam::Vec3::NEG_INFINITY.into(),
        }
    }
}

impl BoundingBox {
    pub fn new(min: glam::Vec3, max: glam::Vec3) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = glam::Vec3>) -> Self {
        let mut aabb = Self::default();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    pub fn min(&self) -> glam::Vec3 {
        self.min.0
    }

    pub fn max(&self) -> glam::Vec3 {
        self.max.0
    }

    pub fn is_empty(&self) -> bool {
        self.min.0.cmpgt(self.max.0).any()
    }

    pub fn center(&self) -> glam::Vec3 {
        (self.min.0 + self.max.0) * 0.5
    }

    pub fn extent(&self) -> glam::Vec3 {
        if self.is_empty() {
            glam::Vec3::ZERO
        } else {
            self.max.0 - self.min.0
        }
    }

    pub fn include_point(&mut self, p: glam::Vec3) {
        self.min = self.min.0.min(p).into();
        self.max = self.max.0.max(p).into();
    }

    pub fn include_box(&mut self, other: &BoundingBox) {
        self.min = self.min.0.min(other.min.0).into();
        self.max = self.max.0.max(other.max.0).into();
    }

    pub fn contains_point(&self, p: glam::Vec3) -> bool {
        p.cmpge(self.min.0).all() && p.cmple(self.max.0).all()
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn test_empty_box() {
        let aabb = BoundingBox::default();

        assert!(aabb.is_empty());
        assert_eq!(aabb.extent(), glam::Vec3::ZERO);
        assert!(!aabb.contains_point(glam::Vec3::ZERO));
    }

    #[test]
    fn test_from_points() {
        let aabb = BoundingBox::from_points([
            vec3(1.0, -2.0, 0.5),
            vec3(-1.0, 4.0, 0.0),
            vec3(0.0, 0.0, 3.0),
        ]);

        assert_eq!(aabb.min(), vec3(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max(), vec3(1.0, 4.0, 3.0));
        assert_eq!(aabb.center(), vec3(0.0, 1.0, 1.5));
        assert!(aabb.contains_point(vec3(0.5, 3.0, 2.0)));
    }

    #[test]
    fn test_include_box() {
        let mut a = BoundingBox::new(glam::Vec3::ZERO, glam::Vec3::ONE);
        a.include_box(&BoundingBox::new(vec3(-1.0, 0.5, 0.5), vec3(0.0, 2.0, 0.5)));

        assert_eq!(a.min(), vec3(-1.0, 0.0, 0.0));
        assert_eq!(a.max(), vec3(1.0, 2.0, 1.0));

        let before = a;
        a.include_box(&BoundingBox::default());
        assert_eq!(a, before);
    }
}
