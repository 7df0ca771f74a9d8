pub type Vec2 = nalgebra::Vector2<f32>;
pub type Vec3 = nalgebra::Vector3<f32>;
pub type Mat3 = nalgebra::Matrix3<f32>;
pub type Mat4 = nalgebra::Matrix4<f32>;
pub type Quat = nalgebra::UnitQuaternion<f32>;

pub trait Interpolate {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// Boîte englobante alignée sur les axes (espace monde).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Construit la boîte qui contient tous les points fournis.
    /// Retourne `None` si l'itérateur est vide.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Aabb::new(first, first);
        for p in iter {
            bounds.min = bounds.min.inf(&p);
            bounds.max = bounds.max.sup(&p);
        }
        Some(bounds)
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Applique une transformation affine et recalcule une boîte alignée
    /// à partir des 8 coins transformés.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix
                .transform_point(&nalgebra::Point3::from(corner))
                .coords
        });
        // 8 coins, jamais vide
        Aabb::from_points(corners).unwrap_or(*self)
    }

    /// Vrai si le point (x, z) tombe dans l'empreinte au sol de la boîte.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_from_points_and_size() {
        let bounds = Aabb::from_points([
            Vec3::new(0.0, 1.0, 40.0),
            Vec3::new(100.0, -1.0, 60.0),
            Vec3::new(50.0, 0.0, 50.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(0.0, -1.0, 40.0));
        assert_eq!(bounds.max, Vec3::new(100.0, 1.0, 60.0));
        assert_eq!(bounds.size(), Vec3::new(100.0, 2.0, 20.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn aabb_transformed_by_translation() {
        let bounds = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let moved = bounds.transformed(&Mat4::new_translation(&Vec3::new(10.0, 0.0, -5.0)));
        assert_eq!(moved.min, Vec3::new(10.0, 0.0, -5.0));
        assert_eq!(moved.max, Vec3::new(11.0, 1.0, -4.0));
        assert!(moved.contains_xz(10.5, -4.5));
        assert!(!moved.contains_xz(9.0, -4.5));
    }
}
