use crate::{Mat4, Quat, Vec3};

/// Position / orientation / échelle d'un objet de la scène.
/// L'orientation est un quaternion pour pouvoir composer "regarder vers" puis un lacet additionnel.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let translation = Mat4::new_translation(&self.position);
        let rotation = self.rotation.to_homogeneous();
        let scale = Mat4::new_nonuniform_scaling(&self.scale);

        translation * rotation * scale
    }

    /// Oriente l'objet pour que son axe +Z local pointe vers `target` (rotation autour de Y seulement).
    /// Si la cible est confondue avec la position, l'orientation reste inchangée.
    pub fn look_at_horizontal(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.x.abs() < f32::EPSILON && dir.z.abs() < f32::EPSILON {
            return;
        }
        self.rotation = Quat::from_euler_angles(0.0, dir.x.atan2(dir.z), 0.0);
    }

    /// Ajoute un lacet (rotation autour de Y) à l'orientation courante.
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotation = self.rotation * Quat::from_euler_angles(0.0, angle, 0.0);
    }

    /// Angle de lacet courant (radians), utilisé par la vue de dessus.
    pub fn yaw(&self) -> f32 {
        let forward = self.rotation * Vec3::z();
        forward.x.atan2(forward.z)
    }
}
