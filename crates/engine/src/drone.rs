//! Survol de la ferme par le drone : orbite circulaire, nez toujours tourné vers le centre.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use crate::{Asset, FrameClock, Quat, Transform, Vec3};

pub struct DroneFlight {
    pub model: Option<Arc<Asset>>,
    pub transform: Transform,
    center: Vec3,
    radius: f32,
    height: f32,
    angular_speed: f32,
    angle: f32,
    flying: bool,
    base: Quat,
    roll: Quat,
}

impl DroneFlight {
    pub const RADIUS: f32 = 150.0;
    pub const HEIGHT: f32 = 60.0;
    /// 0.01 rad par frame à 60 Hz
    pub const ANGULAR_SPEED: f32 = 0.6;
    pub const SCALE: f32 = 5.0;
    const ROLL: f32 = PI / 10.0;

    pub fn new(model: Option<Arc<Asset>>) -> Self {
        if model.is_none() {
            log::warn!("drone model not loaded, flight kept without mesh");
        }
        let mut drone = Self {
            model,
            transform: Transform::default().with_uniform_scale(Self::SCALE),
            center: Vec3::zeros(),
            radius: Self::RADIUS,
            height: Self::HEIGHT,
            angular_speed: Self::ANGULAR_SPEED,
            angle: 0.0,
            flying: true,
            base: Quat::from_axis_angle(&Vec3::y_axis(), -FRAC_PI_2),
            roll: Quat::from_axis_angle(&Vec3::z_axis(), Self::ROLL),
        };
        drone.place();
        drone
    }

    pub fn with_orbit(mut self, center: Vec3, radius: f32, height: f32) -> Self {
        self.center = center;
        self.radius = radius;
        self.height = height;
        self.place();
        self
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    /// Immobilise le drone à sa position courante.
    pub fn stop(&mut self) {
        self.flying = false;
    }

    pub fn update(&mut self, clock: &mut impl FrameClock) {
        let dt = clock.tick();
        self.advance(dt);
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.flying || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.angle = (self.angle + dt * self.angular_speed).rem_euclid(2.0 * PI);
        self.place();
    }

    fn place(&mut self) {
        let position = Vec3::new(
            self.center.x + self.radius * self.angle.cos(),
            self.height,
            self.center.z + self.radius * self.angle.sin(),
        );
        self.transform.position = position;

        let target = Vec3::new(self.center.x, self.height, self.center.z);
        let heading = (target - position).normalize();
        // l'avant du modèle est -X
        let default_forward = -Vec3::x();
        let facing = Quat::rotation_between(&default_forward, &heading)
            .unwrap_or_else(|| Quat::from_axis_angle(&Vec3::y_axis(), PI));

        self.transform.rotation = self.base * facing * self.roll;
    }
}
