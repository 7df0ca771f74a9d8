use crate::{Vec2, Vec3};

/// Caméra orthographique vue de dessus pour la carte de la ferme.
/// Le plan monde XZ est projeté sur l'écran : +X vers la droite, +Z vers le bas.
pub struct MapCamera {
    /// Point du monde (x, z) affiché au centre du viewport
    pub center: Vec2,
    /// Pixels par unité monde (1.0 = 1 pixel par mètre)
    pub zoom: f32,
    /// Vitesse de déplacement (unités monde par seconde)
    pub speed: f32,
    /// Dimensions du viewport en pixels
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl MapCamera {
    pub const MIN_ZOOM: f32 = 0.2;
    pub const MAX_ZOOM: f32 = 20.0;

    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            center: Vec2::new(0.0, 0.0),
            zoom: 1.0,
            speed: 200.0,
            viewport_width,
            viewport_height,
        }
    }

    /// Cadre la caméra sur une zone du monde (min/max en XZ) avec une marge en pixels.
    pub fn fit(&mut self, min: Vec2, max: Vec2, margin: f32) {
        self.center = (min + max) * 0.5;
        let extent = max - min;
        let usable_w = (self.viewport_width - 2.0 * margin).max(1.0);
        let usable_h = (self.viewport_height - 2.0 * margin).max(1.0);
        if extent.x > 0.0 && extent.y > 0.0 {
            self.set_zoom((usable_w / extent.x).min(usable_h / extent.y));
        }
    }

    /// Déplacer la caméra (en pixels écran, ex: glisser de souris)
    pub fn pan_pixels(&mut self, dx: f32, dy: f32) {
        self.center.x -= dx / self.zoom;
        self.center.y -= dy / self.zoom;
    }

    /// Déplacer la caméra avec deltatime
    pub fn process_movement(&mut self, direction: MapMovement, dt: f32) {
        let velocity = self.speed * dt;
        match direction {
            MapMovement::Up => self.center.y -= velocity,
            MapMovement::Down => self.center.y += velocity,
            MapMovement::Left => self.center.x -= velocity,
            MapMovement::Right => self.center.x += velocity,
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    /// Zoom multiplicatif (molette)
    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    /// Mettre à jour les dimensions du viewport (appeler lors du resize)
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Convertir une position monde en position écran (pixels, origine coin haut-gauche)
    pub fn world_to_screen(&self, world: Vec3) -> Vec2 {
        Vec2::new(
            (world.x - self.center.x) * self.zoom + self.viewport_width / 2.0,
            (world.z - self.center.y) * self.zoom + self.viewport_height / 2.0,
        )
    }

    /// Convertir une position écran (pixels) en position monde (x, z)
    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        Vec2::new(
            (screen_x - self.viewport_width / 2.0) / self.zoom + self.center.x,
            (screen_y - self.viewport_height / 2.0) / self.zoom + self.center.y,
        )
    }
}

pub enum MapMovement {
    Up,
    Down,
    Left,
    Right,
}
