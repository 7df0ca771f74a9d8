//! Vue de dessus de la ferme, dessinée avec le painter egui.

use std::collections::HashMap;

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, TextureHandle, pos2, vec2};
use engine::{
    Aabb, FarmScene, FireEffect, Flipbook, MapCamera, StructureKind, Transform, Vec2, Vec3,
};

const GROUND: Color32 = Color32::from_rgb(86, 125, 70);
const ROAD: Color32 = Color32::from_rgb(70, 70, 76);
const LABEL: Color32 = Color32::WHITE;
const WARNING: Color32 = Color32::from_rgb(255, 80, 60);

/// Textures egui dérivées des resources chargées.
#[derive(Default)]
pub struct MapTextures {
    pub flame: Option<TextureHandle>,
    pub info_bg: Option<TextureHandle>,
    pub temperature: Option<TextureHandle>,
    /// Images de grains, par nom de la section `beans`
    pub beans: HashMap<String, TextureHandle>,
}

pub fn to_pos(camera: &MapCamera, world: Vec3) -> Pos2 {
    let p = camera.world_to_screen(world);
    pos2(p.x, p.y)
}

fn to_rect(camera: &MapCamera, bounds: &Aabb) -> Rect {
    Rect::from_two_pos(to_pos(camera, bounds.min), to_pos(camera, bounds.max))
}

pub fn structure_color(kind: StructureKind) -> Color32 {
    match kind {
        StructureKind::VerticalSilo => Color32::from_rgb(200, 200, 190),
        StructureKind::ShallowSilo => Color32::from_rgb(170, 190, 210),
        StructureKind::FlatWarehouse => Color32::from_rgb(210, 180, 140),
        StructureKind::Unknown => Color32::GRAY,
    }
}

/// Zone de la planche de flammes à afficher pour l'image courante.
pub fn flame_uv(flipbook: &Flipbook) -> Rect {
    let u = flipbook.uv_offset();
    Rect::from_min_max(pos2(u, 0.0), pos2(u + flipbook.uv_width(), 1.0))
}

/// Contour d'un objet orienté : rectangle `length` x `width` aligné sur son lacet.
pub fn footprint(transform: &Transform, length: f32, width: f32) -> [Vec3; 4] {
    let yaw = transform.yaw();
    let forward = Vec2::new(yaw.sin(), yaw.cos()) * (length / 2.0);
    let side = Vec2::new(yaw.cos(), -yaw.sin()) * (width / 2.0);
    let c = Vec2::new(transform.position.x, transform.position.z);
    [
        c + forward + side,
        c + forward - side,
        c - forward - side,
        c - forward + side,
    ]
    .map(|p| Vec3::new(p.x, 0.0, p.y))
}

fn vehicle_color(model_key: &str) -> Color32 {
    match model_key {
        "truck" => Color32::from_rgb(230, 160, 40),
        "aston" => Color32::from_rgb(40, 90, 200),
        "tesla" => Color32::from_rgb(220, 220, 220),
        _ => Color32::LIGHT_GRAY,
    }
}

pub fn draw_farm(painter: &Painter, camera: &MapCamera, scene: &FarmScene, textures: &MapTextures) {
    let registry = scene.registry();

    if let Some(bounds) = registry.bounds() {
        painter.rect_filled(to_rect(camera, &bounds), 0.0, GROUND);
    }
    if let Some(bounds) = registry.road().and_then(|road| road.bounds) {
        painter.rect_filled(to_rect(camera, &bounds), 0.0, ROAD);
    }

    for granary in registry.granaries() {
        let color = structure_color(granary.kind);
        match &granary.footprint {
            Some(bounds) => painter.rect_filled(to_rect(camera, bounds), 2.0, color),
            None => painter.circle_filled(
                to_pos(camera, granary.position),
                6.0 * camera.zoom,
                color,
            ),
        };
        if scene.fires.is_burning(&granary.name) {
            painter.circle_stroke(
                to_pos(camera, granary.position),
                10.0 * camera.zoom,
                Stroke::new(2.0, WARNING),
            );
        }
    }

    for label in scene.labels() {
        painter.text(
            to_pos(camera, label.position) - vec2(0.0, 8.0),
            Align2::CENTER_BOTTOM,
            &label.text,
            FontId::proportional(13.0),
            LABEL,
        );
    }

    for vehicle in scene.vehicles.vehicles() {
        let outline = footprint(&vehicle.transform, 9.0, 4.0)
            .map(|p| to_pos(camera, p))
            .to_vec();
        painter.add(Shape::convex_polygon(
            outline,
            vehicle_color(&vehicle.config.model_key),
            Stroke::new(1.0, Color32::BLACK),
        ));
    }

    draw_drone(painter, camera, &scene.drone.transform);

    for fire in scene.fires.active_fires() {
        draw_fire(painter, camera, fire, textures.flame.as_ref());
    }
}

fn draw_drone(painter: &Painter, camera: &MapCamera, transform: &Transform) {
    let center = to_pos(camera, transform.position);
    let radius = (4.0 * camera.zoom).max(4.0);
    painter.circle_filled(center, radius, Color32::from_rgb(30, 30, 30));
    painter.circle_stroke(center, radius * 2.0, Stroke::new(1.0, Color32::from_gray(200)));
}

fn draw_fire(painter: &Painter, camera: &MapCamera, fire: &FireEffect, flame: Option<&TextureHandle>) {
    let (width, height) = FireEffect::SIZE;
    let base = to_pos(camera, fire.position);
    let size = vec2(width, height) * camera.zoom;
    let rect = Rect::from_center_size(base - vec2(0.0, size.y / 2.0), size);

    match flame {
        Some(texture) => {
            painter.image(texture.id(), rect, flame_uv(&fire.flipbook), Color32::WHITE);
        }
        None => {
            painter.rect_filled(rect, 4.0, Color32::from_rgba_unmultiplied(255, 110, 20, 200));
        }
    }

    painter.text(
        rect.center_top() - vec2(0.0, 4.0),
        Align2::CENTER_BOTTOM,
        &fire.warning.text,
        FontId::proportional(14.0),
        WARNING,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flame_uv_selects_one_frame_of_the_strip() {
        let mut flipbook = Flipbook::default();
        flipbook.advance(1.0);
        let uv = flame_uv(&flipbook);
        assert!((uv.min.x - 4.0 / 15.0).abs() < 1e-6);
        assert!((uv.width() - 1.0 / 15.0).abs() < 1e-6);
        assert_eq!(uv.height(), 1.0);
    }

    #[test]
    fn footprint_is_centered_and_oriented() {
        let mut transform = Transform::from_position(Vec3::new(10.0, 3.0, 20.0));
        transform.look_at_horizontal(Vec3::new(100.0, 3.0, 20.0));
        let corners = footprint(&transform, 10.0, 4.0);

        let center = corners.iter().fold(Vec3::zeros(), |acc, c| acc + c) / 4.0;
        assert!((center - Vec3::new(10.0, 0.0, 20.0)).norm() < 1e-4);
        // la longueur suit +X
        let xs: Vec<f32> = corners.iter().map(|c| c.x).collect();
        let spread = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        assert!((spread - 10.0).abs() < 1e-4);
    }

    #[test]
    fn screen_positions_follow_the_camera() {
        let mut camera = MapCamera::new(800.0, 600.0);
        camera.center = Vec2::new(100.0, 50.0);
        camera.set_zoom(2.0);
        let p = to_pos(&camera, Vec3::new(110.0, 99.0, 50.0));
        assert_eq!(p, pos2(420.0, 300.0));
    }
}
