//! Assemblage de la scène de la ferme une fois les resources chargées, puis boucle par frame.

use std::time::Duration;

use crate::{
    DroneFlight, FireScheduler, FrameClock, Hit, HudTable, Inspector, Label, ResourceManager,
    SceneRegistry, Timeline, Vec3, VehicleConfig, VehicleScheduler, frame_duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneEvent {
    StartFires,
}

pub struct FarmScene {
    registry: SceneRegistry,
    labels: Vec<Label>,
    pub vehicles: VehicleScheduler,
    pub drone: DroneFlight,
    pub fires: FireScheduler,
    pub inspector: Inspector,
    timeline: Timeline<SceneEvent>,
}

impl FarmScene {
    pub const FIRE_START_DELAY: Duration = Duration::from_millis(3000);
    /// Tolérance du picking vue de dessus, en unités monde
    pub const PICK_RADIUS: f32 = 12.0;

    /// Construit la scène depuis le cache. Les objets manquants dégradent la scène sans l'interrompre.
    pub fn assemble(resources: &ResourceManager, hud: HudTable, seed: Option<u64>) -> Self {
        let registry = match resources.model("main") {
            Some(model) => SceneRegistry::from_model(model),
            None => {
                log::warn!("scene: main model not loaded, the farm is empty");
                SceneRegistry::default()
            }
        };
        Self::from_registry(registry, resources, hud, seed)
    }

    pub fn from_registry(
        registry: SceneRegistry,
        resources: &ResourceManager,
        hud: HudTable,
        seed: Option<u64>,
    ) -> Self {
        let (anchor, road_bounds) = match registry.road() {
            Some(road) => (road.anchor, road.bounds),
            None => (Vec3::zeros(), None),
        };
        let mut vehicles = VehicleScheduler::new(anchor, road_bounds);
        vehicles.spawn_from(resources, VehicleConfig::farm_traffic());
        vehicles.start();

        let drone = DroneFlight::new(resources.get("models.drone"));

        let granaries = registry.granaries().to_vec();
        let fires = match seed {
            Some(seed) => FireScheduler::with_seed(granaries, seed),
            None => FireScheduler::new(granaries),
        };

        let mut timeline = Timeline::new();
        timeline.schedule_in(Self::FIRE_START_DELAY, SceneEvent::StartFires);

        log::info!(
            "scene assembled: {} granaries, {} vehicles, {} HUD records",
            registry.granaries().len(),
            vehicles.vehicles().len(),
            hud.len()
        );

        Self {
            labels: registry.granary_labels(),
            registry,
            vehicles,
            drone,
            fires,
            inspector: Inspector::new(hud),
            timeline,
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Étiquettes de nom des greniers.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn update(&mut self, clock: &mut impl FrameClock) {
        let dt = clock.tick();
        self.advance(dt);
    }

    pub fn advance(&mut self, dt: f32) {
        self.timeline.advance(frame_duration(dt));
        while let Some(event) = self.timeline.pop_due() {
            match event {
                SceneEvent::StartFires => self.fires.start(),
            }
        }

        self.vehicles.advance(dt);
        self.drone.advance(dt);
        self.fires.advance(dt);
        self.inspector.advance(dt);
    }

    /// Clic sur la carte, en coordonnées monde (x, z).
    pub fn click(&mut self, x: f32, z: f32) -> bool {
        let hit = self.registry.pick(x, z, Self::PICK_RADIUS).map(|granary| Hit {
            name: granary.name.clone(),
            point: Some(Vec3::new(x, granary.roof_position().y, z)),
            origin: granary.position,
        });
        self.inspector.on_click(hit)
    }

    pub fn stop(&mut self) {
        self.timeline.clear();
        self.vehicles.stop();
        self.fires.stop();
        self.drone.stop();
        self.inspector.hide();
    }
}
