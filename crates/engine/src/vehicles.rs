//! Trafic sur la route : chemins dérivés de la boîte de la route, animation de position
//! en lecture unique, puis remise au départ après une pause, indéfiniment.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    Aabb, AnimationAction, Asset, FrameClock, PositionTrack, ResourceManager, Timeline, Transform,
    Vec2, Vec3, frame_duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// départ -> arrivée
    Forward,
    /// arrivée -> départ
    Backward,
}

/// Axe horizontal dominant de la route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadAxis {
    X,
    Z,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleConfig {
    /// Nom dans la section `models` du manifeste
    pub model_key: String,
    pub direction: Direction,
    pub lane_offset: f32,
    pub scale: f32,
    pub speed: f32,
    /// Délai de démarrage depuis l'assemblage de la scène
    pub delay: Duration,
    /// Correction de lacet pour les modèles dont l'avant n'est pas +Z
    pub extra_yaw: Option<f32>,
    pub y_offset: f32,
}

impl VehicleConfig {
    /// Le trafic de la ferme : camion, Aston Martin, Tesla.
    pub fn farm_traffic() -> Vec<VehicleConfig> {
        vec![
            VehicleConfig {
                model_key: "truck".to_string(),
                direction: Direction::Forward,
                lane_offset: 7.0,
                scale: 3.0,
                speed: 1.0,
                delay: Duration::ZERO,
                extra_yaw: None,
                y_offset: 7.0,
            },
            VehicleConfig {
                model_key: "aston".to_string(),
                direction: Direction::Backward,
                lane_offset: -7.0,
                scale: 4.0,
                speed: 1.2,
                delay: Duration::from_millis(3000),
                extra_yaw: None,
                y_offset: 0.5,
            },
            VehicleConfig {
                model_key: "tesla".to_string(),
                direction: Direction::Forward,
                lane_offset: 11.0,
                scale: 0.004,
                speed: 1.0,
                delay: Duration::from_millis(6000),
                extra_yaw: Some(-std::f32::consts::TAU),
                y_offset: 0.0,
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePath {
    pub start: Vec3,
    pub middle: Vec3,
    pub end: Vec3,
}

pub struct Vehicle {
    pub config: VehicleConfig,
    pub model: Arc<Asset>,
    pub transform: Transform,
    pub path: VehiclePath,
    action: Option<AnimationAction>,
}

impl Vehicle {
    pub fn is_moving(&self) -> bool {
        self.action.as_ref().is_some_and(|a| a.is_playing())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VehicleEvent {
    Start(usize),
    Reset(usize),
}

pub struct VehicleScheduler {
    anchor: Vec3,
    road_bounds: Option<Aabb>,
    /// (x, z) des points départ / milieu / arrivée
    road_path: [Vec2; 3],
    axis: RoadAxis,
    base_duration: f32,
    wait: Duration,
    vehicles: Vec<Vehicle>,
    timeline: Timeline<VehicleEvent>,
    running: bool,
}

impl VehicleScheduler {
    pub const BASE_DURATION: f32 = 10.0;
    pub const WAIT: Duration = Duration::from_secs(5);
    /// Marge aux extrémités de la route
    const INSET: f32 = 0.1;

    pub fn new(anchor: Vec3, road_bounds: Option<Aabb>) -> Self {
        let here = Vec2::new(anchor.x, anchor.z);
        let mut scheduler = Self {
            anchor,
            road_bounds,
            road_path: [here; 3],
            axis: RoadAxis::X,
            base_duration: Self::BASE_DURATION,
            wait: Self::WAIT,
            vehicles: Vec::new(),
            timeline: Timeline::new(),
            running: false,
        };
        scheduler.calculate_road_path();
        scheduler
    }

    pub fn with_timing(mut self, base_duration: f32, wait: Duration) -> Self {
        self.base_duration = base_duration;
        self.wait = wait;
        self
    }

    /// Dérive le chemin de la boîte de la route. Sans route, le chemin courant est conservé.
    fn calculate_road_path(&mut self) {
        let Some(bounds) = self.road_bounds else {
            return;
        };
        let size = bounds.size();
        let (ax, az) = (self.anchor.x, self.anchor.z);
        if size.x > size.z {
            self.axis = RoadAxis::X;
            self.road_path = [
                Vec2::new(bounds.min.x + size.x * Self::INSET, az),
                Vec2::new(ax, az),
                Vec2::new(bounds.max.x - size.x * Self::INSET, az),
            ];
        } else {
            self.axis = RoadAxis::Z;
            self.road_path = [
                Vec2::new(ax, bounds.min.z + size.z * Self::INSET),
                Vec2::new(ax, az),
                Vec2::new(ax, bounds.max.z - size.z * Self::INSET),
            ];
        }
    }

    /// Remplace le chemin (x, z) de la route.
    pub fn set_road_path(&mut self, path: [Vec2; 3]) {
        self.road_path = path;
        self.road_bounds = None;
    }

    pub fn road_path(&self) -> [Vec2; 3] {
        self.road_path
    }

    pub fn axis(&self) -> RoadAxis {
        self.axis
    }

    /// Chemin d'un véhicule : sens de parcours, voie décalée perpendiculairement à la route.
    pub fn path_for(&self, config: &VehicleConfig) -> VehiclePath {
        let y = self.anchor.y + config.y_offset;
        let lane = match self.axis {
            RoadAxis::X => Vec2::new(0.0, config.lane_offset),
            RoadAxis::Z => Vec2::new(config.lane_offset, 0.0),
        };
        let point = |p: Vec2| {
            let p = p + lane;
            Vec3::new(p.x, y, p.y)
        };
        let [a, m, b] = self.road_path;
        match config.direction {
            Direction::Forward => VehiclePath {
                start: point(a),
                middle: point(m),
                end: point(b),
            },
            Direction::Backward => VehiclePath {
                start: point(b),
                middle: point(m),
                end: point(a),
            },
        }
    }

    fn place_at_start(transform: &mut Transform, path: &VehiclePath, config: &VehicleConfig) {
        transform.position = path.start;
        transform.look_at_horizontal(path.end);
        if let Some(yaw) = config.extra_yaw {
            transform.rotate_y(yaw);
        }
    }

    /// Ajoute un véhicule à la route. Sans modèle chargé, le véhicule est ignoré.
    pub fn spawn(&mut self, config: VehicleConfig, model: Option<Arc<Asset>>) -> Option<usize> {
        let Some(model) = model else {
            log::warn!("vehicle model not loaded: {}", config.model_key);
            return None;
        };
        let path = self.path_for(&config);
        let mut transform = Transform::default().with_uniform_scale(config.scale);
        Self::place_at_start(&mut transform, &path, &config);

        log::info!("vehicle ready: {}", config.model_key);
        self.vehicles.push(Vehicle {
            config,
            model,
            transform,
            path,
            action: None,
        });
        Some(self.vehicles.len() - 1)
    }

    /// Crée les véhicules depuis le cache de resources.
    pub fn spawn_from(&mut self, resources: &ResourceManager, configs: Vec<VehicleConfig>) {
        for config in configs {
            let model = resources
                .get(&format!("models.{}", config.model_key))
                .filter(|asset| asset.as_model().is_some());
            self.spawn(config, model);
        }
    }

    /// Lance les animations, chaque véhicule après son délai.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        for index in 0..self.vehicles.len() {
            let delay = self.vehicles[index].config.delay;
            if delay.is_zero() {
                self.start_vehicle(index);
            } else {
                self.timeline.schedule_in(delay, VehicleEvent::Start(index));
            }
        }
    }

    fn start_vehicle(&mut self, index: usize) {
        let duration = self.base_duration / self.vehicles[index].config.speed.max(f32::EPSILON);
        let vehicle = &mut self.vehicles[index];
        let track = PositionTrack::new([
            (0.0, vehicle.path.start),
            (duration / 2.0, vehicle.path.middle),
            (duration, vehicle.path.end),
        ]);
        let Some(track) = track else {
            log::warn!("vehicle {}: invalid animation track", vehicle.config.model_key);
            return;
        };
        let mut action = AnimationAction::new(track);
        action.play();
        vehicle.action = Some(action);
    }

    fn reset_vehicle(&mut self, index: usize) {
        self.calculate_road_path();
        let path = self.path_for(&self.vehicles[index].config);
        let vehicle = &mut self.vehicles[index];
        vehicle.path = path;
        Self::place_at_start(&mut vehicle.transform, &path, &vehicle.config);
        self.start_vehicle(index);
    }

    /// À appeler une fois par frame par la boucle de rendu.
    pub fn update(&mut self, clock: &mut impl FrameClock) {
        let dt = clock.tick();
        self.advance(dt);
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.running {
            return;
        }

        self.timeline.advance(frame_duration(dt));
        let horizon = self.timeline.horizon();
        // une action lancée en cours de frame n'avance que du temps restant après son échéance
        let mut lead: HashMap<usize, f32> = HashMap::new();
        while let Some(event) = self.timeline.pop_due() {
            let index = match event {
                VehicleEvent::Start(index) => {
                    self.start_vehicle(index);
                    index
                }
                VehicleEvent::Reset(index) => {
                    self.reset_vehicle(index);
                    index
                }
            };
            let remaining = horizon.saturating_sub(self.timeline.now());
            lead.insert(index, remaining.as_secs_f32());
        }

        for index in 0..self.vehicles.len() {
            let vehicle = &mut self.vehicles[index];
            let Some(action) = vehicle.action.as_mut() else {
                continue;
            };
            let step = lead.get(&index).copied().unwrap_or(dt);
            let overshoot = (action.time() + step - action.duration()).max(0.0);
            let finished = action.update(step);
            vehicle.transform.position = action.position();
            if finished {
                let wait = self.wait.saturating_sub(frame_duration(overshoot));
                self.timeline.schedule_in(wait, VehicleEvent::Reset(index));
            }
        }
    }

    /// Arrête toutes les animations et retire les véhicules de la scène.
    pub fn stop(&mut self) {
        self.running = false;
        self.timeline.clear();
        for vehicle in &mut self.vehicles {
            if let Some(action) = vehicle.action.as_mut() {
                action.stop();
            }
        }
        self.vehicles.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedStep, ModelAsset};

    fn road() -> Aabb {
        Aabb::new(Vec3::new(0.0, 0.0, 40.0), Vec3::new(100.0, 0.1, 60.0))
    }

    fn config(direction: Direction) -> VehicleConfig {
        VehicleConfig {
            model_key: "truck".to_string(),
            direction,
            lane_offset: 7.0,
            scale: 1.0,
            speed: 1.0,
            delay: Duration::ZERO,
            extra_yaw: None,
            y_offset: 2.0,
        }
    }

    fn model() -> Option<Arc<Asset>> {
        Some(Arc::new(Asset::Model(ModelAsset::default())))
    }

    #[test]
    fn forward_and_backward_paths_are_mirrored() {
        let scheduler = VehicleScheduler::new(Vec3::new(50.0, 1.0, 50.0), Some(road()));
        assert_eq!(scheduler.axis(), RoadAxis::X);

        let forward = scheduler.path_for(&config(Direction::Forward));
        assert_eq!(
            [forward.start.x, forward.middle.x, forward.end.x],
            [10.0, 50.0, 90.0]
        );
        assert!([forward.start.z, forward.middle.z, forward.end.z]
            .iter()
            .all(|&z| z == 57.0));
        assert_eq!(forward.start.y, 3.0);

        let backward = scheduler.path_for(&config(Direction::Backward));
        assert_eq!(backward.start, forward.end);
        assert_eq!(backward.middle, forward.middle);
        assert_eq!(backward.end, forward.start);
    }

    #[test]
    fn z_dominant_road_offsets_lane_on_x() {
        let bounds = Aabb::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 200.0));
        let scheduler = VehicleScheduler::new(Vec3::new(0.0, 0.0, 100.0), Some(bounds));
        assert_eq!(scheduler.axis(), RoadAxis::Z);

        let path = scheduler.path_for(&config(Direction::Forward));
        assert_eq!(path.start, Vec3::new(7.0, 2.0, 20.0));
        assert_eq!(path.end, Vec3::new(7.0, 2.0, 180.0));
    }

    #[test]
    fn missing_road_keeps_default_path() {
        let scheduler = VehicleScheduler::new(Vec3::new(5.0, 0.0, 5.0), None);
        assert_eq!(scheduler.road_path(), [Vec2::new(5.0, 5.0); 3]);
    }

    #[test]
    fn vehicle_without_model_is_skipped() {
        let mut scheduler = VehicleScheduler::new(Vec3::zeros(), Some(road()));
        assert_eq!(scheduler.spawn(config(Direction::Forward), None), None);
        assert!(scheduler.vehicles().is_empty());
    }

    #[test]
    fn vehicle_faces_its_destination() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()));
        scheduler.spawn(config(Direction::Backward), model());
        let forward = scheduler.vehicles()[0].transform.rotation * Vec3::z();
        assert!((forward - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn animation_runs_waits_and_restarts() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()))
            .with_timing(10.0, Duration::from_secs(5));
        scheduler.spawn(config(Direction::Forward), model());
        scheduler.start();

        let mut clock = FixedStep(0.5);
        for _ in 0..10 {
            scheduler.update(&mut clock);
        }
        // 5 s : milieu du trajet
        assert_eq!(scheduler.vehicles()[0].transform.position.x, 50.0);

        for _ in 0..10 {
            scheduler.update(&mut clock);
        }
        // 10 s : arrivé, figé en bout de route
        assert_eq!(scheduler.vehicles()[0].transform.position.x, 90.0);
        assert!(!scheduler.vehicles()[0].is_moving());

        for _ in 0..9 {
            scheduler.update(&mut clock);
        }
        assert_eq!(scheduler.vehicles()[0].transform.position.x, 90.0);

        // 15 s : remis au départ et relancé
        scheduler.update(&mut clock);
        assert!(scheduler.vehicles()[0].is_moving());
        assert!(scheduler.vehicles()[0].transform.position.x < 20.0);
    }

    #[test]
    fn delayed_vehicle_waits_for_its_turn() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()));
        let mut late = config(Direction::Forward);
        late.delay = Duration::from_millis(3000);
        scheduler.spawn(late, model());
        scheduler.start();

        scheduler.advance(2.9);
        assert!(!scheduler.vehicles()[0].is_moving());
        scheduler.advance(0.2);
        assert!(scheduler.vehicles()[0].is_moving());
    }

    #[test]
    fn delayed_start_only_covers_the_rest_of_the_frame() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()));
        let mut late = config(Direction::Forward);
        late.delay = Duration::from_millis(3000);
        scheduler.spawn(late, model());
        scheduler.start();

        scheduler.advance(2.0);
        scheduler.advance(1.5);
        // lancé à 3 s : 0.5 s de trajet sur 10 s, soit 4 unités depuis x = 10
        let x = scheduler.vehicles()[0].transform.position.x;
        assert!((x - 14.0).abs() < 1e-3, "{x}");
    }

    #[test]
    fn wait_counts_from_the_arrival() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()))
            .with_timing(10.0, Duration::from_secs(5));
        scheduler.spawn(config(Direction::Forward), model());
        scheduler.start();

        // arrivée à 10 s au milieu de la frame [9, 11]
        scheduler.advance(9.0);
        scheduler.advance(2.0);
        assert!(!scheduler.vehicles()[0].is_moving());
        scheduler.advance(3.5);
        assert!(!scheduler.vehicles()[0].is_moving());
        // relance à 15 s, 0.5 s avant la fin de la frame
        scheduler.advance(1.0);
        let x = scheduler.vehicles()[0].transform.position.x;
        assert!(scheduler.vehicles()[0].is_moving());
        assert!((x - 14.0).abs() < 1e-3, "{x}");
    }

    #[test]
    fn speed_shortens_the_trip() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()));
        let mut fast = config(Direction::Forward);
        fast.speed = 2.0;
        scheduler.spawn(fast, model());
        scheduler.start();

        scheduler.advance(5.0);
        assert_eq!(scheduler.vehicles()[0].transform.position.x, 90.0);
    }

    #[test]
    fn stop_detaches_everything() {
        let mut scheduler = VehicleScheduler::new(Vec3::new(50.0, 0.0, 50.0), Some(road()));
        scheduler.spawn(config(Direction::Forward), model());
        scheduler.start();
        scheduler.advance(1.0);

        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(scheduler.vehicles().is_empty());
        scheduler.advance(100.0);
        assert!(scheduler.vehicles().is_empty());
    }
}
