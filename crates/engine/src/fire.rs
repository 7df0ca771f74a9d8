//! Incendies simulés sur les greniers.
//!
//! Boucle auto-replanifiée : chaque tentative planifie d'abord la suivante, puis allume
//! 1 ou 2 feux sur des greniers libres. Un lot de feux s'éteint d'un bloc après une durée
//! aléatoire. La table d'occupation garantit au plus un feu par grenier.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::{FrameClock, Granary, Label, Timeline, Vec3, frame_duration};

/// Animation de texture par planche : la planche contient `FRAMES` images côte à côte.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flipbook {
    phase: f32,
}

impl Flipbook {
    pub const FRAMES: usize = 15;
    /// 0.08 image par frame à 60 Hz
    pub const FRAMES_PER_SECOND: f32 = 4.8;

    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.phase = (self.phase + dt * Self::FRAMES_PER_SECOND).rem_euclid(Self::FRAMES as f32);
    }

    pub fn frame(&self) -> usize {
        (self.phase.floor() as usize).min(Self::FRAMES - 1)
    }

    /// Décalage horizontal de la texture, dans [0, 1).
    pub fn uv_offset(&self) -> f32 {
        self.frame() as f32 / Self::FRAMES as f32
    }

    /// Largeur d'une image de la planche en coordonnées de texture.
    pub fn uv_width(&self) -> f32 {
        1.0 / Self::FRAMES as f32
    }
}

#[derive(Debug, Clone)]
pub struct FireEffect {
    pub id: Uuid,
    pub granary: String,
    pub position: Vec3,
    pub warning: Label,
    pub flipbook: Flipbook,
    batch: u64,
}

impl FireEffect {
    /// Taille du plan de flamme (largeur, hauteur).
    pub const SIZE: (f32, f32) = (20.0, 32.0);
    const SINK: f32 = 4.0;
    const LABEL_HEIGHT: f32 = 40.0;

    fn new(granary: &Granary, batch: u64) -> Self {
        let position = granary.roof_position() - Vec3::new(0.0, Self::SINK, 0.0);
        Self {
            id: Uuid::new_v4(),
            granary: granary.name.clone(),
            position,
            warning: Label {
                text: format!("警告⚠️：粮仓{}失火", granary.name),
                position: position + Vec3::new(0.0, Self::LABEL_HEIGHT, 0.0),
            },
            flipbook: Flipbook::default(),
            batch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FireEvent {
    SpawnAttempt,
    Expire(u64),
}

pub struct FireScheduler {
    granaries: Vec<Granary>,
    running: bool,
    /// grenier -> feu actif
    occupancy: BTreeMap<String, FireEffect>,
    batches: HashMap<u64, Vec<String>>,
    next_batch: u64,
    timeline: Timeline<FireEvent>,
    rng: SmallRng,
}

impl FireScheduler {
    pub const MAX_ACTIVE_FIRES: usize = 2;
    const SPAWN_DELAY_MS: (u64, u64) = (1000, 8000);
    const LIFETIME_MS: (u64, u64) = (8000, 15000);

    pub fn new(granaries: Vec<Granary>) -> Self {
        Self::with_rng(granaries, SmallRng::from_entropy())
    }

    pub fn with_seed(granaries: Vec<Granary>, seed: u64) -> Self {
        Self::with_rng(granaries, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(granaries: Vec<Granary>, rng: SmallRng) -> Self {
        if granaries.is_empty() {
            log::warn!("fire: no granary registered, no fire will ever spawn");
        }
        Self {
            granaries,
            running: false,
            occupancy: BTreeMap::new(),
            batches: HashMap::new(),
            next_batch: 0,
            timeline: Timeline::new(),
            rng,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.schedule_next_attempt();
        log::info!("fire scheduler started");
    }

    /// Éteint tous les feux et annule toutes les minuteries, sans attendre de frame.
    pub fn stop(&mut self) {
        self.running = false;
        self.timeline.clear();
        self.batches.clear();
        if !self.occupancy.is_empty() {
            log::info!("fire: {} fires put out on stop", self.occupancy.len());
        }
        self.occupancy.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Greniers actuellement en feu.
    pub fn occupancy(&self) -> impl Iterator<Item = &str> {
        self.occupancy.keys().map(String::as_str)
    }

    pub fn is_burning(&self, granary: &str) -> bool {
        self.occupancy.contains_key(granary)
    }

    pub fn active_fires(&self) -> impl Iterator<Item = &FireEffect> {
        self.occupancy.values()
    }

    pub fn active_count(&self) -> usize {
        self.occupancy.len()
    }

    pub fn update(&mut self, clock: &mut impl FrameClock) {
        let dt = clock.tick();
        self.advance(dt);
    }

    /// Avance les minuteries puis les planches de chaque feu.
    pub fn advance(&mut self, dt: f32) {
        self.timeline.advance(frame_duration(dt));
        while let Some(event) = self.timeline.pop_due() {
            match event {
                FireEvent::SpawnAttempt => {
                    if self.running {
                        self.schedule_next_attempt();
                        self.spawn_batch();
                    }
                }
                FireEvent::Expire(batch) => self.expire(batch),
            }
        }

        for fire in self.occupancy.values_mut() {
            fire.flipbook.advance(dt);
        }
    }

    fn schedule_next_attempt(&mut self) {
        let (lo, hi) = Self::SPAWN_DELAY_MS;
        let delay = Duration::from_millis(self.rng.gen_range(lo..hi));
        self.timeline.schedule_in(delay, FireEvent::SpawnAttempt);
    }

    fn spawn_batch(&mut self) {
        let mut eligible: Vec<usize> = (0..self.granaries.len())
            .filter(|&i| !self.occupancy.contains_key(&self.granaries[i].name))
            .collect();
        let capacity = Self::MAX_ACTIVE_FIRES.saturating_sub(self.occupancy.len());
        let wanted: usize = self.rng.gen_range(1..=2);
        let count = wanted.min(eligible.len()).min(capacity);
        if count == 0 {
            log::debug!("fire: no free granary, attempt skipped");
            return;
        }

        eligible.shuffle(&mut self.rng);
        let batch = self.next_batch;
        self.next_batch += 1;

        let mut names = Vec::with_capacity(count);
        for &index in &eligible[..count] {
            let fire = FireEffect::new(&self.granaries[index], batch);
            log::info!("fire: granary {} on fire", fire.granary);
            names.push(fire.granary.clone());
            self.occupancy.insert(fire.granary.clone(), fire);
        }
        self.batches.insert(batch, names);

        let (lo, hi) = Self::LIFETIME_MS;
        let lifetime = Duration::from_millis(self.rng.gen_range(lo..hi));
        self.timeline.schedule_in(lifetime, FireEvent::Expire(batch));
    }

    fn expire(&mut self, batch: u64) {
        let Some(names) = self.batches.remove(&batch) else {
            return;
        };
        for name in names {
            if self
                .occupancy
                .get(&name)
                .is_some_and(|fire| fire.batch == batch)
            {
                self.occupancy.remove(&name);
                log::info!("fire: granary {name} put out");
            }
        }
    }
}
