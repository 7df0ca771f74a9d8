use std::time::{Duration, Instant};

/// Source du temps écoulé entre deux frames.
/// `DeltaTimer` lit l'horloge murale ; `FixedStep` sert aux tests et aux replays.
pub trait FrameClock {
    /// Temps écoulé (secondes) depuis l'appel précédent.
    fn tick(&mut self) -> f32;
}

pub struct DeltaTimer {
    last_frame_time: Instant,
    delta_time: f32,
    frame_count: u64,
    fps_timer: Instant,
    fps: f32,
}

impl Default for DeltaTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaTimer {
    /// Delta maximal retourné : au-delà (fenêtre déplacée, breakpoint...) on ralentit le temps de jeu
    /// plutôt que de faire sauter les animations.
    pub const MAX_DELTA: f32 = 1.0 / 15.0;

    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame_time: now,
            delta_time: 0.0,
            frame_count: 0,
            fps_timer: now,
            fps: 0.0,
        }
    }

    pub fn update(&mut self) -> f32 {
        let current_time = Instant::now();
        let duration = current_time.duration_since(self.last_frame_time);

        self.delta_time = duration.as_secs_f32().min(Self::MAX_DELTA);

        self.last_frame_time = current_time;
        self.frame_count += 1;

        if current_time.duration_since(self.fps_timer) >= Duration::from_secs(1) {
            self.fps = self.frame_count as f32;
            self.frame_count = 0;
            self.fps_timer = current_time;
        }

        self.delta_time
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl FrameClock for DeltaTimer {
    fn tick(&mut self) -> f32 {
        self.update()
    }
}

/// Horloge à pas fixe : chaque tick avance exactement de `step` secondes.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep(pub f32);

impl FrameClock for FixedStep {
    fn tick(&mut self) -> f32 {
        self.0
    }
}
