use crate::{Interpolate, Vec3};

/// Piste de positions à interpolation linéaire (temps en secondes, croissants).
#[derive(Debug, Clone)]
pub struct PositionTrack {
    times: Vec<f32>,
    values: Vec<Vec3>,
}

impl PositionTrack {
    /// `keys` doit être trié par temps ; une piste vide est refusée.
    pub fn new(keys: impl IntoIterator<Item = (f32, Vec3)>) -> Option<Self> {
        let (times, values): (Vec<f32>, Vec<Vec3>) = keys.into_iter().unzip();
        if times.is_empty() || times.windows(2).any(|w| w[1] < w[0]) {
            return None;
        }
        Some(Self { times, values })
    }

    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Position au temps `t`, bloquée sur la première / dernière clé hors de la plage.
    pub fn sample(&self, t: f32) -> Vec3 {
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return self.values[0];
        }
        if t >= self.times[last] {
            return self.values[last];
        }
        let next = self.times.partition_point(|&k| k <= t);
        let (t0, t1) = (self.times[next - 1], self.times[next]);
        let span = t1 - t0;
        if span <= 0.0 {
            return self.values[next];
        }
        self.values[next - 1].lerp(&self.values[next], (t - t0) / span)
    }
}

/// Lecture unique d'une piste, figée sur la dernière clé une fois terminée
/// (équivalent d'un `LoopOnce` + `clampWhenFinished`).
#[derive(Debug, Clone)]
pub struct AnimationAction {
    track: PositionTrack,
    time: f32,
    playing: bool,
    finished: bool,
}

impl AnimationAction {
    pub fn new(track: PositionTrack) -> Self {
        Self {
            track,
            time: 0.0,
            playing: false,
            finished: false,
        }
    }

    pub fn play(&mut self) {
        self.time = 0.0;
        self.playing = true;
        self.finished = false;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.track.duration()
    }

    /// Avance la lecture. Retourne `true` uniquement sur la frame où l'action se termine.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.playing {
            return false;
        }
        self.time = (self.time + dt).min(self.track.duration());
        if self.time >= self.track.duration() {
            self.playing = false;
            self.finished = true;
            return true;
        }
        false
    }

    pub fn position(&self) -> Vec3 {
        self.track.sample(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> PositionTrack {
        PositionTrack::new([
            (0.0, Vec3::new(10.0, 0.0, 0.0)),
            (5.0, Vec3::new(50.0, 0.0, 0.0)),
            (10.0, Vec3::new(90.0, 0.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn sample_interpolates_and_clamps() {
        let track = track();
        assert_eq!(track.sample(-1.0).x, 10.0);
        assert_eq!(track.sample(2.5).x, 30.0);
        assert_eq!(track.sample(5.0).x, 50.0);
        assert_eq!(track.sample(7.5).x, 70.0);
        assert_eq!(track.sample(99.0).x, 90.0);
    }

    #[test]
    fn unsorted_or_empty_tracks_are_rejected() {
        assert!(PositionTrack::new(Vec::new()).is_none());
        assert!(PositionTrack::new([(1.0, Vec3::zeros()), (0.5, Vec3::zeros())]).is_none());
    }

    #[test]
    fn action_finishes_once_and_clamps() {
        let mut action = AnimationAction::new(track());
        assert!(!action.update(1.0));
        action.play();
        assert!(!action.update(6.0));
        assert!(action.update(6.0));
        assert!(action.is_finished());
        assert_eq!(action.position().x, 90.0);
        assert!(!action.update(1.0));
    }
}
