use std::time::Duration;

use rand::Rng;

/// Progression d'une session de chargement.
///
/// La valeur affichée mélange la progression réelle (`loaded / total`) et une progression
/// simulée plafonnée à 25 %, qui masque le premier aller-retour réseau pendant lequel aucune
/// resource n'est encore terminée. Les deux composantes ne font que croître, donc la valeur
/// affichée est monotone.
#[derive(Debug, Clone)]
pub struct LoadProgress {
    loaded: usize,
    total: usize,
    simulated: f32,
}

impl LoadProgress {
    pub const SIMULATED_CAP: f32 = 25.0;
    const TICK_MIN_MS: u64 = 300;
    const TICK_MAX_MS: u64 = 600;

    pub fn new(total: usize) -> Self {
        Self {
            loaded: 0,
            total,
            simulated: 0.0,
        }
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn simulated(&self) -> f32 {
        self.simulated
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }

    pub fn real(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        self.loaded as f32 / self.total as f32 * 100.0
    }

    /// Pourcentage à afficher, dans [0, 100].
    pub fn display(&self) -> f32 {
        self.real().max(self.simulated).min(100.0)
    }

    /// Une resource a fini (succès ou échec).
    pub fn record_completion(&mut self) -> f32 {
        self.loaded = (self.loaded + 1).min(self.total);
        self.display()
    }

    /// La simulation s'arrête au plafond ou quand tout est chargé.
    pub fn simulation_active(&self) -> bool {
        self.simulated < Self::SIMULATED_CAP && !self.is_complete()
    }

    /// Un pas de simulation : +[0.5, 1.5] %, plafonné.
    pub fn advance_simulation(&mut self, rng: &mut impl Rng) -> f32 {
        if self.simulated < Self::SIMULATED_CAP {
            self.simulated = (self.simulated + rng.gen_range(0.5..=1.5)).min(Self::SIMULATED_CAP);
        }
        self.display()
    }

    /// Délai avant le prochain pas de simulation, tiré dans [300, 600) ms.
    pub fn next_tick_delay(rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.gen_range(Self::TICK_MIN_MS..Self::TICK_MAX_MS))
    }
}
