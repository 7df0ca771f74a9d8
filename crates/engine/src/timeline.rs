//! File de minuteries en temps de jeu.
//!
//! Remplace les `setTimeout` auto-replanifiés : chaque système possède sa propre `Timeline`,
//! l'avance avec le delta de la frame, puis dépile les événements échus un par un.
//! Pendant le traitement d'un événement, `now()` vaut exactement son échéance, donc une
//! replanification depuis le handler ne dérive pas avec la cadence des frames.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub struct Timeline<E> {
    now: Duration,
    horizon: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), E>,
    due_by_id: HashMap<u64, Duration>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            horizon: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }

    /// Temps de jeu courant.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Temps de jeu atteint par le dernier `advance`.
    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Planifie `event` dans `delay` à partir de `now()`.
    /// À échéance égale, l'ordre d'insertion est conservé.
    pub fn schedule_in(&mut self, delay: Duration, event: E) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let due = self.now + delay;
        self.queue.insert((due, id), event);
        self.due_by_id.insert(id, due);
        TimerId(id)
    }

    /// Annule une minuterie encore en attente. Retourne l'événement s'il n'avait pas été dépilé.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let due = self.due_by_id.remove(&id.0)?;
        self.queue.remove(&(due, id.0))
    }

    /// Temps restant avant l'échéance d'une minuterie en attente.
    pub fn remaining(&self, id: TimerId) -> Option<Duration> {
        self.due_by_id
            .get(&id.0)
            .map(|due| due.saturating_sub(self.now))
    }

    /// Vide toutes les minuteries en attente (le temps courant est conservé).
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Avance l'horizon de `dt` ; les événements sont ensuite récupérés via `pop_due`.
    pub fn advance(&mut self, dt: Duration) {
        self.horizon += dt;
    }

    /// Dépile le prochain événement échu avant l'horizon.
    /// Quand il n'y en a plus, `now()` rejoint l'horizon et `None` est retourné.
    pub fn pop_due(&mut self) -> Option<E> {
        let due = match self.queue.first_key_value() {
            Some((&(due, _), _)) if due <= self.horizon => due,
            _ => {
                self.now = self.horizon;
                return None;
            }
        };
        let ((_, id), event) = self.queue.pop_first()?;
        self.due_by_id.remove(&id);
        self.now = self.now.max(due);
        Some(event)
    }
}

/// Convertit un delta de frame (secondes) en `Duration`, en ignorant les valeurs négatives ou NaN.
pub fn frame_duration(dt: f32) -> Duration {
    if dt.is_finite() && dt > 0.0 {
        Duration::from_secs_f32(dt)
    } else {
        Duration::ZERO
    }
}
