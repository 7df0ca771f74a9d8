//! Inspection d'un grenier au clic : fiche HUD, ancrage de l'annotation, compteur de poids.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::{Timeline, TimerId, Vec3, frame_duration};

/// Fiche d'un grenier, telle qu'affichée dans le HUD.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranaryInfo {
    pub granary_name: String,
    pub temperature: String,
    pub grain: String,
    /// Nom dans la section `beans` du manifeste
    pub grain_img: String,
    pub weight: u64,
    pub granary_height: String,
    pub grain_height: String,
}

/// Table des fiches, indexée par nom d'objet.
#[derive(Debug, Clone, Default)]
pub struct HudTable {
    records: HashMap<String, GranaryInfo>,
}

impl HudTable {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records = serde_json::from_str(json)?;
        Ok(Self { records })
    }

    pub fn get(&self, name: &str) -> Option<&GranaryInfo> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Résultat du picking fourni par l'hôte.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub name: String,
    /// Point d'intersection, si le picking en fournit un
    pub point: Option<Vec3>,
    /// Origine monde de l'objet touché
    pub origin: Vec3,
}

/// Compte de 0 jusqu'à `target` par pas de `target / 50` (au moins 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightCounter {
    value: u64,
    target: u64,
    step: u64,
}

impl WeightCounter {
    pub const PERIOD: Duration = Duration::from_millis(5);
    const DIVISIONS: u64 = 50;

    pub fn new(target: u64) -> Self {
        Self {
            value: 0,
            target,
            step: (target / Self::DIVISIONS).max(1),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn is_done(&self) -> bool {
        self.value >= self.target
    }

    pub fn tick(&mut self) {
        self.value = self.value.saturating_add(self.step).min(self.target);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    pub info: GranaryInfo,
    /// Position monde de l'annotation
    pub anchor: Vec3,
    pub weight: WeightCounter,
}

pub struct Inspector {
    table: HudTable,
    hud: Option<HudState>,
    timeline: Timeline<()>,
    counting: Option<TimerId>,
}

impl Inspector {
    const LABEL_LIFT: f32 = 20.0;

    pub fn new(table: HudTable) -> Self {
        Self {
            table,
            hud: None,
            timeline: Timeline::new(),
            counting: None,
        }
    }

    pub fn hud(&self) -> Option<&HudState> {
        self.hud.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.hud.is_some()
    }

    pub fn hide(&mut self) {
        self.hud = None;
        if let Some(id) = self.counting.take() {
            self.timeline.cancel(id);
        }
    }

    /// Affiche la fiche du grenier touché, ou masque le HUD.
    pub fn on_click(&mut self, hit: Option<Hit>) -> bool {
        self.hide();
        let Some(hit) = hit else {
            return false;
        };
        let Some(info) = self.table.get(&hit.name) else {
            log::debug!("inspection: no HUD record for {:?}", hit.name);
            return false;
        };

        let anchor = hit.point.unwrap_or(hit.origin) + Vec3::new(0.0, Self::LABEL_LIFT, 0.0);
        let weight = WeightCounter::new(info.weight);
        self.hud = Some(HudState {
            info: info.clone(),
            anchor,
            weight,
        });
        if !weight.is_done() {
            self.counting = Some(self.timeline.schedule_in(WeightCounter::PERIOD, ()));
        }
        true
    }

    pub fn advance(&mut self, dt: f32) {
        self.timeline.advance(frame_duration(dt));
        while self.timeline.pop_due().is_some() {
            self.counting = None;
            let Some(hud) = self.hud.as_mut() else {
                continue;
            };
            hud.weight.tick();
            if !hud.weight.is_done() {
                self.counting = Some(self.timeline.schedule_in(WeightCounter::PERIOD, ()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "P1": {
            "granaryName": "P1",
            "temperature": "22℃",
            "grain": "小麦",
            "grainImg": "yellow",
            "weight": 1000,
            "granaryHeight": "8m",
            "grainHeight": "6m"
        },
        "L1": {
            "granaryName": "L1",
            "temperature": "18℃",
            "grain": "大豆",
            "grainImg": "black",
            "weight": 30,
            "granaryHeight": "36m",
            "grainHeight": "30m"
        }
    }"#;

    fn hit(name: &str, point: Option<Vec3>) -> Option<Hit> {
        Some(Hit {
            name: name.to_string(),
            point,
            origin: Vec3::new(1.0, 2.0, 3.0),
        })
    }

    #[test]
    fn table_parses_camel_case_fields() {
        let table = HudTable::from_json(TABLE).unwrap();
        assert_eq!(table.len(), 2);
        let p1 = table.get("P1").unwrap();
        assert_eq!(p1.grain_img, "yellow");
        assert_eq!(p1.weight, 1000);
    }

    #[test]
    fn counter_steps_by_a_fiftieth() {
        let mut counter = WeightCounter::new(1000);
        counter.tick();
        assert_eq!(counter.value(), 20);
        for _ in 0..49 {
            counter.tick();
        }
        assert_eq!(counter.value(), 1000);
        assert!(counter.is_done());
    }

    #[test]
    fn small_targets_count_one_by_one_and_clamp() {
        let mut counter = WeightCounter::new(30);
        counter.tick();
        assert_eq!(counter.value(), 1);

        let mut odd = WeightCounter::new(1010);
        for _ in 0..51 {
            odd.tick();
        }
        assert_eq!(odd.value(), 1010);
    }

    #[test]
    fn huge_target_clamps_without_overflow() {
        let mut counter = WeightCounter::new(u64::MAX);
        for _ in 0..51 {
            counter.tick();
        }
        assert_eq!(counter.value(), u64::MAX);
        assert!(counter.is_done());
    }

    #[test]
    fn click_places_annotation_above_intersection() {
        let mut inspector = Inspector::new(HudTable::from_json(TABLE).unwrap());
        assert!(inspector.on_click(hit("P1", Some(Vec3::new(10.0, 5.0, 0.0)))));
        let hud = inspector.hud().unwrap();
        assert_eq!(hud.anchor, Vec3::new(10.0, 25.0, 0.0));
        assert_eq!(hud.info.grain, "小麦");
        assert_eq!(hud.weight.value(), 0);

        inspector.on_click(hit("P1", None));
        assert_eq!(inspector.hud().unwrap().anchor, Vec3::new(1.0, 22.0, 3.0));
    }

    #[test]
    fn weight_reaches_target_every_five_milliseconds() {
        let mut inspector = Inspector::new(HudTable::from_json(TABLE).unwrap());
        inspector.on_click(hit("P1", None));

        inspector.advance(0.016);
        assert_eq!(inspector.hud().unwrap().weight.value(), 60);

        inspector.advance(1.0);
        assert_eq!(inspector.hud().unwrap().weight.value(), 1000);
        assert!(inspector.timeline.is_empty());
    }

    #[test]
    fn missing_hit_or_record_hides_the_hud() {
        let mut inspector = Inspector::new(HudTable::from_json(TABLE).unwrap());
        inspector.on_click(hit("P1", None));
        assert!(inspector.is_visible());

        assert!(!inspector.on_click(None));
        assert!(!inspector.is_visible());

        inspector.on_click(hit("P1", None));
        assert!(!inspector.on_click(hit("平原", None)));
        assert!(inspector.hud().is_none());
    }

    #[test]
    fn new_click_restarts_the_counter() {
        let mut inspector = Inspector::new(HudTable::from_json(TABLE).unwrap());
        inspector.on_click(hit("P1", None));
        inspector.advance(0.1);
        inspector.on_click(hit("L1", None));
        assert_eq!(inspector.hud().unwrap().weight.value(), 0);

        inspector.advance(0.0051);
        assert_eq!(inspector.hud().unwrap().weight.value(), 1);
        assert_eq!(inspector.timeline.len(), 1);
    }
}
