//! Registre typé de la scène principale, construit une seule fois à l'assemblage.
//!
//! Les objets utiles (sol, route, groupe des greniers, greniers) sont résolus par nom dans le
//! modèle GLB puis rangés dans une table. Un objet absent est journalisé et donne `None`
//! au lieu d'interrompre l'assemblage.

use std::collections::HashMap;

use crate::{Aabb, ModelAsset, NodeId, Vec3};

/// Noms des objets dans `model.glb`.
pub mod names {
    pub const GROUND: &str = "平原";
    pub const ROAD: &str = "马路";
    pub const GRANARY_GROUP: &str = "粮仓";
    pub const VERTICAL_SILO: &str = "立筒仓";
    pub const SHALLOW_SILO: &str = "浅圆仓";
    pub const FLAT_WAREHOUSE: &str = "平房仓";
}

/// Type de bâtiment, déduit du nom du groupe parent du grenier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    VerticalSilo,
    ShallowSilo,
    FlatWarehouse,
    Unknown,
}

impl StructureKind {
    const ROOF_OFFSETS: &[(StructureKind, f32)] = &[
        (StructureKind::VerticalSilo, 36.0),
        (StructureKind::ShallowSilo, 20.0),
        (StructureKind::FlatWarehouse, 17.0),
    ];

    pub fn from_group_name(name: &str) -> Self {
        match name {
            names::VERTICAL_SILO => StructureKind::VerticalSilo,
            names::SHALLOW_SILO => StructureKind::ShallowSilo,
            names::FLAT_WAREHOUSE => StructureKind::FlatWarehouse,
            _ => StructureKind::Unknown,
        }
    }

    /// Hauteur du toit au-dessus de l'origine du mesh (0 pour un type inconnu).
    pub fn roof_offset(self) -> f32 {
        Self::ROOF_OFFSETS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, offset)| *offset)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Granary {
    pub name: String,
    pub kind: StructureKind,
    /// Origine monde du mesh
    pub position: Vec3,
    /// Empreinte monde, si le mesh a des bornes
    pub footprint: Option<Aabb>,
}

impl Granary {
    /// Point d'ancrage de l'étiquette de nom (sommet du bâtiment).
    pub fn roof_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.kind.roof_offset(), 0.0)
    }
}

/// Étiquette flottante en espace monde.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Road {
    /// Origine monde de l'objet route
    pub anchor: Vec3,
    pub bounds: Option<Aabb>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneRegistry {
    ground: Option<NodeId>,
    road: Option<Road>,
    granaries: Vec<Granary>,
    by_name: HashMap<String, usize>,
    bounds: Option<Aabb>,
}

impl SceneRegistry {
    pub fn from_model(model: &ModelAsset) -> Self {
        let ground = model.find(names::GROUND);
        if ground.is_none() {
            log::warn!("scene: ground object {:?} not found", names::GROUND);
        }

        let road = model.find(names::ROAD).map(|id| Road {
            anchor: model.world_position(id),
            bounds: model.subtree_bounds(id),
        });
        if road.is_none() {
            log::warn!(
                "scene: road object {:?} not found, vehicles keep their default path",
                names::ROAD
            );
        }

        let mut registry = SceneRegistry {
            ground,
            road,
            bounds: model.bounds(),
            ..Default::default()
        };

        let Some(group) = model.find(names::GRANARY_GROUP) else {
            log::warn!(
                "scene: granary group {:?} not found, no granaries registered",
                names::GRANARY_GROUP
            );
            return registry;
        };

        for id in model.descendants(group) {
            let node = model.node(id);
            if !node.is_mesh() {
                continue;
            }
            let kind = model
                .parent_name(id)
                .map(StructureKind::from_group_name)
                .unwrap_or(StructureKind::Unknown);
            if kind == StructureKind::Unknown {
                log::debug!("scene: granary {:?} has an unknown structure type", node.name);
            }
            registry.insert_granary(Granary {
                name: node.name.clone(),
                kind,
                position: model.world_position(id),
                footprint: model.subtree_bounds(id),
            });
        }

        log::info!("scene: {} granaries registered", registry.granaries.len());
        registry
    }

    /// Registre construit à la main (tests, scènes procédurales).
    pub fn from_parts(road: Option<Road>, granaries: Vec<Granary>) -> Self {
        let mut registry = SceneRegistry {
            road,
            ..Default::default()
        };
        for granary in granaries {
            registry.insert_granary(granary);
        }
        registry
    }

    fn insert_granary(&mut self, granary: Granary) {
        if self.by_name.contains_key(&granary.name) {
            log::warn!("scene: duplicate granary name {:?} ignored", granary.name);
            return;
        }
        self.by_name.insert(granary.name.clone(), self.granaries.len());
        self.granaries.push(granary);
    }

    pub fn ground(&self) -> Option<NodeId> {
        self.ground
    }

    pub fn road(&self) -> Option<&Road> {
        self.road.as_ref()
    }

    pub fn granaries(&self) -> &[Granary] {
        &self.granaries
    }

    pub fn granary(&self, name: &str) -> Option<&Granary> {
        self.by_name.get(name).map(|&i| &self.granaries[i])
    }

    /// Boîte de tout le modèle (cadrage de la caméra).
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Étiquettes de nom au sommet de chaque grenier.
    pub fn granary_labels(&self) -> Vec<Label> {
        self.granaries
            .iter()
            .map(|g| Label {
                text: g.name.clone(),
                position: g.roof_position(),
            })
            .collect()
    }

    /// Sélection vue de dessus : grenier dont l'empreinte contient (x, z). Les greniers
    /// sans empreinte se sélectionnent par distance au centre, dans `radius`.
    pub fn pick(&self, x: f32, z: f32, radius: f32) -> Option<&Granary> {
        if let Some(hit) = self
            .granaries
            .iter()
            .find(|g| g.footprint.is_some_and(|f| f.contains_xz(x, z)))
        {
            return Some(hit);
        }
        self.granaries
            .iter()
            .filter(|g| g.footprint.is_none())
            .map(|g| {
                let dx = g.position.x - x;
                let dz = g.position.z - z;
                (g, dx * dx + dz * dz)
            })
            .filter(|(_, d2)| *d2 <= radius * radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(g, _)| g)
    }
}
