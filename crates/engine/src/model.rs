//! Graphe de scène d'un modèle GLB, aplati en table.
//!
//! On ne garde que ce dont la logique a besoin : noms, hiérarchie, matrices monde et boîtes
//! englobantes des meshes. Les recherches par nom passent par un index construit une fois
//! au chargement et retournent un `Option` au lieu de parcourir l'arbre.

use std::collections::HashMap;

use crate::{Aabb, Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Matrice locale -> monde
    pub world: Mat4,
    /// Boîte du mesh attaché, en espace local du noeud. `None` pour un simple groupe.
    pub local_bounds: Option<Aabb>,
}

impl SceneNode {
    pub fn is_mesh(&self) -> bool {
        self.local_bounds.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    by_name: HashMap<String, NodeId>,
}

impl ModelAsset {
    /// Décode un conteneur GLB (seul le JSON est lu : hiérarchie, transforms, bornes des accessors).
    pub fn from_glb(bytes: &[u8]) -> Result<Self, gltf::Error> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let mut builder = ModelBuilder::default();

        let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
        if let Some(scene) = scene {
            for node in scene.nodes() {
                builder.push_gltf_node(&node, None);
            }
        }

        Ok(builder.build())
    }

    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Premier noeud portant ce nom, en parcours en profondeur depuis les racines.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent_name(&self, id: NodeId) -> Option<&str> {
        self.node(id)
            .parent
            .map(|parent| self.node(parent).name.as_str())
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        let world = &self.node(id).world;
        Vec3::new(world[(0, 3)], world[(1, 3)], world[(2, 3)])
    }

    /// Le noeud et tous ses descendants, en profondeur d'abord.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            // ordre inverse pour dépiler les enfants dans l'ordre du fichier
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        out
    }

    /// Boîte monde englobant tous les meshes du sous-arbre.
    pub fn subtree_bounds(&self, id: NodeId) -> Option<Aabb> {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| {
                let node = self.node(n);
                node.local_bounds.map(|b| b.transformed(&node.world))
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Boîte monde de tout le modèle.
    pub fn bounds(&self) -> Option<Aabb> {
        self.roots
            .iter()
            .filter_map(|root| self.subtree_bounds(*root))
            .reduce(|a, b| a.union(&b))
    }
}

/// Construction incrémentale d'un `ModelAsset` (import GLB, tests, scènes procédurales).
#[derive(Default)]
pub struct ModelBuilder {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

impl ModelBuilder {
    /// Ajoute un noeud. Sa matrice monde est dérivée de celle du parent.
    pub fn node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        local: Mat4,
        local_bounds: Option<Aabb>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let world = match parent {
            Some(p) => self.nodes[p.0].world * local,
            None => local,
        };
        self.nodes.push(SceneNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            world,
            local_bounds,
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Raccourci : groupe vide translaté.
    pub fn group(&mut self, name: impl Into<String>, parent: Option<NodeId>, at: Vec3) -> NodeId {
        self.node(name, parent, Mat4::new_translation(&at), None)
    }

    /// Raccourci : mesh translaté avec une boîte locale.
    pub fn mesh(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        at: Vec3,
        local_bounds: Aabb,
    ) -> NodeId {
        self.node(name, parent, Mat4::new_translation(&at), Some(local_bounds))
    }

    fn push_gltf_node(&mut self, node: &gltf::Node<'_>, parent: Option<NodeId>) {
        let local = Mat4::from(node.transform().matrix());
        let bounds = node.mesh().and_then(|mesh| {
            mesh.primitives()
                .map(|primitive| {
                    let bb = primitive.bounding_box();
                    Aabb::new(Vec3::from(bb.min), Vec3::from(bb.max))
                })
                .reduce(|a, b| a.union(&b))
        });
        let id = self.node(node.name().unwrap_or_default(), parent, local, bounds);
        for child in node.children() {
            self.push_gltf_node(&child, Some(id));
        }
    }

    pub fn build(self) -> ModelAsset {
        let mut model = ModelAsset {
            nodes: self.nodes,
            roots: self.roots,
            by_name: HashMap::new(),
        };
        let order: Vec<NodeId> = model
            .roots
            .clone()
            .into_iter()
            .flat_map(|root| model.descendants(root))
            .collect();
        for id in order {
            let name = &model.nodes[id.0].name;
            if !name.is_empty() && !model.by_name.contains_key(name) {
                model.by_name.insert(name.clone(), id);
            }
        }
        model
    }
}
