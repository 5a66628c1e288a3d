use id_arena::Id;

use crate::material::MaterialId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// A scene graph node. Nodes with both a model and a material are drawn;
/// nodes without them only group their children.
#[derive(Default)]
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub material_id: Option<MaterialId>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn group(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            ..Default::default()
        }
    }

    pub fn mesh(
        name: impl Into<String>,
        transform: Transform,
        model_id: SceneModelId,
        material_id: MaterialId,
    ) -> Self {
        Self {
            name: name.into(),
            transform,
            model_id: Some(model_id),
            material_id: Some(material_id),
            ..Default::default()
        }
    }

    pub fn is_renderable(&self) -> bool {
        self.model_id.is_some() && self.material_id.is_some()
    }

    #[allow(dead_code)]
    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }

    #[allow(dead_code)]
    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Object3D> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_object(*id))
    }
}
