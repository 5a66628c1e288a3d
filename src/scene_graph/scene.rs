use glam::{Mat4, Quat};
use id_arena::{Arena, Id};
use image::RgbaImage;

use crate::material::{MaterialId, PhysicalMaterial};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

/// CPU image whose bytes are sampled as stored, without sRGB decoding.
pub struct SceneTexture {
    pub name: String,
    pub image: RgbaImage,
}

pub type TextureId = Id<SceneTexture>;

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    pub materials: Arena<PhysicalMaterial>,
    pub textures: Arena<SceneTexture>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            materials: Arena::new(),
            textures: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    /// Adds `object` as a child of `parent`.
    pub fn add_child(&mut self, parent: ObjectId, object: Object3D) -> ObjectId {
        let id = self.add_object(object);
        self.set_object_parent(id, Some(parent));
        id
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    #[allow(dead_code)]
    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    pub fn add_material(&mut self, material: PhysicalMaterial) -> MaterialId {
        self.materials.alloc(material)
    }

    pub fn add_texture(&mut self, name: impl Into<String>, image: RgbaImage) -> TextureId {
        self.textures.alloc(SceneTexture {
            name: name.into(),
            image,
        })
    }

    pub fn get_material(&self, id: MaterialId) -> Option<&PhysicalMaterial> {
        self.materials.get(id)
    }

    /// Objects that have both a model and a material, in insertion order.
    pub fn renderables(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects
            .iter()
            .filter(|(_, object)| object.is_renderable())
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|c| c.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
                new_parent.child_ids.push(child_id);
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_rotation(&mut self, object_id: ObjectId, rotation: Quat) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_rotation(rotation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    #[allow(dead_code)]
    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    /// Clears change flags; transforms touched after this report `has_changed`.
    pub fn early_update(&mut self) {
        for (_, object) in self.objects.iter() {
            object.transform.reset_flags();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn children_inherit_parent_transform() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::group(
            "Parent",
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        ));
        let child = scene.add_child(
            parent,
            Object3D::group("Child", Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
        );

        scene.late_update();

        let world = *scene.get_object_transform(child).unwrap().get_world_matrix();
        assert!(world
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        assert_eq!(scene.get_object(child).unwrap().parent(&scene).unwrap().name, "Parent");
        assert_eq!(scene.get_object(parent).unwrap().children(&scene).count(), 1);
    }

    #[test]
    fn rotating_parent_moves_children() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::group("Parent", Transform::default()));
        let child = scene.add_child(
            parent,
            Object3D::group("Child", Transform::from_translation(Vec3::X)),
        );
        scene.late_update();

        scene.set_object_rotation(parent, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        scene.late_update();

        let position = scene
            .get_object_transform(child)
            .unwrap()
            .get_world_matrix()
            .transform_point3(Vec3::ZERO);
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6), "{:?}", position);
    }

    #[test]
    fn only_moved_subtrees_report_changes() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::group("Parent", Transform::default()));
        let child = scene.add_child(
            parent,
            Object3D::group("Child", Transform::from_translation(Vec3::X)),
        );
        let still = scene.add_object(Object3D::group("Still", Transform::default()));
        scene.late_update();

        scene.early_update();
        scene.late_update();
        for id in [parent, child, still] {
            assert!(!scene.get_object_transform(id).unwrap().has_changed());
        }

        scene.early_update();
        scene.set_object_rotation(parent, Quat::from_rotation_y(0.1));
        scene.late_update();
        assert!(scene.get_object_transform(parent).unwrap().has_changed());
        assert!(scene.get_object_transform(child).unwrap().has_changed());
        assert!(!scene.get_object_transform(still).unwrap().has_changed());
    }

    #[test]
    fn reparenting_updates_child_lists() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::group("A", Transform::default()));
        let b = scene.add_object(Object3D::group("B", Transform::default()));
        let child = scene.add_child(a, Object3D::group("Child", Transform::default()));

        scene.set_object_parent(child, Some(b));

        assert!(scene.get_object(a).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_object(b).unwrap().child_ids, vec![child]);
        assert_eq!(scene.get_object_by_name("Child"), Some(child));
    }
}
