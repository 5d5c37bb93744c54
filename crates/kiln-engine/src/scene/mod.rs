//! Scene graph: two transform hierarchies and the components attached to them.
//!
//! 3D entities carry a [`Transform`], 2D entities a [`RectTransform`]. Both are
//! stored in world space and kept consistent eagerly: every setter rewrites the
//! affected descendants before it returns. The scene is owned by the logic thread.

mod component;
mod hierarchy;
mod rect_transform;
mod transform;

pub use component::{AsAnyArc, Component, ComponentStore, OffloadCtx, TransformView};
pub use hierarchy::Hierarchy;
pub use rect_transform::{Anchors, RectTransform};
pub use transform::Transform;

use std::sync::Arc;

use crate::render::FrameBuilder;

slotmap::new_key_type! {
    /// Handle to a 3D entity.
    pub struct EntityId;
    /// Handle to a 2D entity.
    pub struct Entity2DId;
}

/// Either kind of entity; components attach to owners.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Owner {
    Entity(EntityId),
    Entity2D(Entity2DId),
}

impl From<EntityId> for Owner {
    fn from(id: EntityId) -> Self {
        Owner::Entity(id)
    }
}

impl From<Entity2DId> for Owner {
    fn from(id: Entity2DId) -> Self {
        Owner::Entity2D(id)
    }
}

#[derive(Default)]
pub struct Scene {
    entities: Hierarchy<EntityId, Transform>,
    entities_2d: Hierarchy<Entity2DId, RectTransform>,
    components: ComponentStore,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ── entities ──────────────────────────────────────────────────────────

    /// Spawns a 3D entity with a world-space transform, optionally under `parent`.
    pub fn spawn(&mut self, parent: Option<EntityId>, transform: Transform) -> Option<EntityId> {
        self.entities.insert(parent, transform)
    }

    pub fn spawn_2d(&mut self, parent: Option<Entity2DId>, transform: RectTransform) -> Option<Entity2DId> {
        self.entities_2d.insert(parent, transform)
    }

    /// Removes the entity, its descendants and all their components. Returns the
    /// number of entities removed.
    pub fn despawn(&mut self, owner: impl Into<Owner>) -> usize {
        let removed: Vec<Owner> = match owner.into() {
            Owner::Entity(id) => self.entities.remove(id).into_iter().map(Owner::Entity).collect(),
            Owner::Entity2D(id) => self.entities_2d.remove(id).into_iter().map(Owner::Entity2D).collect(),
        };
        for o in &removed {
            self.components.remove_all(*o);
        }
        removed.len()
    }

    pub fn contains(&self, owner: impl Into<Owner>) -> bool {
        match owner.into() {
            Owner::Entity(id) => self.entities.contains(id),
            Owner::Entity2D(id) => self.entities_2d.contains(id),
        }
    }

    pub fn entities(&self) -> &Hierarchy<EntityId, Transform> {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut Hierarchy<EntityId, Transform> {
        &mut self.entities
    }

    pub fn entities_2d(&self) -> &Hierarchy<Entity2DId, RectTransform> {
        &self.entities_2d
    }

    pub fn entities_2d_mut(&mut self) -> &mut Hierarchy<Entity2DId, RectTransform> {
        &mut self.entities_2d
    }

    // ── components ────────────────────────────────────────────────────────

    /// Attaches `value` to a live entity. `None` if the entity is gone or already
    /// has a `T`.
    pub fn add_component<T: Component>(&mut self, owner: impl Into<Owner>, value: T) -> Option<Arc<T>> {
        let owner = owner.into();
        if !self.contains(owner) {
            log::warn!("component added to dead entity {owner:?}");
            return None;
        }
        self.components.add(owner, value)
    }

    pub fn get_component<T: Component>(&self, owner: impl Into<Owner>) -> Option<Arc<T>> {
        self.components.get(owner.into())
    }

    pub fn has_component<T: Component>(&self, owner: impl Into<Owner>) -> bool {
        self.components.has::<T>(owner.into())
    }

    pub fn remove_component<T: Component>(&mut self, owner: impl Into<Owner>) -> bool {
        self.components.remove::<T>(owner.into())
    }

    pub fn components_of(&self, owner: impl Into<Owner>) -> impl Iterator<Item = &Arc<dyn Component>> + '_ {
        self.components.of(owner.into())
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Collects render work from every component, 3D entities first, each tree in
    /// depth-first order.
    pub fn offload(&self, frame: &mut FrameBuilder) {
        for id in self.entities.walk() {
            let Some(t) = self.entities.get(id) else { continue };
            let owner = Owner::Entity(id);
            let ctx = OffloadCtx { owner, transform: TransformView::Spatial(t) };
            self.offload_owner(&ctx, frame);
        }
        for id in self.entities_2d.walk() {
            let Some(t) = self.entities_2d.get(id) else { continue };
            let owner = Owner::Entity2D(id);
            let ctx = OffloadCtx { owner, transform: TransformView::Rect(t) };
            self.offload_owner(&ctx, frame);
        }
    }

    fn offload_owner(&self, ctx: &OffloadCtx<'_>, frame: &mut FrameBuilder) {
        for component in self.components.of(ctx.owner) {
            if let Some(item) = component.offload(ctx) {
                frame.push_item(item);
            }
        }
    }

    /// Clears every dirty flag; called once the frame has been built.
    pub fn clear_dirty(&mut self) {
        self.entities.values_mut().for_each(Transform::clear_dirty);
        self.entities_2d.values_mut().for_each(RectTransform::clear_dirty);
    }
}
