use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use super::{Owner, RectTransform, Transform};
use crate::render::RenderItem;

/// Upcast helper so stored components can be downcast back to their concrete type.
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The transform of the entity a component is attached to, as seen at offload time.
#[derive(Debug, Copy, Clone)]
pub enum TransformView<'a> {
    Spatial(&'a Transform),
    Rect(&'a RectTransform),
}

/// Context handed to [`Component::offload`] while the frame is being built.
#[derive(Debug, Copy, Clone)]
pub struct OffloadCtx<'a> {
    pub owner: Owner,
    pub transform: TransformView<'a>,
}

/// Data or behaviour attached to an entity.
///
/// At most one component of each concrete type may be attached to an entity.
/// Components are shared (`Arc`), so anything that needs per-frame mutation keeps
/// its own interior mutability.
///
/// A component does not store a pointer back into the scene. Its owner is handed
/// over once in [`on_attach`](Self::on_attach), before the component becomes
/// reachable, and every [`offload`](Self::offload) receives the owner again along
/// with a borrow of the owner's current transform.
pub trait Component: AsAnyArc + Send + Sync + 'static {
    /// Called once, right after the component is attached to `owner` and before
    /// anything else can look it up.
    fn on_attach(&self, _owner: Owner) {}

    /// Produces this frame's render work, if any.
    fn offload(&self, _ctx: &OffloadCtx<'_>) -> Option<RenderItem> {
        None
    }
}

/// Components keyed by owner and concrete type.
#[derive(Default)]
pub struct ComponentStore {
    slots: HashMap<(Owner, TypeId), Arc<dyn Component>>,
    /// Attach order per owner, used for iteration.
    order: HashMap<Owner, Vec<TypeId>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `value` to `owner`.
    ///
    /// Returns `None` (and drops `value`) if `owner` already has a `T`; the existing
    /// instance and its reference count are left untouched.
    pub fn add<T: Component>(&mut self, owner: Owner, value: T) -> Option<Arc<T>> {
        let key = (owner, TypeId::of::<T>());
        if self.slots.contains_key(&key) {
            log::warn!("{} already attached to {owner:?}; keeping the existing one", type_name::<T>());
            return None;
        }

        let value = Arc::new(value);
        value.on_attach(owner);
        self.slots.insert(key, value.clone());
        self.order.entry(owner).or_default().push(key.1);
        Some(value)
    }

    pub fn get<T: Component>(&self, owner: Owner) -> Option<Arc<T>> {
        let slot = self.slots.get(&(owner, TypeId::of::<T>()))?;
        slot.clone().into_any_arc().downcast::<T>().ok()
    }

    pub fn has<T: Component>(&self, owner: Owner) -> bool {
        self.slots.contains_key(&(owner, TypeId::of::<T>()))
    }

    /// Detaches `owner`'s `T`.
    ///
    /// Refused while anything outside the store still holds the component; returns
    /// `true` if it was removed.
    pub fn remove<T: Component>(&mut self, owner: Owner) -> bool {
        let key = (owner, TypeId::of::<T>());
        let Some(slot) = self.slots.get(&key) else {
            return false;
        };

        let holders = Arc::strong_count(slot) - 1;
        if holders > 0 {
            log::warn!(
                "{} on {owner:?} is still referenced by {holders} holder(s); not removed",
                type_name::<T>()
            );
            return false;
        }

        self.slots.remove(&key);
        if let Some(types) = self.order.get_mut(&owner) {
            types.retain(|t| *t != key.1);
            if types.is_empty() {
                self.order.remove(&owner);
            }
        }
        true
    }

    /// Detaches everything from `owner`. Components still held elsewhere live on
    /// until their last holder drops them.
    pub(crate) fn remove_all(&mut self, owner: Owner) -> usize {
        let Some(types) = self.order.remove(&owner) else {
            return 0;
        };
        for t in &types {
            self.slots.remove(&(owner, *t));
        }
        types.len()
    }

    /// Components on `owner` in attach order.
    pub fn of(&self, owner: Owner) -> impl Iterator<Item = &Arc<dyn Component>> + '_ {
        self.order
            .get(&owner)
            .into_iter()
            .flatten()
            .filter_map(move |t| self.slots.get(&(owner, *t)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use slotmap::SlotMap;

    use super::*;
    use crate::scene::EntityId;

    #[derive(Debug, Default)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, Default)]
    struct Tag {
        attached: AtomicUsize,
    }
    impl Component for Tag {
        fn on_attach(&self, _owner: Owner) {
            self.attached.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn owner() -> Owner {
        let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
        Owner::Entity(ids.insert(()))
    }

    // ── uniqueness ────────────────────────────────────────────────────────

    #[test]
    fn second_add_of_same_type_fails_and_keeps_refcount() {
        let mut store = ComponentStore::new();
        let e = owner();

        let first = store.add(e, Health(10)).unwrap();
        assert_eq!(Arc::strong_count(&first), 2);

        assert!(store.add(e, Health(99)).is_none());
        assert_eq!(Arc::strong_count(&first), 2);
        assert_eq!(store.get::<Health>(e).unwrap().0, 10);
    }

    #[test]
    fn different_types_coexist_in_attach_order() {
        let mut store = ComponentStore::new();
        let e = owner();
        store.add(e, Tag::default());
        store.add(e, Health(1));

        assert!(store.has::<Tag>(e));
        assert!(store.has::<Health>(e));
        assert_eq!(store.of(e).count(), 2);
        assert_eq!(store.get::<Tag>(e).unwrap().attached.load(Ordering::Relaxed), 1);
    }

    // ── removal ───────────────────────────────────────────────────────────

    #[test]
    fn remove_is_refused_while_shared() {
        let mut store = ComponentStore::new();
        let e = owner();
        let held = store.add(e, Health(3)).unwrap();

        assert!(!store.remove::<Health>(e));
        assert!(store.has::<Health>(e));

        drop(held);
        assert!(store.remove::<Health>(e));
        assert!(!store.has::<Health>(e));
        assert_eq!(store.of(e).count(), 0);
    }

    #[test]
    fn remove_all_defers_destruction_to_last_holder() {
        let mut store = ComponentStore::new();
        let e = owner();
        let held = store.add(e, Health(5)).unwrap();
        store.add(e, Tag::default());

        assert_eq!(store.remove_all(e), 2);
        assert!(store.is_empty());
        assert_eq!(Arc::strong_count(&held), 1);
        assert_eq!(held.0, 5);
    }
}
