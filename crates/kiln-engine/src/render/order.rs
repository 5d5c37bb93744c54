use core::cmp::Ordering;
use std::collections::HashMap;

use super::RenderJob;

/// Coarse draw layer. Lower layers are submitted first (further back).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Layer(pub i32);

impl Layer {
    pub const WORLD: Layer = Layer(0);
    pub const OVERLAY: Layer = Layer(100);

    #[inline]
    pub const fn new(v: i32) -> Self {
        Self(v)
    }
}

/// Depth ordering within a layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum RenderOrder {
    /// Largest depth first. Suits blended geometry.
    #[default]
    BackToFront,
    /// Smallest depth first. Suits opaque geometry with a depth test.
    FrontToBack,
}

/// Per-layer depth ordering; layers without an entry use the default.
#[derive(Debug, Clone, Default)]
pub struct LayerOrders {
    default: RenderOrder,
    by_layer: HashMap<Layer, RenderOrder>,
}

impl LayerOrders {
    pub fn new(default: RenderOrder) -> Self {
        Self { default, by_layer: HashMap::new() }
    }

    pub fn with(mut self, layer: Layer, order: RenderOrder) -> Self {
        self.by_layer.insert(layer, order);
        self
    }

    pub fn set(&mut self, layer: Layer, order: RenderOrder) {
        self.by_layer.insert(layer, order);
    }

    #[inline]
    pub fn get(&self, layer: Layer) -> RenderOrder {
        self.by_layer.get(&layer).copied().unwrap_or(self.default)
    }
}

/// A render job offloaded by a component, with the key it is ordered by.
pub struct RenderItem {
    pub layer: Layer,
    /// Distance from the viewer; compared per the layer's [`RenderOrder`].
    pub depth: f32,
    pub job: RenderJob,
}

impl RenderItem {
    pub fn new(layer: Layer, depth: f32, job: RenderJob) -> Self {
        Self { layer, depth, job }
    }
}

/// Stable sort key for offloaded items.
///
/// Ordering rules:
/// 1) `layer`: ascending
/// 2) `depth`: per the layer's [`RenderOrder`]
/// 3) `order`: ascending (insertion order for equal layer and depth)
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct SortKey {
    pub layer: Layer,
    pub depth: f32,
    pub order: u32,
}

impl SortKey {
    pub(crate) fn compare(&self, other: &Self, orders: &LayerOrders) -> Ordering {
        self.layer
            .cmp(&other.layer)
            .then_with(|| match orders.get(self.layer) {
                RenderOrder::BackToFront => other.depth.total_cmp(&self.depth),
                RenderOrder::FrontToBack => self.depth.total_cmp(&other.depth),
            })
            .then_with(|| self.order.cmp(&other.order))
    }
}

/// Sorts `items` into submission order.
pub(crate) fn sort_items(items: Vec<RenderItem>, orders: &LayerOrders) -> Vec<RenderJob> {
    let mut keyed: Vec<(SortKey, RenderJob)> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let key = SortKey { layer: item.layer, depth: item.depth, order: i as u32 };
            (key, item.job)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.compare(&b.0, orders));
    keyed.into_iter().map(|(_, job)| job).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use crate::render::DynBackend;

    fn item(layer: i32, depth: f32, label: &'static str) -> RenderItem {
        RenderItem::new(Layer(layer), depth, Job::best_effort(label, |_: &mut DynBackend| {}))
    }

    fn labels(jobs: &[RenderJob]) -> Vec<&'static str> {
        jobs.iter().map(|j| j.label()).collect()
    }

    // ── layers ────────────────────────────────────────────────────────────

    #[test]
    fn layers_sort_ascending() {
        let items = vec![item(5, 0.0, "top"), item(-1, 0.0, "bottom"), item(0, 0.0, "mid")];
        let jobs = sort_items(items, &LayerOrders::default());
        assert_eq!(labels(&jobs), ["bottom", "mid", "top"]);
    }

    // ── depth ─────────────────────────────────────────────────────────────

    #[test]
    fn back_to_front_draws_far_first() {
        let items = vec![item(0, 1.0, "near"), item(0, 9.0, "far"), item(0, 4.0, "middle")];
        let jobs = sort_items(items, &LayerOrders::new(RenderOrder::BackToFront));
        assert_eq!(labels(&jobs), ["far", "middle", "near"]);
    }

    #[test]
    fn front_to_back_is_per_layer() {
        let orders = LayerOrders::default().with(Layer(1), RenderOrder::FrontToBack);
        let items = vec![
            item(1, 9.0, "opaque far"),
            item(0, 1.0, "blend near"),
            item(1, 1.0, "opaque near"),
            item(0, 9.0, "blend far"),
        ];
        let jobs = sort_items(items, &orders);
        assert_eq!(labels(&jobs), ["blend far", "blend near", "opaque near", "opaque far"]);
    }

    // ── stability ─────────────────────────────────────────────────────────

    #[test]
    fn ties_keep_insertion_order() {
        let items = vec![item(0, 2.0, "a"), item(0, 2.0, "b"), item(0, 2.0, "c")];
        let jobs = sort_items(items, &LayerOrders::default());
        assert_eq!(labels(&jobs), ["a", "b", "c"]);
    }
}
