use slotmap::Key;

use super::Hierarchy;
use crate::coords::{Rect, Vec2};

/// Per-edge fractions of a parent's rect delta applied to a child's rect.
///
/// When a parent's rect changes by `Δ`, the child's left edge moves by
/// `Δ.left * anchors.left`, its right edge by `Δ.right * anchors.right`, and so on.
/// All zeros (the default) pins the child regardless of the parent.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Anchors {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Anchors {
    pub const NONE: Anchors = Anchors::new(0.0, 0.0, 0.0, 0.0);
    /// Follows every parent edge one to one.
    pub const STRETCH: Anchors = Anchors::new(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }

    #[inline]
    fn as_factors(self) -> Rect {
        Rect::new(self.top, self.right, self.bottom, self.left)
    }
}

/// 2D transform of a UI-style entity: a layout rect plus a free position,
/// rotation (radians) and scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RectTransform {
    rect: Rect,
    anchors: Anchors,
    position_anchor: Option<Vec2>,
    position: Vec2,
    rotation: f32,
    scale: Vec2,
    dirty: bool,
}

impl RectTransform {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            anchors: Anchors::NONE,
            position_anchor: None,
            position: rect.origin(),
            rotation: 0.0,
            scale: Vec2::splat(1.0),
            dirty: true,
        }
    }

    pub fn with_anchors(mut self, anchors: Anchors) -> Self {
        self.anchors = anchors;
        self
    }

    /// `anchor` is a point inside the parent rect in unit coordinates: `(0, 0)` is
    /// the top-left corner and `(1, 1)` the bottom-right.
    pub fn with_position_anchor(mut self, anchor: Vec2) -> Self {
        self.position_anchor = Some(anchor);
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn anchors(&self) -> Anchors {
        self.anchors
    }

    #[inline]
    pub fn position_anchor(&self) -> Option<Vec2> {
        self.position_anchor
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Takes the parent's rect delta; returns this node's own rect delta and the
    /// position shift its subtree inherits.
    fn follow_parent(&mut self, parent_delta: Rect, inherited_shift: Vec2) -> (Rect, Vec2) {
        let own_delta = parent_delta.scale_edges(self.anchors.as_factors());
        self.rect = self.rect + own_delta;

        let mut shift = inherited_shift;
        if let Some(pa) = self.position_anchor {
            shift += Vec2::new(
                lerp(parent_delta.left, parent_delta.right, pa.x),
                lerp(parent_delta.top, parent_delta.bottom, pa.y),
            );
        }
        self.position += shift;
        self.dirty = true;
        (own_delta, shift)
    }
}

impl Default for RectTransform {
    fn default() -> Self {
        Self::new(Rect::zero())
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn div_or(a: Vec2, b: Vec2, fallback: Vec2) -> Vec2 {
    Vec2::new(
        if b.x == 0.0 { fallback.x } else { a.x / b.x },
        if b.y == 0.0 { fallback.y } else { a.y / b.y },
    )
}

impl<K: Key> Hierarchy<K, RectTransform> {
    /// Replaces the rect of `id` and redistributes the change down the tree.
    ///
    /// Each child's rect moves by the parent's delta scaled per edge by the child's
    /// [`Anchors`]; the child's own resulting delta then flows on to its children.
    /// A child with a position anchor is additionally shifted by the parent delta
    /// sampled at that anchor, and the shift carries through the child's subtree.
    pub fn set_rect(&mut self, id: K, rect: Rect) -> bool {
        let Some(t) = self.get_mut(id) else {
            return false;
        };
        let delta = rect - t.rect;
        t.rect = rect;
        t.dirty = true;

        self.propagate(id, (delta, Vec2::zero()), |t, (d, shift)| t.follow_parent(d, shift));
        true
    }

    /// Moves `id` and every descendant's position by the same delta. Rects are
    /// layout and stay where they are.
    pub fn set_position(&mut self, id: K, position: Vec2) -> bool {
        let Some(t) = self.get_mut(id) else {
            return false;
        };
        let delta = position - t.position;
        t.position = position;
        t.dirty = true;

        self.propagate(id, (), |t, ()| {
            t.position += delta;
            t.dirty = true;
        });
        true
    }

    /// Sets rotation in radians; descendants orbit `id`'s position.
    pub fn set_rotation(&mut self, id: K, radians: f32) -> bool {
        let Some(t) = self.get_mut(id) else {
            return false;
        };
        let delta = radians - t.rotation;
        let pivot = t.position;
        t.rotation = radians;
        t.dirty = true;

        self.propagate(id, (), |t, ()| {
            t.position = pivot + (t.position - pivot).rotated(delta);
            t.rotation += delta;
            t.dirty = true;
        });
        true
    }

    pub fn set_scale(&mut self, id: K, scale: Vec2) -> bool {
        let Some(t) = self.get_mut(id) else {
            return false;
        };
        let ratio = div_or(scale, t.scale, Vec2::splat(1.0));
        let pivot = t.position;
        t.scale = scale;
        t.dirty = true;

        self.propagate(id, (), |t, ()| {
            t.position = pivot + (t.position - pivot).mul_each(ratio);
            t.scale = t.scale.mul_each(ratio);
            t.dirty = true;
        });
        true
    }

    pub fn set_anchors(&mut self, id: K, anchors: Anchors) -> bool {
        self.get_mut(id)
            .map(|t| {
                t.anchors = anchors;
                t.dirty = true;
            })
            .is_some()
    }

    pub fn set_position_anchor(&mut self, id: K, anchor: Option<Vec2>) -> bool {
        self.get_mut(id)
            .map(|t| {
                t.position_anchor = anchor;
                t.dirty = true;
            })
            .is_some()
    }

    /// Position in the parent's rotated and scaled frame; world position for roots.
    pub fn local_position(&self, id: K) -> Option<Vec2> {
        let t = self.get(id)?;
        Some(match self.parent_value(id) {
            Some(p) => div_or((t.position - p.position).rotated(-p.rotation), p.scale, Vec2::zero()),
            None => t.position,
        })
    }

    pub fn set_local_position(&mut self, id: K, local: Vec2) -> bool {
        let world = match self.parent_value(id) {
            Some(p) => p.position + local.mul_each(p.scale).rotated(p.rotation),
            None => local,
        };
        self.set_position(id, world)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use slotmap::DefaultKey;

    use super::*;

    const EPS: f32 = 1e-4;

    fn panel() -> Rect {
        Rect::from_origin_size(Vec2::zero(), Vec2::new(100.0, 50.0))
    }

    fn widen(h: &mut Hierarchy<DefaultKey, RectTransform>, id: DefaultKey, by: f32) {
        let mut r = h.get(id).unwrap().rect();
        r.right += by;
        h.set_rect(id, r);
    }

    // ── anchors ───────────────────────────────────────────────────────────

    #[test]
    fn half_right_anchor_takes_half_the_delta() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let parent = h.insert(None, RectTransform::new(panel())).unwrap();
        let child_rect = Rect::from_origin_size(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        let child = h
            .insert(
                Some(parent),
                RectTransform::new(child_rect).with_anchors(Anchors::new(0.0, 0.5, 0.0, 0.0)),
            )
            .unwrap();

        widen(&mut h, parent, 40.0);

        let r = h.get(child).unwrap().rect();
        assert_eq!(r.right, child_rect.right + 20.0);
        assert_eq!(r.left, child_rect.left);
    }

    #[test]
    fn default_anchors_pin_the_child() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let parent = h.insert(None, RectTransform::new(panel())).unwrap();
        let child = h.insert(Some(parent), RectTransform::new(panel())).unwrap();
        widen(&mut h, parent, 30.0);
        assert_eq!(h.get(child).unwrap().rect(), panel());
    }

    #[test]
    fn child_delta_flows_to_grandchildren() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let a = h.insert(None, RectTransform::new(panel())).unwrap();
        let b = h
            .insert(Some(a), RectTransform::new(panel()).with_anchors(Anchors::new(0.0, 0.5, 0.0, 0.0)))
            .unwrap();
        let c = h
            .insert(Some(b), RectTransform::new(panel()).with_anchors(Anchors::STRETCH))
            .unwrap();

        widen(&mut h, a, 40.0);

        assert_eq!(h.get(b).unwrap().rect().right, 120.0);
        assert_eq!(h.get(c).unwrap().rect().right, 120.0);
    }

    // ── position anchor ───────────────────────────────────────────────────

    #[test]
    fn position_anchor_samples_the_parent_delta() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let parent = h.insert(None, RectTransform::new(panel())).unwrap();
        let child = h
            .insert(
                Some(parent),
                RectTransform::new(panel())
                    .with_position(Vec2::new(5.0, 5.0))
                    .with_position_anchor(Vec2::new(0.5, 0.0)),
            )
            .unwrap();
        let grandchild = h
            .insert(Some(child), RectTransform::new(panel()).with_position(Vec2::new(7.0, 7.0)))
            .unwrap();

        widen(&mut h, parent, 40.0);

        assert_eq!(h.get(child).unwrap().position(), Vec2::new(25.0, 5.0));
        assert_eq!(h.get(grandchild).unwrap().position(), Vec2::new(27.0, 7.0));
        // Position anchor never touches the rect.
        assert_eq!(h.get(child).unwrap().rect(), panel());
    }

    // ── position / rotation / scale ───────────────────────────────────────

    #[test]
    fn position_delta_moves_descendant_positions_only() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let parent = h.insert(None, RectTransform::new(panel())).unwrap();
        let child = h.insert(Some(parent), RectTransform::new(panel())).unwrap();

        h.set_position(parent, Vec2::new(10.0, -4.0));

        assert_eq!(h.get(child).unwrap().position(), Vec2::new(10.0, -4.0));
        assert_eq!(h.get(child).unwrap().rect(), panel());
    }

    #[test]
    fn rotation_orbits_children() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let parent = h.insert(None, RectTransform::default()).unwrap();
        let child = h
            .insert(Some(parent), RectTransform::default().with_position(Vec2::new(10.0, 0.0)))
            .unwrap();

        h.set_rotation(parent, FRAC_PI_2);

        let t = h.get(child).unwrap();
        assert!(t.position().abs_diff_eq(Vec2::new(0.0, 10.0), EPS));
        assert!((t.rotation() - FRAC_PI_2).abs() < EPS);
        assert!(h.local_position(child).unwrap().abs_diff_eq(Vec2::new(10.0, 0.0), EPS));
    }

    #[test]
    fn scale_stretches_offsets() {
        let mut h: Hierarchy<DefaultKey, RectTransform> = Hierarchy::new();
        let parent = h.insert(None, RectTransform::default()).unwrap();
        let child = h
            .insert(Some(parent), RectTransform::default().with_position(Vec2::new(10.0, 4.0)))
            .unwrap();

        h.set_scale(parent, Vec2::new(2.0, 0.5));

        let t = h.get(child).unwrap();
        assert_eq!(t.position(), Vec2::new(20.0, 2.0));
        assert_eq!(t.scale(), Vec2::new(2.0, 0.5));
    }
}
