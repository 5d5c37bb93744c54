use glam::{Quat, Vec3};
use slotmap::Key;

use super::Hierarchy;

/// World-space 3D transform of an entity.
///
/// Values are stored in world space; parent-relative values are derived on demand.
/// Setters on [`Hierarchy`] keep every descendant consistent at the moment of the
/// write, so reads never need to walk up the tree.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    dirty: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        dirty: true,
    };

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation: rotation.normalize(), scale, dirty: true }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set on every write; cleared by the engine after the frame is built.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// `a / b` per component, with `fallback` wherever `b` is zero.
fn div_or(a: Vec3, b: Vec3, fallback: Vec3) -> Vec3 {
    Vec3::select(b.cmpeq(Vec3::ZERO), fallback, a / b)
}

impl<K: Key> Hierarchy<K, Transform> {
    pub fn position(&self, id: K) -> Option<Vec3> {
        self.get(id).map(Transform::position)
    }

    pub fn rotation(&self, id: K) -> Option<Quat> {
        self.get(id).map(Transform::rotation)
    }

    pub fn scale(&self, id: K) -> Option<Vec3> {
        self.get(id).map(Transform::scale)
    }

    /// Moves `id` to `position` and every descendant by the same delta.
    pub fn set_position(&mut self, id: K, position: Vec3) -> bool {
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

    /// Sets the world rotation of `id`. Descendants orbit `id`'s position by the
    /// rotation delta and have it composed into their own rotation.
    pub fn set_rotation(&mut self, id: K, rotation: Quat) -> bool {
        let Some(t) = self.get_mut(id) else {
            return false;
        };
        let rotation = rotation.normalize();
        let delta = (rotation * t.rotation.inverse()).normalize();
        let pivot = t.position;
        t.rotation = rotation;
        t.dirty = true;

        self.propagate(id, (), |t, ()| {
            t.position = pivot + delta * (t.position - pivot);
            t.rotation = (delta * t.rotation).normalize();
            t.dirty = true;
        });
        true
    }

    /// Sets the world scale of `id`. Descendants are scaled by the per-axis ratio,
    /// and their offsets from `id` stretch by the same ratio along `id`'s own
    /// (rotated) axes, so children keep their local position. An axis whose old
    /// scale was zero leaves descendants unchanged on that axis.
    pub fn set_scale(&mut self, id: K, scale: Vec3) -> bool {
        let Some(t) = self.get_mut(id) else {
            return false;
        };
        let ratio = div_or(scale, t.scale, Vec3::ONE);
        let pivot = t.position;
        let frame = t.rotation;
        t.scale = scale;
        t.dirty = true;

        self.propagate(id, (), |t, ()| {
            let offset = frame.inverse() * (t.position - pivot);
            t.position = pivot + frame * (offset * ratio);
            t.scale *= ratio;
            t.dirty = true;
        });
        true
    }

    pub fn translate(&mut self, id: K, delta: Vec3) -> bool {
        match self.position(id) {
            Some(p) => self.set_position(id, p + delta),
            None => false,
        }
    }

    /// Applies `delta` on top of the current world rotation.
    pub fn rotate(&mut self, id: K, delta: Quat) -> bool {
        match self.rotation(id) {
            Some(r) => self.set_rotation(id, delta * r),
            None => false,
        }
    }

    /// Position relative to the parent's frame; world position for roots.
    pub fn local_position(&self, id: K) -> Option<Vec3> {
        let t = self.get(id)?;
        Some(match self.parent_value(id) {
            Some(p) => div_or(p.rotation.inverse() * (t.position - p.position), p.scale, Vec3::ZERO),
            None => t.position,
        })
    }

    pub fn local_rotation(&self, id: K) -> Option<Quat> {
        let t = self.get(id)?;
        Some(match self.parent_value(id) {
            Some(p) => (p.rotation.inverse() * t.rotation).normalize(),
            None => t.rotation,
        })
    }

    pub fn local_scale(&self, id: K) -> Option<Vec3> {
        let t = self.get(id)?;
        Some(match self.parent_value(id) {
            Some(p) => div_or(t.scale, p.scale, t.scale),
            None => t.scale,
        })
    }

    pub fn set_local_position(&mut self, id: K, local: Vec3) -> bool {
        let world = match self.parent_value(id) {
            Some(p) => p.position + p.rotation * (local * p.scale),
            None => local,
        };
        self.set_position(id, world)
    }

    pub fn set_local_rotation(&mut self, id: K, local: Quat) -> bool {
        let world = match self.parent_value(id) {
            Some(p) => p.rotation * local,
            None => local,
        };
        self.set_rotation(id, world)
    }

    pub fn set_local_scale(&mut self, id: K, local: Vec3) -> bool {
        let world = match self.parent_value(id) {
            Some(p) => p.scale * local,
            None => local,
        };
        self.set_scale(id, world)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::Vec3;
    use slotmap::DefaultKey;

    use super::*;

    const EPS: f32 = 1e-4;

    fn chain() -> (Hierarchy<DefaultKey, Transform>, [DefaultKey; 3]) {
        let mut h = Hierarchy::new();
        let a = h.insert(None, Transform::from_position(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        let b = h.insert(Some(a), Transform::from_position(Vec3::new(2.0, 0.0, 0.0))).unwrap();
        let c = h.insert(Some(b), Transform::from_position(Vec3::new(3.0, 0.0, 0.0))).unwrap();
        (h, [a, b, c])
    }

    fn clean(h: &mut Hierarchy<DefaultKey, Transform>) {
        h.values_mut().for_each(Transform::clear_dirty);
    }

    // ── position ──────────────────────────────────────────────────────────

    #[test]
    fn translating_root_moves_every_descendant_by_the_same_delta() {
        let (mut h, [a, b, c]) = chain();
        clean(&mut h);

        let delta = Vec3::new(0.5, -2.0, 4.0);
        assert!(h.translate(a, delta));

        assert!(h.position(a).unwrap().abs_diff_eq(Vec3::new(1.5, -2.0, 4.0), EPS));
        assert!(h.position(b).unwrap().abs_diff_eq(Vec3::new(2.5, -2.0, 4.0), EPS));
        assert!(h.position(c).unwrap().abs_diff_eq(Vec3::new(3.5, -2.0, 4.0), EPS));
        assert!(h.get(b).unwrap().is_dirty());
        assert!(h.get(c).unwrap().is_dirty());
    }

    #[test]
    fn moving_a_middle_node_leaves_its_parent_alone() {
        let (mut h, [a, b, c]) = chain();
        clean(&mut h);
        h.set_position(b, Vec3::new(2.0, 1.0, 0.0));

        assert_eq!(h.position(a), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert!(!h.get(a).unwrap().is_dirty());
        assert!(h.position(c).unwrap().abs_diff_eq(Vec3::new(3.0, 1.0, 0.0), EPS));
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn rotating_root_orbits_descendants_around_it() {
        let (mut h, [a, b, c]) = chain();
        let theta = Quat::from_rotation_z(FRAC_PI_2);
        assert!(h.rotate(a, theta));

        // Offsets (1,0,0) and (2,0,0) from A become (0,1,0) and (0,2,0).
        assert!(h.position(b).unwrap().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPS));
        assert!(h.position(c).unwrap().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), EPS));
        assert!(h.rotation(b).unwrap().abs_diff_eq(theta, EPS));
        assert!(h.rotation(c).unwrap().abs_diff_eq(theta, EPS));
    }

    #[test]
    fn rotation_stays_normalized() {
        let (mut h, [a, _, c]) = chain();
        h.set_rotation(a, Quat::from_xyzw(0.0, 0.0, 2.0, 2.0));
        for _ in 0..100 {
            h.rotate(a, Quat::from_rotation_y(0.1));
        }
        assert!((h.rotation(a).unwrap().length() - 1.0).abs() < EPS);
        assert!((h.rotation(c).unwrap().length() - 1.0).abs() < EPS);
    }

    // ── scale ─────────────────────────────────────────────────────────────

    #[test]
    fn scaling_root_stretches_offsets_and_child_scales() {
        let (mut h, [a, b, c]) = chain();
        h.set_scale(a, Vec3::new(2.0, 1.0, 1.0));

        assert!(h.position(b).unwrap().abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPS));
        assert!(h.position(c).unwrap().abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), EPS));
        assert_eq!(h.scale(c), Some(Vec3::new(2.0, 1.0, 1.0)));
    }

    #[test]
    fn scaling_rotated_parent_keeps_child_local_position() {
        let (mut h, [a, b, _]) = chain();
        h.rotate(a, Quat::from_rotation_z(FRAC_PI_2));
        let local = h.local_position(b).unwrap();

        h.set_scale(a, Vec3::new(2.0, 1.0, 1.0));

        // Stretch happens along A's rotated x axis, which is world +y.
        assert!(h.position(b).unwrap().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), EPS));
        assert!(h.local_position(b).unwrap().abs_diff_eq(local, EPS));
    }

    #[test]
    fn scaling_from_zero_leaves_descendants_alone() {
        let (mut h, [a, b, _]) = chain();
        h.set_scale(a, Vec3::new(0.0, 1.0, 1.0));
        let before = h.position(b).unwrap();
        h.set_scale(a, Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(h.position(b), Some(before));
    }

    // ── local accessors ───────────────────────────────────────────────────

    #[test]
    fn local_values_compose_with_parent() {
        let (mut h, [a, b, _]) = chain();
        h.rotate(a, Quat::from_rotation_z(FRAC_PI_2));

        assert!(h.local_position(b).unwrap().abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
        assert!(h.local_rotation(b).unwrap().abs_diff_eq(Quat::IDENTITY, EPS));

        assert!(h.set_local_position(b, Vec3::new(0.0, 0.0, 5.0)));
        assert!(h.position(b).unwrap().abs_diff_eq(Vec3::new(1.0, 0.0, 5.0), EPS));
    }

    #[test]
    fn dead_ids_are_rejected() {
        let (mut h, [a, ..]) = chain();
        h.remove(a);
        assert!(!h.set_position(a, Vec3::ONE));
        assert!(h.local_scale(a).is_none());
    }
}
