use slotmap::{Key, SlotMap};

struct Node<K, T> {
    parent: Option<K>,
    children: Vec<K>,
    transform: T,
}

/// Arena-backed parent/child tree of transforms.
///
/// Nodes are addressed by generational keys, so a stale id never aliases a newer
/// node. Parent links are plain keys: the arena owns every node, and children are
/// kept in insertion order.
pub struct Hierarchy<K: Key, T> {
    nodes: SlotMap<K, Node<K, T>>,
    roots: Vec<K>,
}

impl<K: Key, T> Hierarchy<K, T> {
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key(), roots: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: K) -> bool {
        self.nodes.contains_key(id)
    }

    /// Inserts a node, as a root or under `parent`. Returns `None` if `parent` is
    /// not alive.
    pub(crate) fn insert(&mut self, parent: Option<K>, transform: T) -> Option<K> {
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return None;
            }
        }

        let id = self.nodes.insert(Node { parent, children: Vec::new(), transform });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        Some(id)
    }

    /// Removes `id` and its whole subtree; returns the removed ids, parents first.
    pub(crate) fn remove(&mut self, id: K) -> Vec<K> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let parent = node.parent;
        self.unlink(id, parent);

        let mut removed = vec![id];
        removed.extend(self.descendants(id));
        for k in &removed {
            self.nodes.remove(*k);
        }
        removed
    }

    /// Moves `id` under `new_parent` (or to the roots). Stored values are left
    /// untouched. Fails if either node is dead or the move would create a cycle.
    pub fn set_parent(&mut self, id: K, new_parent: Option<K>) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let old_parent = node.parent;
        if old_parent == new_parent {
            return true;
        }
        if let Some(p) = new_parent {
            if !self.nodes.contains_key(p) || p == id || self.is_ancestor(id, p) {
                return false;
            }
        }

        self.unlink(id, old_parent);
        self.nodes[id].parent = new_parent;
        match new_parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        true
    }

    #[inline]
    pub fn get(&self, id: K) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.transform)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|n| &mut n.transform)
    }

    #[inline]
    pub fn parent(&self, id: K) -> Option<K> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: K) -> &[K] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[K] {
        &self.roots
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: K, id: K) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Every descendant of `id` in depth-first pre-order, excluding `id`.
    pub fn descendants(&self, id: K) -> Vec<K> {
        let mut out = Vec::new();
        let mut stack: Vec<K> = self.children(id).iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        out
    }

    /// Every node in depth-first pre-order, roots in insertion order.
    pub fn walk(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            out.push(root);
            out.extend(self.descendants(root));
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.nodes.iter().map(|(k, n)| (k, &n.transform))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.nodes.values_mut().map(|n| &mut n.transform)
    }

    /// Parent value of `id`, if it has a parent.
    pub(crate) fn parent_value(&self, id: K) -> Option<&T> {
        self.parent(id).and_then(|p| self.get(p))
    }

    /// Visits every descendant of `id` parents-first. `f` receives the value handed
    /// down by the node's parent and returns the value for the node's own children.
    pub(crate) fn propagate<D: Copy>(&mut self, id: K, seed: D, mut f: impl FnMut(&mut T, D) -> D) {
        let mut stack: Vec<(K, D)> = self.children(id).iter().map(|&c| (c, seed)).collect();
        while let Some((k, d)) = stack.pop() {
            let node = &mut self.nodes[k];
            let next = f(&mut node.transform, d);
            stack.extend(node.children.iter().map(|&c| (c, next)));
        }
    }

    fn unlink(&mut self, id: K, parent: Option<K>) {
        let siblings = match parent {
            Some(p) => match self.nodes.get_mut(p) {
                Some(n) => &mut n.children,
                None => return,
            },
            None => &mut self.roots,
        };
        siblings.retain(|&c| c != id);
    }
}

impl<K: Key, T> Default for Hierarchy<K, T> {
    fn default() -> Self {
        Self::new()
    }
}
