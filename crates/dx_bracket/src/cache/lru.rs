//! Intrusive doubly linked list over a slab, indexed by key.
//!
//! Every operation is O(1) except [`LruList::retain`], which walks the list once. Freed slots
//! are recycled through a free list so the slab never grows past the peak entry count.

use std::borrow::Borrow;
use std::hash::Hash;

use ahash::AHashMap;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

#[derive(Debug)]
pub struct LruList<K, V> {
    index: AHashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    /// Most recently used.
    head: usize,
    /// Least recently used.
    tail: usize,
}

impl<K: Hash + Eq + Clone, V> Default for LruList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V> LruList<K, V> {
    pub fn new() -> Self {
        Self {
            index: AHashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Looks up without changing recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.node(slot).map(|node| &node.value)
    }

    /// Mutable lookup that also marks the entry most recently used.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.unlink(slot);
        self.push_front(slot);
        self.slots[slot].as_mut().map(|node| &mut node.value)
    }

    /// Inserts or replaces, marking the entry most recently used. Returns the old value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            self.unlink(slot);
            self.push_front(slot);
            return self.slots[slot]
                .as_mut()
                .map(|node| std::mem::replace(&mut node.value, value));
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.push_front(slot);
        None
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.release(slot).map(|(_, value)| value)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let slot = self.tail;
        let (key, value) = self.release(slot)?;
        self.index.remove(&key);
        Some((key, value))
    }

    /// Drops every entry for which `keep` returns false. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) -> usize {
        let mut doomed = Vec::new();
        let mut cursor = self.head;
        while cursor != NIL {
            let Some(node) = self.node(cursor) else { break };
            if !keep(&node.key, &node.value) {
                doomed.push(node.key.clone());
            }
            cursor = node.next;
        }
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Iterates from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor)?;
            cursor = node.next;
            Some((&node.key, &node.value))
        })
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn node(&self, slot: usize) -> Option<&Node<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn release(&mut self, slot: usize) -> Option<(K, V)> {
        self.unlink(slot);
        let node = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        Some((node.key, node.value))
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.node(slot) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match self.slots.get_mut(prev).and_then(Option::as_mut) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match self.slots.get_mut(next).and_then(Option::as_mut) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = NIL;
            node.next = NIL;
        }
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }
        match self.slots.get_mut(old_head).and_then(Option::as_mut) {
            Some(h) => h.prev = slot,
            None => self.tail = slot,
        }
        self.head = slot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(list: &LruList<&'static str, u32>) -> Vec<&'static str> {
        list.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_recency_order() {
        let mut list = LruList::new();
        list.insert("a", 1);
        list.insert("b", 2);
        list.insert("c", 3);
        assert_eq!(keys(&list), vec!["c", "b", "a"]);

        list.get_mut(&"a");
        assert_eq!(keys(&list), vec!["a", "c", "b"]);
        assert_eq!(list.pop_lru(), Some(("b", 2)));
        assert_eq!(keys(&list), vec!["a", "c"]);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut list = LruList::new();
        list.insert("a", 1);
        list.insert("b", 2);
        assert_eq!(list.insert("a", 10), Some(1));
        assert_eq!(keys(&list), vec!["a", "b"]);
        assert_eq!(list.remove(&"a"), Some(10));
        assert_eq!(list.remove(&"a"), None);
        assert_eq!(keys(&list), vec!["b"]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut list = LruList::new();
        for round in 0..10u32 {
            list.insert("x", round);
            list.insert("y", round);
            list.remove(&"x");
            list.remove(&"y");
        }
        assert!(list.is_empty());
        assert!(list.slots.len() <= 2);
        assert_eq!(list.pop_lru(), None);
    }

    #[test]
    fn test_retain() {
        let mut list = LruList::new();
        for (k, v) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            list.insert(k, v);
        }
        assert_eq!(list.retain(|_, v| v % 2 == 0), 2);
        assert_eq!(keys(&list), vec!["d", "b"]);
        assert_eq!(list.peek(&"b"), Some(&2));
    }
}
