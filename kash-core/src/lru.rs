//! The process-wide LRU list.
//!
//! One arena of nodes spans every shard, guarded by a single mutex distinct
//! from any shard lock. Each shard's slots hold an `Option<usize>` back into
//! this arena instead of an intrusive pointer, the same index-arena
//! technique the per-shard LRU used, generalized to a single list.
//!
//! `head` is the most-recently-used node, `tail` the least-recently-used —
//! eviction always removes the tail.

use std::sync::Arc;

use parking_lot::Mutex;

struct LruNode {
    key: Arc<[u8]>,
    shard_idx: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
struct LruListInner {
    nodes: Vec<Option<LruNode>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    length: usize,
}

impl LruListInner {
    fn alloc(&mut self, key: Arc<[u8]>, shard_idx: usize) -> usize {
        let node = LruNode { key, shard_idx, prev: None, next: None };
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Detaches a node from the list without freeing its arena slot.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(n) = self.nodes[p].as_mut() {
                    n.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    /// Attaches a detached node at the head. The old head's `prev` is
    /// updated before `head` is reassigned, so a node is never left
    /// pointing at itself as its own predecessor.
    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.nodes[h].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn push_front(&mut self, key: Arc<[u8]>, shard_idx: usize) -> usize {
        let idx = self.alloc(key, shard_idx);
        self.attach_front(idx);
        self.length += 1;
        idx
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.nodes.get(idx).map(Option::is_some) != Some(true) {
            return;
        }
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    /// Removes a node from the list and frees its arena slot. Safe to call
    /// on an index that was already unlinked by a racing caller — a no-op.
    fn unlink(&mut self, idx: usize) {
        if self.nodes.get(idx).map(Option::is_some) != Some(true) {
            return;
        }
        self.detach(idx);
        self.nodes[idx] = None;
        self.free.push(idx);
        self.length = self.length.saturating_sub(1);
    }

    fn peek_tail(&self) -> Option<(Arc<[u8]>, usize, usize)> {
        let idx = self.tail?;
        let node = self.nodes[idx].as_ref()?;
        Some((node.key.clone(), node.shard_idx, idx))
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.length = 0;
    }

    #[cfg(test)]
    fn keys_front_to_back(&self) -> Vec<Arc<[u8]>> {
        let mut out = Vec::new();
        let mut cur = self.head;
        while let Some(idx) = cur {
            let node = self.nodes[idx].as_ref().expect("linked node must be live");
            out.push(node.key.clone());
            cur = node.next;
        }
        out
    }
}

/// The process-wide LRU list, behind its own lock.
///
/// Lock ordering: any shard's `RwLock` must be acquired before this mutex,
/// never after. Code that needs to touch a different shard than the one it
/// is already holding releases this mutex first.
#[derive(Default)]
pub(crate) struct LruList {
    inner: Mutex<LruListInner>,
}

impl LruList {
    pub(crate) fn push_front(&self, key: Arc<[u8]>, shard_idx: usize) -> usize {
        self.inner.lock().push_front(key, shard_idx)
    }

    pub(crate) fn move_to_front(&self, idx: usize) {
        self.inner.lock().move_to_front(idx)
    }

    pub(crate) fn unlink(&self, idx: usize) {
        self.inner.lock().unlink(idx)
    }

    pub(crate) fn peek_tail(&self) -> Option<(Arc<[u8]>, usize, usize)> {
        self.inner.lock().peek_tail()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().length
    }

    pub(crate) fn clear(&self) {
        self.inner.lock().clear()
    }

    /// Runs `push_front`, then (if this pushed the list over `capacity`)
    /// returns the tail entry that must be evicted. Both steps happen under
    /// one lock acquisition so no other insert can race between them.
    pub(crate) fn push_front_and_check_capacity(
        &self,
        key: Arc<[u8]>,
        shard_idx: usize,
        capacity: usize,
    ) -> (usize, Option<(Arc<[u8]>, usize, usize)>) {
        let mut inner = self.inner.lock();
        let idx = inner.push_front(key, shard_idx);
        let victim = if inner.length > capacity { inner.peek_tail() } else { None };
        (idx, victim)
    }

    #[cfg(test)]
    pub(crate) fn keys_front_to_back(&self) -> Vec<Arc<[u8]>> {
        self.inner.lock().keys_front_to_back()
    }
}
