// Copyright 2026 The layermerge developers
// License: MIT
//
// Slot arena with free-list reuse.
//
// The sweep and contour stages both maintain linked structures (the coverage
// segment list; the contour end list, arc set, and point chains) whose nodes
// are created and destroyed millions of times per merge. Nodes live in a
// Vec-backed pool and refer to each other by u32 index; INVALID is the null
// index. Freed slots are recycled through a free list, so a steady-state
// sweep allocates nothing.

use std::ops::{Index, IndexMut};

/// Null index.
pub const INVALID: u32 = u32::MAX;

/// A Vec-backed slot pool. `free(idx)` returns a slot for reuse; the caller
/// must not touch a freed index until `alloc` hands it out again.
pub struct Pool<T> {
    slots: Vec<T>,
    free: Vec<u32>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Pool {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a slot holding `value`, reusing a freed slot when possible.
    pub fn alloc(&mut self, value: T) -> u32 {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = value;
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(value);
            idx
        }
    }

    /// Return a slot to the free list.
    pub fn free(&mut self, idx: u32) {
        debug_assert!((idx as usize) < self.slots.len());
        self.free.push(idx);
    }

    /// Number of slots currently allocated (not on the free list).
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl<T> Index<u32> for Pool<T> {
    type Output = T;
    #[inline]
    fn index(&self, idx: u32) -> &T {
        &self.slots[idx as usize]
    }
}

impl<T> IndexMut<u32> for Pool<T> {
    #[inline]
    fn index_mut(&mut self, idx: u32) -> &mut T {
        &mut self.slots[idx as usize]
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
