//! Indexed binary min-heap.
//!
//! Entries are external ids in `0..n` with an `f32` key. Unlike `BinaryHeap`, an id's key can be
//! changed or the id removed in `O(log n)`, and presence is an `O(1)` lookup.

const ABSENT: u32 = u32::MAX;

#[derive(Debug, Clone, Default)]
pub struct Heap {
    /// Ids in heap order
    heap: Vec<u32>,
    /// Key of each id, indexed by id
    keys: Vec<f32>,
    /// Position of each id within `heap`, or `ABSENT`
    heap_indexes: Vec<u32>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_capacity(n: usize) -> Self {
        let mut heap = Self::default();
        heap.resize(n);
        heap
    }

    /// Empty the heap and make room for ids `0..n`.
    pub fn resize(&mut self, n: usize) {
        self.heap.clear();
        self.keys.clear();
        self.keys.resize(n, 0.0);
        self.heap_indexes.clear();
        self.heap_indexes.resize(n, ABSENT);
    }

    pub fn clear(&mut self) {
        for &idx in &self.heap {
            self.heap_indexes[idx as usize] = ABSENT;
        }
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_present(&self, idx: usize) -> bool {
        self.heap_indexes.get(idx).is_some_and(|&p| p != ABSENT)
    }

    pub fn get_key(&self, idx: usize) -> Option<f32> {
        self.is_present(idx).then(|| self.keys[idx])
    }

    /// Id with the smallest key
    pub fn top(&self) -> Option<usize> {
        self.heap.first().map(|&idx| idx as usize)
    }

    pub fn top_key(&self) -> Option<f32> {
        self.top().map(|idx| self.keys[idx])
    }

    pub fn pop(&mut self) -> Option<usize> {
        let idx = self.top()?;
        self.remove(idx);
        Some(idx)
    }

    /// Insert `idx`, growing the index space if needed. Panics if `idx` is already present.
    pub fn add(&mut self, key: f32, idx: usize) {
        assert!(!self.is_present(idx), "id {idx} is already in the heap");

        if idx >= self.heap_indexes.len() {
            self.heap_indexes.resize(idx + 1, ABSENT);
            self.keys.resize(idx + 1, 0.0);
        }

        let pos = self.heap.len();
        self.keys[idx] = key;
        self.heap_indexes[idx] = pos as u32;
        self.heap.push(idx as u32);
        self.push_up(pos);
    }

    /// Change the key of a present id. Panics if `idx` is absent.
    pub fn update(&mut self, key: f32, idx: usize) {
        assert!(self.is_present(idx), "id {idx} is not in the heap");

        self.keys[idx] = key;
        self.restore(self.heap_indexes[idx] as usize);
    }

    /// Returns false if `idx` was not present.
    pub fn remove(&mut self, idx: usize) -> bool {
        if !self.is_present(idx) {
            return false;
        }

        let pos = self.heap_indexes[idx] as usize;
        self.heap_indexes[idx] = ABSENT;

        let Some(last) = self.heap.pop() else {
            return false;
        };

        if pos < self.heap.len() {
            self.heap[pos] = last;
            self.heap_indexes[last as usize] = pos as u32;
            self.restore(pos);
        }
        true
    }

    fn key_at(&self, pos: usize) -> f32 {
        self.keys[self.heap[pos] as usize]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.heap_indexes[self.heap[a] as usize] = a as u32;
        self.heap_indexes[self.heap[b] as usize] = b as u32;
    }

    fn restore(&mut self, pos: usize) {
        if pos > 0 && self.key_at(pos) < self.key_at((pos - 1) / 2) {
            self.push_up(pos);
        } else {
            self.push_down(pos);
        }
    }

    fn push_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.key_at(pos) >= self.key_at(parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn push_down(&mut self, mut pos: usize) {
        loop {
            let left = pos * 2 + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < self.heap.len() && self.key_at(left) < self.key_at(smallest) {
                smallest = left;
            }
            if right < self.heap.len() && self.key_at(right) < self.key_at(smallest) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}
