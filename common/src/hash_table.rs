//! Multimap from a 32 bit geometric hash to the ids sharing it.
//!
//! Lookups are approximate: callers walk a bucket and verify each candidate exactly.
use std::{
    collections::HashMap,
    hash::{BuildHasherDefault, Hasher},
};

/// The keys are already well mixed hashes, so hashing them again only needs to spread them into
/// the high bits the table probes with.
#[derive(Default, Clone, Copy)]
pub struct PrehashedHasher(u64);

impl Hasher for PrehashedHasher {
    fn finish(&self) -> u64 {
        self.0.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | b as u64;
        }
    }

    fn write_u32(&mut self, i: u32) {
        self.0 = i as u64;
    }
}

type BuildPrehashedHasher = BuildHasherDefault<PrehashedHasher>;

#[derive(Debug, Clone, Default)]
pub struct HashTable {
    buckets: HashMap<u32, Vec<u32>, BuildPrehashedHasher>,
}

impl HashTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn add(&mut self, hash: u32, id: u32) {
        self.buckets.entry(hash).or_default().push(id);
    }

    /// Remove one occurrence of `id` from the bucket of `hash`. Returns false if it was not there.
    pub fn remove(&mut self, hash: u32, id: u32) -> bool {
        let Some(bucket) = self.buckets.get_mut(&hash) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|&x| x == id) else {
            return false;
        };

        bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
        }
        true
    }

    /// Every id added under `hash`, including ids that only collide with it.
    pub fn bucket(&self, hash: u32) -> &[u32] {
        self.buckets.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Murmur3 finaliser
pub fn murmur_finalize(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Combine two hashes, order dependent. Used for directed edges.
pub fn murmur_mix(a: u32, b: u32) -> u32 {
    let mut h = a.rotate_left(5) ^ b;
    h = h.wrapping_mul(0xcc9e_2d51);
    h = h.rotate_left(15);
    h = h.wrapping_mul(0x1b87_3593);
    murmur_finalize(h ^ a)
}

fn float_bits(v: f32) -> u32 {
    // -0.0 and 0.0 compare equal, so they must hash equal
    let v = if v == 0.0 { 0.0 } else { v };
    let bits = v.to_bits();
    bits ^ (bits >> 17)
}

pub fn hash_position(p: glam::Vec3) -> u32 {
    let x = float_bits(p.x).wrapping_mul(73_856_093);
    let y = float_bits(p.y).wrapping_mul(19_349_663);
    let z = float_bits(p.z).wrapping_mul(83_492_791);
    murmur_finalize(x ^ y ^ z)
}

/// Hash of the directed edge `p0 -> p1`
pub fn hash_edge(p0: glam::Vec3, p1: glam::Vec3) -> u32 {
    murmur_mix(hash_position(p0), hash_position(p1))
}
