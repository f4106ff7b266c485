//! Extendible hash table.
//!
//! An extendible hash table grows by splitting individual buckets instead
//! of rehashing the whole map. A directory of `2^global_depth` slots maps
//! the low bits of a key's hash to a bucket; each bucket knows how many of
//! those bits it actually discriminates on (its `local_depth`). When a
//! bucket overflows, only that bucket splits; the directory doubles only
//! when the overflowing bucket already uses every directory bit.
//!
//! Buckets are stored in an arena and the directory holds arena indices,
//! so the many-slots-to-one-bucket aliasing needs no shared-ownership
//! machinery.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

/// A bucket: a bounded list of entries sharing the same low
/// `local_depth` hash bits.
struct Bucket<K, V> {
    local_depth: usize,
    items: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(local_depth: usize, capacity: usize) -> Self {
        Self {
            local_depth,
            items: Vec::with_capacity(capacity),
        }
    }
}

struct Table<K, V> {
    /// Bit width of the directory index.
    global_depth: usize,
    /// Directory: slot -> arena index. Many slots may alias one bucket.
    dir: Vec<usize>,
    /// Bucket arena. Every slot is reachable from `dir`.
    buckets: Vec<Bucket<K, V>>,
}

/// A concurrent hash table with dynamic growth via local bucket splits.
///
/// Lookups and removals touch a single bucket. Insertions may split the
/// target bucket, and splitting cascades until the new entry fits; a split
/// that sends every entry to one side simply triggers the next split.
/// Buckets are never merged, so the directory grows monotonically.
///
/// The whole table is guarded by one latch; hashing is deterministic for
/// the lifetime of a table instance.
///
/// # Example
///
/// ```rust
/// use oxbow_container::ExtendibleHashTable;
///
/// let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
/// table.insert(1, 10);
/// table.insert(1, 11); // overwrite
/// assert_eq!(table.find(&1), Some(11));
/// assert!(table.remove(&1));
/// assert_eq!(table.find(&1), None);
/// ```
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    inner: Mutex<Table<K, V>>,
    hasher: S,
    bucket_size: usize,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState> {
    /// Creates an empty table whose buckets hold at most `bucket_size`
    /// entries.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S: BuildHasher> ExtendibleHashTable<K, V, S> {
    /// Creates an empty table using the given hasher.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        assert!(bucket_size > 0, "bucket_size must be > 0");
        Self {
            inner: Mutex::new(Table {
                global_depth: 0,
                dir: vec![0],
                buckets: vec![Bucket::new(0, bucket_size)],
            }),
            hasher,
            bucket_size,
        }
    }

    /// Returns the directory's bit width.
    pub fn global_depth(&self) -> usize {
        self.inner.lock().global_depth
    }

    /// Returns the bit width of the bucket referenced by directory slot
    /// `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is out of range.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let table = self.inner.lock();
        table.buckets[table.dir[dir_index]].local_depth
    }

    /// Returns the number of distinct buckets reachable from the
    /// directory.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        let table = self.inner.lock();
        table.buckets.iter().map(|b| b.items.len()).sum()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn hash(&self, key: &K) -> usize
    where
        K: Hash,
    {
        self.hasher.hash_one(key) as usize
    }

    #[inline]
    fn slot_of(hash: usize, global_depth: usize) -> usize {
        hash & ((1usize << global_depth) - 1)
    }

    /// Looks up the value for `key`.
    pub fn find(&self, key: &K) -> Option<V>
    where
        K: Hash + Eq,
        V: Clone,
    {
        let table = self.inner.lock();
        let slot = Self::slot_of(self.hash(key), table.global_depth);
        table.buckets[table.dir[slot]]
            .items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Removes the entry for `key`, returning whether it was present.
    ///
    /// Buckets are not merged on removal.
    pub fn remove(&self, key: &K) -> bool
    where
        K: Hash + Eq,
    {
        let mut table = self.inner.lock();
        let slot = Self::slot_of(self.hash(key), table.global_depth);
        let bucket_idx = table.dir[slot];
        let items = &mut table.buckets[bucket_idx].items;
        match items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Inserts `key -> value`, overwriting any existing entry for `key`.
    ///
    /// If the target bucket is full the bucket splits; splits cascade
    /// until the entry fits, doubling the directory whenever the
    /// overflowing bucket's `local_depth` has caught up with
    /// `global_depth`.
    pub fn insert(&self, key: K, value: V)
    where
        K: Hash + Eq,
    {
        let mut table = self.inner.lock();
        let hash = self.hash(&key);
        loop {
            let slot = Self::slot_of(hash, table.global_depth);
            let bucket_idx = table.dir[slot];
            let bucket = &mut table.buckets[bucket_idx];

            if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
                return;
            }
            if bucket.items.len() < self.bucket_size {
                bucket.items.push((key, value));
                return;
            }

            self.split(&mut table, bucket_idx);
        }
    }

    /// Splits the bucket at `bucket_idx` in two, raising its local depth
    /// by one and doubling the directory first if necessary.
    ///
    /// Entries whose hash has the new depth bit set move to a fresh
    /// bucket; the rest stay put. Every directory slot that referenced the
    /// old bucket is re-aimed by that same bit, so aliasing stays
    /// consistent no matter how many slots pointed at it.
    fn split(&self, table: &mut Table<K, V>, bucket_idx: usize)
    where
        K: Hash,
    {
        let local_depth = table.buckets[bucket_idx].local_depth;
        if local_depth == table.global_depth {
            // Double the directory: append a copy of every slot.
            let len = table.dir.len();
            table.dir.extend_from_within(..len);
            table.global_depth += 1;
        }

        let mask = 1usize << local_depth;
        table.buckets[bucket_idx].local_depth = local_depth + 1;

        let items = std::mem::take(&mut table.buckets[bucket_idx].items);
        let mut high = Bucket::new(local_depth + 1, self.bucket_size);
        for (k, v) in items {
            if self.hash(&k) & mask != 0 {
                high.items.push((k, v));
            } else {
                table.buckets[bucket_idx].items.push((k, v));
            }
        }
        let high_idx = table.buckets.len();
        table.buckets.push(high);

        for (slot, target) in table.dir.iter_mut().enumerate() {
            if *target == bucket_idx && slot & mask != 0 {
                *target = high_idx;
            }
        }
    }
}

impl<K, V, S: BuildHasher> std::fmt::Debug for ExtendibleHashTable<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.inner.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &table.global_depth)
            .field("num_buckets", &table.buckets.len())
            .field("bucket_size", &self.bucket_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hasher;

    /// Hashes integer keys to themselves so tests control bit patterns.
    #[derive(Default, Clone)]
    struct IdentityState;

    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }

        fn write_u32(&mut self, i: u32) {
            self.0 = u64::from(i);
        }

        fn write_u64(&mut self, i: u64) {
            self.0 = i;
        }

        fn write_usize(&mut self, i: usize) {
            self.0 = i as u64;
        }
    }

    impl BuildHasher for IdentityState {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }

    fn identity_table(bucket_size: usize) -> ExtendibleHashTable<u64, u64, IdentityState> {
        ExtendibleHashTable::with_hasher(bucket_size, IdentityState)
    }

    #[test]
    fn test_insert_find_remove() {
        let table = ExtendibleHashTable::new(4);

        table.insert(1u64, "a");
        table.insert(2, "b");
        assert_eq!(table.find(&1), Some("a"));
        assert_eq!(table.find(&2), Some("b"));
        assert_eq!(table.find(&3), None);
        assert_eq!(table.len(), 2);

        assert!(table.remove(&1));
        assert!(!table.remove(&1));
        assert_eq!(table.find(&1), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let table = ExtendibleHashTable::new(4);

        table.insert(7u64, 70u64);
        table.insert(7, 71);
        assert_eq!(table.find(&7), Some(71));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_split_on_overflow() {
        // bucket_size 2, keys 0b00, 0b10, 0b01: the third insert forces a
        // split that doubles the directory and routes 0b01 to slot 1.
        let table = identity_table(2);
        assert_eq!(table.global_depth(), 0);
        assert_eq!(table.num_buckets(), 1);

        table.insert(0b00, 0);
        table.insert(0b10, 2);
        table.insert(0b01, 1);

        assert_eq!(table.global_depth(), 1);
        assert_eq!(table.num_buckets(), 2);
        assert_eq!(table.local_depth(0), 1);
        assert_eq!(table.local_depth(1), 1);
        assert_eq!(table.find(&0b00), Some(0));
        assert_eq!(table.find(&0b10), Some(2));
        assert_eq!(table.find(&0b01), Some(1));
    }

    #[test]
    fn test_split_cascades() {
        // Keys congruent mod 4 keep landing in one bucket: one insert may
        // force several splits before the entry fits.
        let table = identity_table(2);

        table.insert(0, 0);
        table.insert(4, 4);
        table.insert(8, 8);

        assert_eq!(table.global_depth(), 3);
        assert_eq!(table.num_buckets(), 4);
        for &k in &[0u64, 4, 8] {
            assert_eq!(table.find(&k), Some(k));
        }
    }

    #[test]
    fn test_local_depth_bounded_by_global() {
        let table = identity_table(2);
        for k in 0..64u64 {
            table.insert(k, k);
        }

        let global = table.global_depth();
        for slot in 0..(1usize << global) {
            assert!(table.local_depth(slot) <= global);
        }
    }

    #[test]
    fn test_entries_route_by_local_prefix() {
        // Every key must be reachable through the slot its hash selects,
        // i.e. entries agree with their bucket's prefix bits.
        let table = identity_table(2);
        for k in 0..128u64 {
            table.insert(k, k * 3);
        }
        for k in 0..128u64 {
            assert_eq!(table.find(&k), Some(k * 3));
        }
    }

    #[test]
    fn test_no_merge_on_remove() {
        let table = identity_table(2);
        for k in 0..32u64 {
            table.insert(k, k);
        }
        let buckets = table.num_buckets();
        let depth = table.global_depth();

        for k in 0..32u64 {
            assert!(table.remove(&k));
        }

        assert!(table.is_empty());
        assert_eq!(table.num_buckets(), buckets);
        assert_eq!(table.global_depth(), depth);
    }

    #[test]
    fn test_default_hasher_round_trip() {
        let table = ExtendibleHashTable::new(4);
        for k in 0..1000u64 {
            table.insert(k, k + 1);
        }
        for k in 0..1000u64 {
            assert_eq!(table.find(&k), Some(k + 1));
        }
        assert_eq!(table.len(), 1000);
    }

    #[test]
    #[should_panic(expected = "bucket_size")]
    fn test_zero_bucket_size_rejected() {
        let _ = ExtendibleHashTable::<u64, u64>::new(0);
    }
}
