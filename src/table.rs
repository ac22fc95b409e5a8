//! The array hash table: bucket dispatch, growth, and iteration.

use std::marker::PhantomData;
use std::slice;

use crate::bucket::{Bucket, Records};
use crate::codec::{self, SlotValue};
use crate::error::KeyError;
use crate::hash::{Fnv1a, KeyHash};

/// Bucket count of a freshly created (or cleared) table.
pub const INITIAL_BUCKETS: usize = 8;

/// Records per bucket at which the next insert doubles the bucket count.
pub const MAX_LOAD_FACTOR: f64 = 5.0;

#[inline]
fn max_len_for(buckets: usize) -> usize {
    (MAX_LOAD_FACTOR * buckets as f64) as usize
}

/// A hash table from byte-string keys to fixed-width unsigned integers.
///
/// Each bucket is one contiguous byte buffer of packed records, so a lookup
/// touches a single allocation and the table stays efficient at load factors
/// well above one. Generic over the value width `V` (any [`SlotValue`],
/// default `u64`) and the hash function `H` (default [`Fnv1a`]).
///
/// Keys must be 1 to 32767 bytes; see [`KeyError`]. There is no removal of
/// individual keys, only [`clear`](Self::clear).
pub struct ArrayHashTable<V = u64, H = Fnv1a> {
    buckets: Vec<Bucket>,
    len: usize,
    /// Record count at which the next insert triggers expansion.
    max_len: usize,
    /// Opaque per-table flag byte for an embedding structure; never read here.
    pub flag: u8,
    /// First opaque context byte, preserved alongside [`flag`](Self::flag).
    pub c0: u8,
    /// Second opaque context byte.
    pub c1: u8,
    _marker: PhantomData<(V, H)>,
}

impl<V: SlotValue, H: KeyHash> ArrayHashTable<V, H> {
    /// Create an empty table with [`INITIAL_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_buckets(INITIAL_BUCKETS)
    }

    /// Create an empty table with `n` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn with_buckets(n: usize) -> Self {
        assert!(n >= 1, "a table needs at least one bucket");
        Self {
            buckets: vec![Bucket::new(); n],
            len: 0,
            max_len: max_len_for(n),
            flag: 0,
            c0: 0,
            c1: 0,
            _marker: PhantomData,
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count. Doubles on expansion; only
    /// [`clear`](Self::clear) ever brings it back down.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn check_key(key: &[u8]) -> Result<(), KeyError> {
        if key.is_empty() {
            return Err(KeyError::ZeroLength);
        }
        if key.len() > codec::MAX_KEY_LEN {
            return Err(KeyError::Oversize(key.len()));
        }
        Ok(())
    }

    #[inline]
    fn bucket_index(&self, key: &[u8]) -> usize {
        H::hash(key) as usize % self.buckets.len()
    }

    /// Look up `key`, returning a copy of its value.
    pub fn get(&self, key: &[u8]) -> Result<Option<V>, KeyError> {
        Self::check_key(key)?;
        let bucket = &self.buckets[self.bucket_index(key)];
        Ok(bucket
            .find::<V>(key)
            .map(|pos| V::read_from(bucket.value::<V>(pos))))
    }

    /// Look up `key`, returning an in-place handle to its value.
    ///
    /// Does not insert; the table contents are unchanged either way.
    pub fn get_mut(&mut self, key: &[u8]) -> Result<Option<ValueMut<'_, V>>, KeyError> {
        Self::check_key(key)?;
        let idx = self.bucket_index(key);
        let bucket = &mut self.buckets[idx];
        match bucket.find::<V>(key) {
            Some(pos) => Ok(Some(ValueMut::new(bucket.value_mut::<V>(pos)))),
            None => Ok(None),
        }
    }

    /// `true` if a record for `key` exists. Keys that cannot be stored are
    /// reported absent.
    pub fn contains(&self, key: &[u8]) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }

    /// Fetch the value handle for `key`, inserting a zero value if absent.
    ///
    /// A table at capacity expands before the search, so the handle always
    /// points into the record's final location.
    pub fn get_or_insert(&mut self, key: &[u8]) -> Result<ValueMut<'_, V>, KeyError> {
        Self::check_key(key)?;
        let (idx, pos) = self.insert_slot(key);
        Ok(ValueMut::new(self.buckets[idx].value_mut::<V>(pos)))
    }

    /// Insert or overwrite `key`'s value; returns the previous value if the
    /// key already existed.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>, KeyError> {
        Self::check_key(key)?;
        let len_before = self.len;
        let (idx, pos) = self.insert_slot(key);
        let slot = self.buckets[idx].value_mut::<V>(pos);
        let previous = if self.len == len_before {
            Some(V::read_from(slot))
        } else {
            None
        };
        value.write_to(slot);
        Ok(previous)
    }

    /// Locate or create the record for `key`; bumps `len` when a record is
    /// appended. Returns the bucket index and the value byte offset.
    fn insert_slot(&mut self, key: &[u8]) -> (usize, usize) {
        // Grow pre-emptively, before the search, so a record appended on a
        // miss never lands in a bucket that is about to be rebuilt.
        if self.len >= self.max_len {
            self.expand();
        }
        let idx = self.bucket_index(key);
        if let Some(pos) = self.buckets[idx].find::<V>(key) {
            return (idx, pos);
        }
        let pos = self.buckets[idx].push::<V>(key);
        self.len += 1;
        (idx, pos)
    }

    /// Double the bucket count, rebuilding every bucket.
    ///
    /// Two passes: the first walks all records to compute the exact byte size
    /// of every destination bucket, the second replays the records into
    /// pre-sized buffers. No bucket is reallocated while rehashing, and no
    /// record is searched for twice.
    fn expand(&mut self) {
        let new_n = 2 * self.buckets.len();

        let mut sizes = vec![0usize; new_n];
        for bucket in &self.buckets {
            for (key, _) in bucket.records::<V>() {
                sizes[H::hash(key) as usize % new_n] += codec::record_len::<V>(key.len());
            }
        }

        let mut next: Vec<Bucket> = sizes
            .iter()
            .map(|&size| {
                if size > 0 {
                    Bucket::with_record_capacity(size)
                } else {
                    Bucket::new()
                }
            })
            .collect();

        let mut placed = 0usize;
        for bucket in &self.buckets {
            for (key, value) in bucket.records::<V>() {
                let dst = H::hash(key) as usize % new_n;
                next[dst].push_unterminated(key, V::read_from(value));
                placed += 1;
            }
        }
        debug_assert_eq!(placed, self.len);

        for bucket in &mut next {
            if !bucket.is_empty() {
                bucket.terminate();
            }
        }

        self.buckets = next;
        self.max_len = max_len_for(new_n);
    }

    /// Drop every record and shrink back to [`INITIAL_BUCKETS`] buckets.
    ///
    /// The metadata triple is left untouched.
    pub fn clear(&mut self) {
        self.buckets = vec![Bucket::new(); INITIAL_BUCKETS];
        self.len = 0;
        self.max_len = max_len_for(INITIAL_BUCKETS);
    }

    /// Iterate over all `(key, value)` pairs, bucket-index ascending and in
    /// insertion order within each bucket.
    ///
    /// The iterator borrows the table, so the table cannot be mutated while
    /// any iterator is alive.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            records: Records::empty(),
        }
    }

    /// Heap bytes held by the table: every bucket buffer plus the bucket
    /// array itself.
    pub fn memory_usage(&self) -> usize {
        self.buckets.capacity() * std::mem::size_of::<Bucket>()
            + self.buckets.iter().map(Bucket::capacity).sum::<usize>()
    }
}

impl<V: SlotValue, H: KeyHash> Default for ArrayHashTable<V, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, H> Clone for ArrayHashTable<V, H> {
    /// Deep-copies every bucket buffer; the clone shares no storage with the
    /// original. The metadata triple is preserved verbatim.
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            len: self.len,
            max_len: self.max_len,
            flag: self.flag,
            c0: self.c0,
            c1: self.c1,
            _marker: PhantomData,
        }
    }
}

impl<'a, V: SlotValue, H: KeyHash> IntoIterator for &'a ArrayHashTable<V, H> {
    type Item = (&'a [u8], V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over all records of a table.
///
/// Yields `(key bytes, value)` pairs. Order is bucket-index ascending, then
/// insertion order within each bucket.
pub struct Iter<'a, V> {
    buckets: slice::Iter<'a, Bucket>,
    records: Records<'a, V>,
}

impl<'a, V: SlotValue> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, value)) = self.records.next() {
                return Some((key, V::read_from(value)));
            }
            self.records = self.buckets.next()?.records::<V>();
        }
    }
}

/// Mutable handle to the value field of one record.
///
/// The handle borrows the table exclusively, so it lives exactly until the
/// next mutation of the table; the compiler enforces the invalidation rule.
pub struct ValueMut<'a, V> {
    slot: &'a mut [u8],
    _marker: PhantomData<V>,
}

impl<'a, V: SlotValue> ValueMut<'a, V> {
    pub(crate) fn new(slot: &'a mut [u8]) -> Self {
        debug_assert_eq!(slot.len(), V::SIZE);
        Self {
            slot,
            _marker: PhantomData,
        }
    }

    /// Read the current value.
    #[inline]
    pub fn get(&self) -> V {
        V::read_from(self.slot)
    }

    /// Overwrite the value in place.
    #[inline]
    pub fn set(&mut self, value: V) {
        value.write_to(self.slot);
    }
}
