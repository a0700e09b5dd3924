//! Fixed-size bitset over dense station indices.

use std::fmt;

const BITS_IN_BLOCK: usize = u64::BITS as usize;

/// A set of station indices in `0..capacity`.
///
/// Used for the unvisited set of every search state, so equality and
/// hashing are cheap and a clone is one small allocation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StationSet {
    blocks: Box<[u64]>,
    capacity: usize,
}

impl StationSet {
    /// Create an empty set able to hold indices `0..capacity`.
    pub fn empty(capacity: usize) -> Self {
        let block_count = capacity.div_ceil(BITS_IN_BLOCK);
        Self {
            blocks: vec![0; block_count].into_boxed_slice(),
            capacity,
        }
    }

    /// Create a set holding every index in `0..capacity`.
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::empty(capacity);
        for block in set.blocks.iter_mut() {
            *block = u64::MAX;
        }
        let tail = capacity % BITS_IN_BLOCK;
        if tail != 0
            && let Some(last) = set.blocks.last_mut()
        {
            *last = (1u64 << tail) - 1;
        }
        set
    }

    /// Add an index. Returns true if it was not already present.
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.capacity, "station index out of bounds");
        let (block, mask) = locate(index);
        let absent = self.blocks[block] & mask == 0;
        self.blocks[block] |= mask;
        absent
    }

    /// Remove an index. Returns true if it was present.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let (block, mask) = locate(index);
        let present = self.blocks[block] & mask != 0;
        self.blocks[block] &= !mask;
        present
    }

    pub fn contains(&self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let (block, mask) = locate(index);
        self.blocks[block] & mask != 0
    }

    /// Number of indices in the set.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
    }

    /// Upper bound (exclusive) on indices this set can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(block_index, &block)| {
                let mut bits = block;
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let offset = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    Some(block_index * BITS_IN_BLOCK + offset)
                })
            })
    }
}

fn locate(index: usize) -> (usize, u64) {
    (index / BITS_IN_BLOCK, 1u64 << (index % BITS_IN_BLOCK))
}

impl fmt::Debug for StationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for StationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.capacity {
            write!(f, "{}", if self.contains(i) { 1 } else { 0 })?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_full() {
        let empty = StationSet::empty(70);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);

        let full = StationSet::full(70);
        assert_eq!(full.len(), 70);
        assert!(full.contains(69));
        assert!(!full.contains(70));
        assert_eq!(full.iter().collect::<Vec<_>>(), (0..70).collect::<Vec<_>>());
    }

    #[test]
    fn full_on_block_boundary() {
        assert_eq!(StationSet::full(64).len(), 64);
        assert_eq!(StationSet::full(128).len(), 128);
        assert!(StationSet::full(0).is_empty());
    }

    #[test]
    fn insert_and_remove() {
        let mut set = StationSet::empty(10);
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert!(set.contains(3));
        assert!(set.remove(3));
        assert!(!set.remove(3));
        assert!(!set.contains(3));
        assert!(!set.remove(42));
    }

    #[test]
    #[should_panic]
    fn insert_out_of_bounds_panics() {
        let mut set = StationSet::empty(10);
        set.insert(10);
    }

    #[test]
    fn equality_and_hash_follow_contents() {
        use std::collections::HashSet;

        let mut a = StationSet::full(5);
        a.remove(2);
        let mut b = StationSet::empty(5);
        for i in [0, 1, 3, 4] {
            b.insert(i);
        }
        assert_eq!(a, b);

        let mut seen = HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&b));
    }

    #[test]
    fn display() {
        let mut set = StationSet::empty(5);
        set.insert(0);
        set.insert(2);
        assert_eq!(format!("{}", set), "[10100]");
        assert_eq!(format!("{:?}", set), "{0, 2}");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    proptest! {
        /// The bitset behaves like an ordered set of indices.
        #[test]
        fn matches_btreeset(ops in proptest::collection::vec((any::<bool>(), 0usize..150), 0..200)) {
            let mut set = StationSet::empty(150);
            let mut model = BTreeSet::new();
            for (insert, index) in ops {
                if insert {
                    prop_assert_eq!(set.insert(index), model.insert(index));
                } else {
                    prop_assert_eq!(set.remove(index), model.remove(&index));
                }
            }
            prop_assert_eq!(set.len(), model.len());
            prop_assert_eq!(set.iter().collect::<Vec<_>>(), model.into_iter().collect::<Vec<_>>());
        }
    }
}
