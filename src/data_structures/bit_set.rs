use num_integer::div_ceil;

/// Returns the index and mask necessary to access the bit at `index` in a ```&[u64]```.
///
/// # Example
///
/// ```
/// # use synclogic::data_structures::word_mask_64;
/// let word_slice = [0u64, 1u64];
/// let bit_index = 64;
///
/// let (word_index, mask) = word_mask_64(bit_index);
/// let bit_set = (word_slice[word_index] & mask) != 0;
///
/// assert_eq!(bit_set, true);
/// ```
#[inline(always)]
pub fn word_mask_64(index: usize) -> (usize, u64) {
    let word = index / 64;
    let mask = 1 << (index % 64);
    (word, mask)
}

/// Fixed size (at runtime) set of small integers packed into 64 bit words.
///
/// Used by the propagation worklist to remember which modules are already queued.
///
/// # Example
/// ```
/// # use synclogic::data_structures::BitSet;
/// let mut s = BitSet::new(2);
///
/// assert_eq!(s.capacity(), 64);
///
/// s.insert(1);
/// assert_eq!(s.contains(1), true);
/// assert_eq!(s.contains(0), false);
///
/// s.remove(1);
/// assert_eq!(s.contains(1), false);
/// ```
///
/// # Panics
///
/// Panics if you try to read or write to an index >= [BitSet::capacity()]
///
/// ```should_panic
/// # use synclogic::data_structures::BitSet;
/// let mut s = BitSet::new(2);
///
/// s.contains(64);
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct BitSet {
    words: Vec<u64>,
}
impl BitSet {
    /// Returns a new [BitSet] able to hold `n` bits, all of which are cleared.
    pub fn new(n: usize) -> BitSet {
        BitSet {
            words: vec![0; div_ceil(n, 64)],
        }
    }

    /// Returns true if `index` is part of the set.
    ///
    /// # Panics
    ///
    /// Panics if `index` >= [BitSet::capacity()]
    #[inline(always)]
    pub fn contains(&self, index: usize) -> bool {
        let (word_index, mask) = word_mask_64(index);
        let word = match self.words.get(word_index) {
            Some(word) => word,
            None => panic!(
                "Tried to access index out of bounds:{}, size:{}",
                index,
                self.capacity()
            ),
        };
        word & mask != 0
    }

    /// Adds `index` to the set, returns true if it wasn't present before.
    ///
    /// # Panics
    ///
    /// Panics if `index` >= [BitSet::capacity()]
    #[inline(always)]
    pub fn insert(&mut self, index: usize) -> bool {
        let (word_index, mask) = word_mask_64(index);
        let word = &mut self.words[word_index];
        let was_set = *word & mask != 0;
        *word |= mask;
        !was_set
    }

    /// Removes `index` from the set.
    ///
    /// # Panics
    ///
    /// Panics if `index` >= [BitSet::capacity()]
    #[inline(always)]
    pub fn remove(&mut self, index: usize) {
        let (word_index, mask) = word_mask_64(index);
        self.words[word_index] &= !mask;
    }

    /// Grows the set so it can hold at least `n` bits, new bits are cleared.
    pub fn grow(&mut self, n: usize) {
        let words = div_ceil(n, 64);
        if words > self.words.len() {
            self.words.resize(words, 0);
        }
    }

    /// Removes every element from the set.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Inserts every index in `0..n`.
    pub fn fill(&mut self, n: usize) {
        self.grow(n);
        let (full_words, rest) = (n / 64, n % 64);
        for word in &mut self.words[..full_words] {
            *word = !0;
        }
        if rest != 0 {
            self.words[full_words] |= (1 << rest) - 1;
        }
    }

    /// Returns the number of bits the set can hold, always a multiple of 64.
    pub fn capacity(&self) -> usize {
        self.words.len() * 64
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut s = BitSet::new(130);
        assert_eq!(s.capacity(), 192);

        assert!(s.insert(129));
        assert!(!s.insert(129));
        assert!(s.contains(129));
        assert!(!s.contains(128));

        s.remove(129);
        assert!(!s.contains(129));
        assert!(s.is_empty());
    }

    #[test]
    fn test_fill() {
        let mut s = BitSet::new(0);
        s.fill(70);

        assert_eq!(s.len(), 70);
        assert!(s.contains(0));
        assert!(s.contains(69));
        assert!(!s.contains(70));

        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.capacity(), 128);
    }

    #[test]
    fn test_grow_keeps_bits() {
        let mut s = BitSet::new(10);
        s.insert(3);
        s.grow(1000);

        assert!(s.contains(3));
        assert_eq!(s.len(), 1);
        assert_eq!(s.capacity(), 1024);
    }

    #[test]
    #[should_panic(expected = "Tried to access index out of bounds:64, size:64")]
    fn test_out_of_bounds() {
        let s = BitSet::new(1);
        s.contains(64);
    }
}
