use std::marker::PhantomData;

pub trait ToBitIdx {
    fn to_bit_idx(&self) -> usize;
}

pub trait FromBitIdx {
    fn from_bit_idx(idx: usize) -> Self;
}

/// A fixed-capacity set of dense indices
#[derive(Debug)]
pub struct BitSet<T: ToBitIdx> {
    chunks: Vec<u64>,
    len: usize,
    phantom: PhantomData<T>,
}

impl<T: ToBitIdx> Clone for BitSet<T> {
    fn clone(&self) -> Self {
        BitSet {
            chunks: self.chunks.clone(),
            len: self.len,
            phantom: PhantomData,
        }
    }
}

impl<T: ToBitIdx> PartialEq for BitSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.chunks == other.chunks
    }
}

impl<T: ToBitIdx> Eq for BitSet<T> {}

#[inline(always)]
fn chunk_idx(n: usize) -> usize {
    n / 64
}

#[inline(always)]
fn bit_idx(n: usize) -> usize {
    n % 64
}

impl<T: ToBitIdx> BitSet<T> {
    pub fn new(n_elems: usize) -> BitSet<T> {
        let words = (n_elems + 63) / 64;
        BitSet {
            chunks: vec![0; words],
            len: n_elems,
            phantom: PhantomData,
        }
    }

    /// Returns whether the bit was updated
    #[inline]
    pub fn set(&mut self, elem: &T) -> bool {
        let elem_idx = elem.to_bit_idx();
        let chunk = &mut self.chunks[chunk_idx(elem_idx)];
        let mask = 1u64 << bit_idx(elem_idx);
        let updated = *chunk & mask == 0;
        *chunk |= mask;
        updated
    }

    /// Returns whether the bit was set
    #[inline]
    pub fn remove(&mut self, elem: &T) -> bool {
        let elem_idx = elem.to_bit_idx();
        let chunk = &mut self.chunks[chunk_idx(elem_idx)];
        let mask = 1u64 << bit_idx(elem_idx);
        let was_set = *chunk & mask != 0;
        *chunk &= !mask;
        was_set
    }

    #[inline]
    pub fn get(&self, elem: &T) -> bool {
        let elem_idx = elem.to_bit_idx();
        elem_idx < self.len && self.get_bit(elem_idx)
    }

    /// Adds all elements of `other`. Returns whether any bit was updated.
    pub fn union_with(&mut self, other: &BitSet<T>) -> bool {
        assert_eq!(self.len, other.len);
        let mut updated = false;
        for (chunk, other_chunk) in self.chunks.iter_mut().zip(other.chunks.iter()) {
            let new = *chunk | *other_chunk;
            updated |= new != *chunk;
            *chunk = new;
        }
        updated
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|chunk| *chunk == 0)
    }

    pub fn count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.count_ones() as usize).sum()
    }

    #[inline(always)]
    fn get_bit(&self, bit: usize) -> bool {
        let chunk = self.chunks[chunk_idx(bit)];
        (chunk >> bit_idx(bit)) & 0b1 == 0b1
    }
}

struct BitIter<'a, T: ToBitIdx> {
    set: &'a BitSet<T>,
    idx: usize,
}

impl<'a, T: ToBitIdx + FromBitIdx> Iterator for BitIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.idx < self.set.len() {
            let chunk = self.set.chunks[chunk_idx(self.idx)] >> bit_idx(self.idx);
            if chunk == 0 {
                // Skip to the start of the next chunk
                self.idx = (chunk_idx(self.idx) + 1) * 64;
                continue;
            }
            let i = self.idx + chunk.trailing_zeros() as usize;
            self.idx = i + 1;
            return Some(T::from_bit_idx(i));
        }
        None
    }
}

impl<T: ToBitIdx + FromBitIdx> BitSet<T> {
    pub fn elems<'a>(&'a self) -> impl Iterator<Item = T> + 'a {
        BitIter { set: self, idx: 0 }
    }
}

#[cfg(test)]
impl ToBitIdx for usize {
    fn to_bit_idx(&self) -> usize {
        *self
    }
}

#[cfg(test)]
impl FromBitIdx for usize {
    fn from_bit_idx(idx: usize) -> Self {
        idx
    }
}

#[test]
fn bit_set_1() {
    const N_ELEMS: usize = 100;

    let mut bitset: BitSet<usize> = BitSet::new(N_ELEMS);
    for i in 0..N_ELEMS {
        assert_eq!(bitset.get(&i), false);
    }
    for i in 0..N_ELEMS {
        assert!(bitset.set(&i));
        assert!(!bitset.set(&i));
        for j in 0..=i {
            assert_eq!(bitset.get(&j), true);
        }
        for j in i + 1..N_ELEMS {
            assert_eq!(bitset.get(&j), false);
        }
    }
    assert_eq!(bitset.count(), N_ELEMS);
}

#[test]
fn bit_set_elems() {
    let mut bitset: BitSet<usize> = BitSet::new(200);
    for i in [0, 3, 63, 64, 65, 130, 199] {
        bitset.set(&i);
    }
    assert_eq!(
        bitset.elems().collect::<Vec<usize>>(),
        vec![0, 3, 63, 64, 65, 130, 199]
    );

    assert!(bitset.remove(&64));
    assert!(!bitset.remove(&64));
    assert_eq!(
        bitset.elems().collect::<Vec<usize>>(),
        vec![0, 3, 63, 65, 130, 199]
    );
}

#[test]
fn bit_set_union() {
    let mut a: BitSet<usize> = BitSet::new(70);
    let mut b: BitSet<usize> = BitSet::new(70);
    assert!(a.is_empty());
    a.set(&1);
    b.set(&1);
    b.set(&69);

    assert!(a.union_with(&b));
    assert!(!a.union_with(&b));
    assert_eq!(a, b);
    assert_eq!(a.elems().collect::<Vec<usize>>(), vec![1, 69]);
}
