use crate::types::BlockId;

/// Set of block ids rendered in the transparent pass.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TransparencySet {
    bits: [u64; 4],
}

impl TransparencySet {
    pub const fn new() -> Self {
        Self { bits: [0; 4] }
    }

    /// Air is never stored.
    #[inline]
    pub fn insert(&mut self, id: BlockId) {
        if id != 0 {
            self.bits[(id >> 6) as usize] |= 1u64 << (id & 63);
        }
    }

    #[inline]
    pub fn remove(&mut self, id: BlockId) {
        self.bits[(id >> 6) as usize] &= !(1u64 << (id & 63));
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        self.bits[(id >> 6) as usize] & (1u64 << (id & 63)) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = BlockId> + '_ {
        (1..=255u8).filter(move |id| self.contains(*id))
    }
}

impl FromIterator<BlockId> for TransparencySet {
    fn from_iter<I: IntoIterator<Item = BlockId>>(iter: I) -> Self {
        let mut s = TransparencySet::new();
        for id in iter {
            s.insert(id);
        }
        s
    }
}
