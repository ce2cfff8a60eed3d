use std::ops::Index;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("index {index} is out of range for a bit array of length {len}")]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// Fixed length set of bits, packed 32 to a word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitArray {
    words: Vec<u32>,
    len: usize,
}

impl BitArray {
    pub fn new(len: usize) -> Self {
        let mut bits = Self::default();
        bits.resize(len);
        bits
    }

    /// Reallocate to hold `len` bits. All bits are cleared, including ones that were in range before.
    pub fn resize(&mut self, len: usize) {
        self.words.clear();
        self.words.resize(len.div_ceil(32), 0);
        self.len = len;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, index: usize) -> Result<(), IndexOutOfRange> {
        if index < self.len {
            Ok(())
        } else {
            Err(IndexOutOfRange {
                index,
                len: self.len,
            })
        }
    }

    pub fn get(&self, index: usize) -> Result<bool, IndexOutOfRange> {
        self.check(index)?;
        Ok(self.words[index / 32] & (1 << (index % 32)) != 0)
    }

    pub fn try_set(&mut self, index: usize, value: bool) -> Result<(), IndexOutOfRange> {
        self.check(index)?;
        let word = &mut self.words[index / 32];
        if value {
            *word |= 1 << (index % 32);
        } else {
            *word &= !(1 << (index % 32));
        }
        Ok(())
    }

    /// Panics if `index` is out of range
    pub fn set_true(&mut self, index: usize) {
        if let Err(e) = self.try_set(index, true) {
            panic!("{e}");
        }
    }

    /// Panics if `index` is out of range
    pub fn set_false(&mut self, index: usize) {
        if let Err(e) = self.try_set(index, false) {
            panic!("{e}");
        }
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self[i])
    }
}

impl Index<usize> for BitArray {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        match self.get(index) {
            Ok(true) => &true,
            Ok(false) => &false,
            Err(e) => panic!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut bits = BitArray::new(70);

        bits.set_true(0);
        bits.set_true(33);
        bits.set_true(69);
        assert!(bits[0] && bits[33] && bits[69]);
        assert!(!bits[1] && !bits[32] && !bits[68]);
        assert_eq!(bits.count_ones(), 3);

        bits.set_false(33);
        assert!(!bits[33]);
        assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![0, 69]);
    }

    #[test]
    fn test_resize_clears() {
        let mut bits = BitArray::new(8);
        bits.set_true(3);

        bits.resize(100);

        assert_eq!(bits.len(), 100);
        assert_eq!(bits.count_ones(), 0);
    }

    #[test]
    fn test_out_of_range() {
        let mut bits = BitArray::new(32);

        assert_eq!(bits.get(32), Err(IndexOutOfRange { index: 32, len: 32 }));
        assert!(bits.try_set(40, true).is_err());
        assert_eq!(bits.get(31), Ok(false));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_panics() {
        let bits = BitArray::new(4);
        let _ = bits[4];
    }
}
