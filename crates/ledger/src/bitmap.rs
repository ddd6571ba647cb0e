//! Claimed-bit storage

use std::{
    collections::HashMap,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

const WORD_BITS: u64 = u64::BITS as u64;

/// One bit per committed index, packed into atomic words keyed by `index / 64`.
///
/// Words are created on first set, so memory follows the number of claims rather than the
/// largest index. Bits only go from 0 to 1, except when a failed claim rolls its own bit back.
#[derive(Debug)]
pub(crate) struct ClaimBitmap {
    words: RwLock<HashMap<u64, AtomicU64>>,
    max_index: u64,
}

const fn locate(index: u64) -> (u64, u64) {
    (index / WORD_BITS, 1 << (index % WORD_BITS))
}

impl ClaimBitmap {
    pub(crate) fn new(max_index: u64) -> Self {
        Self {
            words: RwLock::new(HashMap::new()),
            max_index,
        }
    }

    pub(crate) const fn max_index(&self) -> u64 {
        self.max_index
    }

    /// Whether the bit is set, `None` past `max_index`
    pub(crate) fn get(&self, index: u64) -> Option<bool> {
        if index > self.max_index {
            return None;
        }
        let (key, mask) = locate(index);
        let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
        Some(
            words
                .get(&key)
                .is_some_and(|word| word.load(Ordering::Acquire) & mask != 0),
        )
    }

    /// Set the bit; `Some(true)` only for the caller that flipped it
    pub(crate) fn try_set(&self, index: u64) -> Option<bool> {
        if index > self.max_index {
            return None;
        }
        let (key, mask) = locate(index);

        {
            let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(word) = words.get(&key) {
                return Some(word.fetch_or(mask, Ordering::AcqRel) & mask == 0);
            }
        }

        let mut words = self.words.write().unwrap_or_else(PoisonError::into_inner);
        let word = words.entry(key).or_default();
        Some(word.fetch_or(mask, Ordering::AcqRel) & mask == 0)
    }

    /// Clear the bit
    pub(crate) fn clear(&self, index: u64) {
        let (key, mask) = locate(index);
        let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(word) = words.get(&key) {
            word.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    #[cfg(test)]
    fn allocated_words(&self) -> usize {
        self.words
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_set_once() {
        let bitmap = ClaimBitmap::new(129);
        assert_eq!(bitmap.get(129), Some(false));
        assert_eq!(bitmap.try_set(129), Some(true));
        assert_eq!(bitmap.try_set(129), Some(false));
        assert_eq!(bitmap.get(129), Some(true));
        assert_eq!(bitmap.get(128), Some(false));
        assert_eq!(bitmap.get(65), Some(false));
    }

    #[test]
    fn test_out_of_range() {
        let bitmap = ClaimBitmap::new(63);
        assert_eq!(bitmap.get(64), None);
        assert_eq!(bitmap.try_set(64), None);
        assert_eq!(bitmap.allocated_words(), 0);
    }

    #[test]
    fn test_sparse_indices_allocate_per_word() {
        let bitmap = ClaimBitmap::new(u64::MAX);
        assert_eq!(bitmap.allocated_words(), 0);

        assert_eq!(bitmap.try_set(1 << 40), Some(true));
        assert_eq!(bitmap.try_set(u64::MAX), Some(true));
        assert_eq!(bitmap.try_set(0), Some(true));
        assert_eq!(bitmap.try_set(1), Some(true));

        assert_eq!(bitmap.allocated_words(), 3);
        assert_eq!(bitmap.get(1 << 40), Some(true));
        assert_eq!(bitmap.get((1 << 40) + 1), Some(false));
        assert_eq!(bitmap.get(u64::MAX), Some(true));
        assert_eq!(bitmap.get(u64::MAX - 1), Some(false));
    }

    #[test]
    fn test_concurrent_first_set() {
        let bitmap = ClaimBitmap::new(u64::MAX);
        let index = 3 << 50;

        let flipped = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| bitmap.try_set(index)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|result| *result == Some(true))
                .count()
        });

        assert_eq!(flipped, 1);
        assert_eq!(bitmap.allocated_words(), 1);
    }

    #[test]
    fn test_clear() {
        let bitmap = ClaimBitmap::new(9);
        bitmap.try_set(3);
        bitmap.try_set(4);
        bitmap.clear(3);
        bitmap.clear(9);
        assert_eq!(bitmap.get(3), Some(false));
        assert_eq!(bitmap.get(4), Some(true));
    }
}
