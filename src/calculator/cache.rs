//! Per-frame box cache.

use crate::extraction::BoundingBox;

/// Row used for entries that have not been computed yet when the cache
/// is rendered as `[x, y, w, h]` rows.
pub const NOT_COMPUTED: [i64; 4] = [-1, -1, -1, -1];

/// Bounding boxes indexed by frame, sized to the sequence length.
///
/// `None` marks an entry that has not been computed yet.
#[derive(Debug, Clone)]
pub struct BoxCache {
    entries: Vec<Option<BoundingBox>>,
}

impl BoxCache {
    /// Creates a cache with every entry absent.
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![None; len],
        }
    }

    /// Number of frames covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true for a cache over zero frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached box for `index`, if computed.
    #[inline]
    pub fn get(&self, index: usize) -> Option<BoundingBox> {
        self.entries.get(index).copied().flatten()
    }

    /// Returns true if the box for `index` is cached.
    #[inline]
    pub fn is_computed(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Stores a computed box. Indices outside the cache are ignored.
    pub(crate) fn insert(&mut self, index: usize, bbox: BoundingBox) {
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = Some(bbox);
        }
    }

    /// Read-only view of every entry.
    pub fn entries(&self) -> &[Option<BoundingBox>] {
        &self.entries
    }

    /// Number of computed entries.
    pub fn computed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Renders the cache as `[x, y, w, h]` rows, with [`NOT_COMPUTED`]
    /// for absent entries.
    pub fn to_rows(&self) -> Vec<[i64; 4]> {
        self.entries
            .iter()
            .map(|e| e.map_or(NOT_COMPUTED, |b| b.as_xywh()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_absent() {
        let cache = BoxCache::new(4);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.computed_count(), 0);
        assert!(cache.entries().iter().all(Option::is_none));
        assert_eq!(cache.to_rows(), vec![NOT_COMPUTED; 4]);
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = BoxCache::new(3);
        cache.insert(1, BoundingBox::new(2, 3, 4, 5));
        cache.insert(2, BoundingBox::EMPTY);

        assert!(!cache.is_computed(0));
        assert_eq!(cache.get(1), Some(BoundingBox::new(2, 3, 4, 5)));
        // "No object" is a computed value, not an absent one.
        assert_eq!(cache.get(2), Some(BoundingBox::EMPTY));
        assert_eq!(cache.computed_count(), 2);
        assert_eq!(
            cache.to_rows(),
            vec![NOT_COMPUTED, [2, 3, 4, 5], [0, 0, 0, 0]]
        );
    }

    #[test]
    fn test_out_of_range() {
        let mut cache = BoxCache::new(2);
        cache.insert(5, BoundingBox::new(1, 1, 1, 1));

        assert_eq!(cache.get(5), None);
        assert_eq!(cache.computed_count(), 0);
    }
}
