use hashbrown::HashMap;

/// The set of corpus indices that share one composite hash key.
///
/// Kept sorted and duplicate-free, so scanning a bucket visits points in
/// ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bucket {
    ids: Vec<usize>,
}

impl Bucket {
    /// Add `id`. Returns `false` if it was already present.
    pub fn insert(&mut self, id: usize) -> bool {
        // Builds insert in ascending order, so the common case is an append.
        match self.ids.last() {
            Some(&last) if last < id => {
                self.ids.push(id);
                true
            }
            None => {
                self.ids.push(id);
                true
            }
            _ => match self.ids.binary_search(&id) {
                Ok(_) => false,
                Err(pos) => {
                    self.ids.insert(pos, id);
                    true
                }
            },
        }
    }

    pub fn contains(&self, id: usize) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.ids
    }
}

/// One hash table: composite key to bucket.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct HashTable {
    buckets: HashMap<u64, Bucket>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `id` into the bucket for `key`, creating the bucket if needed.
    pub fn insert(&mut self, key: u64, id: usize) -> bool {
        self.buckets.entry(key).or_default().insert(id)
    }

    pub fn get(&self, key: u64) -> Option<&Bucket> {
        self.buckets.get(&key)
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of stored indices across all buckets.
    pub fn num_entries(&self) -> usize {
        self.buckets.values().map(Bucket::len).sum()
    }

    pub fn max_bucket_len(&self) -> usize {
        self.buckets.values().map(Bucket::len).max().unwrap_or(0)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&u64, &Bucket)> {
        self.buckets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_insert_is_idempotent() {
        let mut b = Bucket::default();
        assert!(b.insert(3));
        assert!(!b.insert(3));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_bucket_stays_sorted() {
        let mut b = Bucket::default();
        for id in [5, 1, 9, 3, 1, 9] {
            b.insert(id);
        }
        assert_eq!(b.as_slice(), &[1, 3, 5, 9]);
        assert!(b.contains(9));
        assert!(!b.contains(4));
    }

    #[test]
    fn test_table_creates_bucket_on_first_insert() {
        let mut t = HashTable::new();
        assert!(t.get(42).is_none());
        assert!(t.insert(42, 0));
        assert!(t.insert(42, 1));
        assert!(!t.insert(42, 0));
        assert!(t.insert(7, 2));

        assert_eq!(t.len(), 2);
        assert_eq!(t.num_entries(), 3);
        assert_eq!(t.max_bucket_len(), 2);
        assert_eq!(t.get(42).unwrap().as_slice(), &[0, 1]);
    }
}
