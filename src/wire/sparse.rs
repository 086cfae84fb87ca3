/// An `i32`-keyed map with positional access, kept sorted by key.
///
/// Generated code walks it by position (`key_at`/`value_at`) rather than
/// through an iterator of pairs, and rebuilds it with `put`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SparseArray<V> {
    entries: Vec<(i32, V)>,
}

impl<V> Default for SparseArray<V> {
    fn default() -> Self { Self { entries: Vec::new() } }
}

impl<V> SparseArray<V> {
    pub fn new() -> Self { Self::default() }
    pub fn with_capacity(capacity: usize) -> Self { Self { entries: Vec::with_capacity(capacity) } }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Insert or replace; returns the previous value for `key`.
    pub fn put(&mut self, key: i32, value: V) -> Option<V> {
        match self.entries.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(at) => Some(std::mem::replace(&mut self.entries[at].1, value)),
            Err(at) => {
                self.entries.insert(at, (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: i32) -> Option<&V> {
        self.entries
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|at| &self.entries[at].1)
    }

    pub fn remove(&mut self, key: i32) -> Option<V> {
        self.entries
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|at| self.entries.remove(at).1)
    }

    /// # Panics
    /// If `index >= self.len()`.
    pub fn key_at(&self, index: usize) -> i32 { self.entries[index].0 }

    /// # Panics
    /// If `index >= self.len()`.
    pub fn value_at(&self, index: usize) -> &V { &self.entries[index].1 }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

impl<V> FromIterator<(i32, V)> for SparseArray<V> {
    fn from_iter<I: IntoIterator<Item = (i32, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.put(k, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_stay_sorted_and_positional() {
        let mut s = SparseArray::new();
        assert_eq!(s.put(9, "b"), None);
        assert_eq!(s.put(5, "a"), None);
        assert_eq!(s.put(9, "B"), Some("b"));
        assert_eq!(s.len(), 2);
        assert_eq!((s.key_at(0), *s.value_at(0)), (5, "a"));
        assert_eq!((s.key_at(1), *s.value_at(1)), (9, "B"));
        assert_eq!(s.get(5), Some(&"a"));
        assert_eq!(s.remove(5), Some("a"));
        assert_eq!(s.get(5), None);
    }
}
