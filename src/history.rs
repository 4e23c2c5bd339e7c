//! Bounded, insertion-ordered history
//!
//! A FIFO log that never holds more than `N` entries: pushing past the cap
//! evicts the oldest entries first. Serialized as a plain JSON array so the
//! on-disk shape stays a list.

use serde::{Deserialize, Deserializer, Serialize};

/// Append-only sequence capped at the `N` most recent entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoundedHistory<T, const N: usize> {
    items: Vec<T>,
}

impl<T, const N: usize> BoundedHistory<T, N> {
    /// Maximum number of retained entries
    pub const MAX_SIZE: usize = N;

    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from an existing sequence, keeping only the most recent `N`.
    pub fn from_vec(mut items: Vec<T>) -> Self {
        if items.len() > N {
            items.drain(..items.len() - N);
        }
        Self { items }
    }

    /// Append an entry, evicting from the front if the cap is exceeded.
    /// Returns how many entries were evicted.
    pub fn push(&mut self, item: T) -> usize {
        self.items.push(item);
        let overflow = self.items.len().saturating_sub(N);
        if overflow > 0 {
            self.items.drain(..overflow);
        }
        overflow
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recently pushed entry
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T, const N: usize> Default for BoundedHistory<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a BoundedHistory<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'de, T, const N: usize> Deserialize<'de> for BoundedHistory<T, N>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(Self::from_vec(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_under_cap() {
        let mut h: BoundedHistory<u32, 3> = BoundedHistory::new();
        assert_eq!(h.push(1), 0);
        assert_eq!(h.push(2), 0);
        assert_eq!(h.len(), 2);
        assert_eq!(h.last(), Some(&2));
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut h: BoundedHistory<u32, 3> = BoundedHistory::new();
        for i in 1..=5 {
            h.push(i);
            assert!(h.len() <= 3);
        }
        assert_eq!(h.as_slice(), &[3, 4, 5]);
    }

    #[test]
    fn test_from_vec_keeps_most_recent() {
        let h: BoundedHistory<u32, 2> = BoundedHistory::from_vec(vec![1, 2, 3, 4]);
        assert_eq!(h.as_slice(), &[3, 4]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut h: BoundedHistory<&str, 4> = BoundedHistory::new();
        h.push("a");
        h.push("b");
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_deserialize_enforces_cap() {
        let h: BoundedHistory<u32, 2> = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(h.as_slice(), &[2, 3]);
        assert_eq!(BoundedHistory::<u32, 2>::MAX_SIZE, 2);
    }
}
