//! Mutation Generations
//!
//! Each document carries a counter that advances on every tree or attribute
//! mutation. Live collections remember the generation they were computed at
//! and reuse their results while it is unchanged.

/// Generation counter - incremented on every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Initial generation (never mutated)
    pub const INITIAL: Self = Generation(0);

    /// Get the raw value
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the next generation
    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

/// A value computed at a known generation of a known document
#[derive(Debug, Clone)]
pub struct Cached<T> {
    value: T,
    stamp: Option<(crate::NodeId, Generation)>,
}

impl<T: Default> Default for Cached<T> {
    fn default() -> Self {
        Self { value: T::default(), stamp: None }
    }
}

impl<T> Cached<T> {
    /// Get the value if it was computed at `stamp`
    #[inline]
    pub fn get_if_valid(&self, stamp: (crate::NodeId, Generation)) -> Option<&T> {
        (self.stamp == Some(stamp)).then_some(&self.value)
    }

    /// Replace the value and record the stamp it is valid for
    #[inline]
    pub fn update(&mut self, value: T, stamp: (crate::NodeId, Generation)) {
        self.value = value;
        self.stamp = Some(stamp);
    }

    /// Drop the stamp so the next read recomputes
    #[inline]
    pub fn invalidate(&mut self) {
        self.stamp = None;
    }

    /// Whether a value is cached for `stamp`
    #[inline]
    pub fn is_valid(&self, stamp: (crate::NodeId, Generation)) -> bool {
        self.stamp == Some(stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;

    #[test]
    fn test_generation_next() {
        let g = Generation::INITIAL;
        assert_eq!(g.next().value(), 1);
        assert_eq!(g.next().next().value(), 2);
    }

    #[test]
    fn test_cached_validity() {
        let doc = NodeId(0);
        let mut cached: Cached<Vec<u32>> = Cached::default();
        let stamp = (doc, Generation::INITIAL);

        assert!(cached.get_if_valid(stamp).is_none());
        cached.update(vec![1, 2], stamp);
        assert_eq!(cached.get_if_valid(stamp), Some(&vec![1, 2]));

        let later = (doc, Generation::INITIAL.next());
        assert!(cached.get_if_valid(later).is_none());
        assert!(!cached.is_valid(later));

        cached.invalidate();
        assert!(!cached.is_valid(stamp));
    }
}
