//! Current-position state over a sequence of known length.

/// Owns the current index into a sequence of `len` elements.
///
/// The index is always within `[0, len - 1]`; out-of-range requests are
/// clamped. With `len == 0` there is no current index and every operation
/// is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexNavigator {
    current: usize,
    len: usize,
}

impl IndexNavigator {
    pub fn new(len: usize) -> Self {
        Self { current: 0, len }
    }

    /// Number of elements (N).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current index, `None` for an empty sequence.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.current)
    }

    /// Index of the last element.
    pub fn last(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    pub fn is_at_last(&self) -> bool {
        self.last() == Some(self.current)
    }

    /// Store `index` clamped into `[0, len - 1]`.
    pub fn set_index(&mut self, index: i64) {
        let Some(last) = self.last() else {
            return;
        };
        self.current = index.clamp(0, last as i64) as usize;
    }

    /// Advance by one, staying on the last element.
    pub fn next_clamped(&mut self) {
        if let Some(last) = self.last() {
            self.current = (self.current + 1).min(last);
        }
    }

    /// Step back by one, staying on the first element.
    pub fn previous_clamped(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Advance by one, wrapping from the last element to 0.
    pub fn next_wrapping(&mut self) {
        if self.len > 0 {
            self.current = (self.current + 1) % self.len;
        }
    }

    /// Step back by one, wrapping from 0 to the last element.
    pub fn previous_wrapping(&mut self) {
        if let Some(last) = self.last() {
            self.current = if self.current == 0 {
                last
            } else {
                self.current - 1
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_navigator_is_inert() {
        let mut nav = IndexNavigator::new(0);
        nav.set_index(5);
        nav.next_clamped();
        nav.next_wrapping();
        nav.previous_clamped();
        nav.previous_wrapping();
        assert_eq!(nav.current(), None);
        assert_eq!(nav.last(), None);
        assert!(!nav.is_at_last());
    }

    #[test]
    fn test_clamped_steps() {
        let mut nav = IndexNavigator::new(3);
        nav.next_clamped();
        nav.next_clamped();
        assert_eq!(nav.current(), Some(2));
        nav.next_clamped();
        assert_eq!(nav.current(), Some(2));
        assert!(nav.is_at_last());

        nav.set_index(0);
        nav.previous_clamped();
        assert_eq!(nav.current(), Some(0));
    }

    #[test]
    fn test_wrapping_steps() {
        let mut nav = IndexNavigator::new(3);
        nav.set_index(2);
        nav.next_wrapping();
        assert_eq!(nav.current(), Some(0));
        nav.previous_wrapping();
        assert_eq!(nav.current(), Some(2));
        nav.previous_wrapping();
        assert_eq!(nav.current(), Some(1));
    }

    #[test]
    fn test_single_element() {
        let mut nav = IndexNavigator::new(1);
        nav.next_wrapping();
        assert_eq!(nav.current(), Some(0));
        nav.previous_wrapping();
        assert_eq!(nav.current(), Some(0));
        nav.set_index(-3);
        assert_eq!(nav.current(), Some(0));
    }

    proptest! {
        #[test]
        fn prop_set_index_clamps(len in 1usize..500, index in any::<i64>()) {
            let mut nav = IndexNavigator::new(len);
            nav.set_index(index);
            let current = nav.current().unwrap();
            if index < 0 {
                prop_assert_eq!(current, 0);
            } else if index as u64 >= len as u64 {
                prop_assert_eq!(current, len - 1);
            } else {
                prop_assert_eq!(current, index as usize);
            }
        }

        #[test]
        fn prop_wrapping_is_cyclic(len in 1usize..100, start in 0usize..100, steps in 0usize..300) {
            let mut nav = IndexNavigator::new(len);
            nav.set_index(start as i64);
            let origin = nav.current().unwrap();
            for _ in 0..steps {
                nav.next_wrapping();
            }
            prop_assert_eq!(nav.current().unwrap(), (origin + steps) % len);
            for _ in 0..steps {
                nav.previous_wrapping();
            }
            prop_assert_eq!(nav.current().unwrap(), origin);
        }

        #[test]
        fn prop_clamped_stays_in_range(len in 1usize..50, moves in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut nav = IndexNavigator::new(len);
            for forward in moves {
                if forward {
                    nav.next_clamped();
                } else {
                    nav.previous_clamped();
                }
                prop_assert!(nav.current().unwrap() < len);
            }
        }
    }
}
