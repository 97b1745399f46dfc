use std::collections::HashSet;
use std::hash::Hash;

/// Which keyed groups are expanded, scoped to a governing context
/// (selected league, league + year, ...).
///
/// Switching to a different context clears the set so no key from a previous
/// context survives.
#[derive(Debug, Clone)]
pub struct ExpansionState<C, K> {
    context: Option<C>,
    expanded: HashSet<K>,
}

impl<C, K> Default for ExpansionState<C, K> {
    fn default() -> Self {
        Self {
            context: None,
            expanded: HashSet::new(),
        }
    }
}

impl<C: PartialEq, K: Eq + Hash> ExpansionState<C, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    /// Returns true when the context changed (and the set was cleared)
    pub fn set_context(&mut self, context: C) -> bool {
        if self.context.as_ref() == Some(&context) {
            return false;
        }
        self.context = Some(context);
        self.expanded.clear();
        true
    }

    /// Expand if collapsed, collapse if expanded. Returns the new state.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.contains(key)
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    pub fn expanded_keys(&self) -> impl Iterator<Item = &K> {
        self.expanded.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut state: ExpansionState<u32, u32> = ExpansionState::new();
        state.set_context(39);
        state.toggle(3);
        let before: HashSet<u32> = state.expanded_keys().copied().collect();

        assert!(state.toggle(12));
        assert!(state.is_expanded(&12));
        assert!(!state.toggle(12));

        let after: HashSet<u32> = state.expanded_keys().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_context_change_clears() {
        let mut state: ExpansionState<(u32, i32), u32> = ExpansionState::new();
        state.set_context((39, 2024));
        state.toggle(1);
        state.toggle(2);

        // same context keeps the set
        assert!(!state.set_context((39, 2024)));
        assert_eq!(state.expanded_count(), 2);

        // year change
        assert!(state.set_context((39, 2023)));
        assert_eq!(state.expanded_count(), 0);

        state.toggle(5);
        // league change
        assert!(state.set_context((140, 2023)));
        assert!(!state.is_expanded(&5));
    }

    #[test]
    fn test_collapse_all() {
        let mut state: ExpansionState<u32, String> = ExpansionState::new();
        state.toggle("news-1".to_string());
        state.collapse_all();
        assert!(!state.is_expanded(&"news-1".to_string()));
        assert_eq!(state.context(), None);
    }
}
