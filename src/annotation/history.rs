// ==================== Undo/redo history ====================

/// Linear undo/redo over committed items.
///
/// Every item lives in exactly one of the two stacks. Undo moves the newest active item onto
/// the redo stack, redo moves it back, and committing anything new clears the redo stack.
/// There is no capacity limit.
#[derive(Debug, Clone)]
pub struct HistoryManager<C> {
    /// Committed items, oldest first. This is also the render order.
    active: Vec<C>,
    /// Undone items, most recently undone last.
    redo_stack: Vec<C>,
}

impl<C> Default for HistoryManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> HistoryManager<C> {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Commit a new item; clears the redo stack.
    pub fn push(&mut self, item: C) {
        self.redo_stack.clear();
        self.active.push(item);
    }

    /// Undo the newest item, returning it.
    pub fn undo(&mut self) -> Option<&C> {
        let item = self.active.pop()?;
        self.redo_stack.push(item);
        self.redo_stack.last()
    }

    /// Redo the most recently undone item, returning it.
    pub fn redo(&mut self) -> Option<&C> {
        let item = self.redo_stack.pop()?;
        self.active.push(item);
        self.active.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn active(&self) -> &[C] {
        &self.active
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryManager;

    #[test]
    fn undo_redo_round_trip() {
        let mut history = HistoryManager::new();
        for i in 0..5 {
            history.push(i);
        }
        for _ in 0..5 {
            assert!(history.undo().is_some());
        }
        assert!(history.undo().is_none());
        assert!(history.active().is_empty());

        for _ in 0..5 {
            assert!(history.redo().is_some());
        }
        assert_eq!(history.active(), &[0, 1, 2, 3, 4]);
        assert!(!history.can_redo());
    }

    #[test]
    fn commit_clears_redo() {
        let mut history = HistoryManager::new();
        history.push(1);
        history.push(2);
        assert_eq!(history.undo(), Some(&2));
        assert!(history.can_redo());

        history.push(3);
        assert!(!history.can_redo());
        assert_eq!(history.active(), &[1, 3]);
    }

    #[test]
    fn no_items_are_dropped() {
        let mut history = HistoryManager::new();
        for i in 0..500 {
            history.push(i);
        }
        assert_eq!(history.active().len(), 500);
    }
}
