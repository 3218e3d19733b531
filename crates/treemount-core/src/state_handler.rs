//! Component state that outlives a single layout pass.
//!
//! The tree owns one [`StateHandler`]. Every layout pass works on a snapshot
//! of it, applies the pending updates of the components it lays out, and the
//! snapshot is committed back once the pass result is accepted. Updates
//! queued while a pass was running stay pending for the next one.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::collections::map::HashMap;
use crate::component::ComponentKey;

pub type StateValue = Arc<dyn Any + Send + Sync>;

/// A deferred mutation of one component's state.
#[derive(Clone)]
pub struct StateUpdate {
    apply: Arc<dyn Fn(Option<&StateValue>) -> StateValue + Send + Sync>,
}

impl StateUpdate {
    /// Builds an update from the previous typed value to the next one. The
    /// previous value is `None` when the component has no state yet or it has
    /// a different type.
    pub fn new<T, F>(update: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Option<&T>) -> T + Send + Sync + 'static,
    {
        Self {
            apply: Arc::new(move |current: Option<&StateValue>| {
                let previous = current.and_then(|value| value.downcast_ref::<T>());
                Arc::new(update(previous)) as StateValue
            }),
        }
    }

    /// Update that replaces the state with `value`.
    pub fn set<T>(value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        Self::new(move |_: Option<&T>| value.clone())
    }

    fn apply(&self, current: Option<&StateValue>) -> StateValue {
        (self.apply)(current)
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateUpdate")
    }
}

#[derive(Clone, Default)]
pub struct StateHandler {
    pending: HashMap<ComponentKey, Vec<StateUpdate>>,
    values: HashMap<ComponentKey, StateValue>,
    // Keys this handler applied or initialized, with how many queued updates
    // it consumed for each.
    applied: HashMap<ComponentKey, usize>,
}

impl StateHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_state_update(&mut self, key: ComponentKey, update: StateUpdate) {
        self.pending.entry(key).or_default().push(update);
    }

    pub fn has_pending_updates(&self) -> bool {
        self.pending.values().any(|updates| !updates.is_empty())
    }

    pub fn pending_update_count(&self, key: &ComponentKey) -> usize {
        self.pending.get(key).map_or(0, Vec::len)
    }

    /// Copy handed to a layout pass. It starts with nothing applied.
    pub fn snapshot(&self) -> StateHandler {
        StateHandler {
            pending: self.pending.clone(),
            values: self.values.clone(),
            applied: HashMap::default(),
        }
    }

    /// Stores `value` unless the component already has state.
    pub fn initialize_state(&mut self, key: &ComponentKey, value: StateValue) {
        if !self.values.contains_key(key) {
            self.values.insert(key.clone(), value);
            self.applied.entry(key.clone()).or_insert(0);
        }
    }

    /// Folds the pending updates of `key` into its state and returns the
    /// resulting value.
    pub fn apply_pending_updates(&mut self, key: &ComponentKey) -> Option<StateValue> {
        let updates = self.pending.remove(key).unwrap_or_default();
        if !updates.is_empty() {
            let mut current = self.values.get(key).cloned();
            for update in &updates {
                current = Some(update.apply(current.as_ref()));
            }
            if let Some(value) = current {
                self.values.insert(key.clone(), value);
            }
        }
        *self.applied.entry(key.clone()).or_insert(0) += updates.len();
        self.values.get(key).cloned()
    }

    pub fn state(&self, key: &ComponentKey) -> Option<&StateValue> {
        self.values.get(key)
    }

    pub fn state_value<T>(&self, key: &ComponentKey) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.values
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Merges the outcome of a layout pass: drops exactly the updates the pass
    /// consumed and takes over the state values it produced.
    pub fn commit(&mut self, pass: StateHandler) {
        let StateHandler {
            mut values,
            applied,
            ..
        } = pass;
        for (key, consumed) in applied {
            if let Some(updates) = self.pending.get_mut(&key) {
                let consumed = consumed.min(updates.len());
                *updates = updates.split_off(consumed);
                if updates.is_empty() {
                    self.pending.remove(&key);
                }
            }
            if let Some(value) = values.remove(&key) {
                self.values.insert(key, value);
            }
        }
    }
}

impl fmt::Debug for StateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandler")
            .field("pending_keys", &self.pending.len())
            .field("values", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn increment() -> StateUpdate {
        StateUpdate::new(|count: Option<&u32>| count.copied().unwrap_or(0) + 1)
    }

    #[test]
    fn applying_folds_updates_in_queue_order() {
        let key = ComponentKey::new("label");
        let mut handler = StateHandler::new();
        handler.queue_state_update(key.clone(), StateUpdate::set(String::from("a")));
        handler.queue_state_update(
            key.clone(),
            StateUpdate::new(|text: Option<&String>| format!("{}b", text.cloned().unwrap_or_default())),
        );

        let mut pass = handler.snapshot();
        pass.apply_pending_updates(&key);

        assert_eq!(pass.state_value::<String>(&key).as_deref().map(String::as_str), Some("ab"));
        assert!(!pass.has_pending_updates());
    }

    #[test]
    fn commit_keeps_updates_queued_during_the_pass() {
        let key = ComponentKey::new("counter");
        let mut tree = StateHandler::new();
        tree.queue_state_update(key.clone(), increment());

        let mut pass = tree.snapshot();
        pass.apply_pending_updates(&key);

        // Arrives while the pass is running.
        tree.queue_state_update(key.clone(), increment());
        tree.commit(pass);

        assert_eq!(tree.state_value::<u32>(&key).as_deref(), Some(&1));
        assert_eq!(tree.pending_update_count(&key), 1);
    }

    #[test]
    fn commit_ignores_keys_the_pass_never_touched() {
        let touched = ComponentKey::new("touched");
        let other = ComponentKey::new("other");
        let mut tree = StateHandler::new();
        tree.queue_state_update(touched.clone(), increment());

        let mut pass = tree.snapshot();
        pass.apply_pending_updates(&touched);

        tree.queue_state_update(other.clone(), increment());
        tree.commit(pass);

        assert_eq!(tree.pending_update_count(&other), 1);
        assert!(tree.state(&other).is_none());
    }

    #[test]
    fn initialize_state_does_not_overwrite() {
        let key = ComponentKey::new("toggle");
        let mut handler = StateHandler::new();
        handler.initialize_state(&key, Arc::new(true));
        handler.initialize_state(&key, Arc::new(false));

        assert_eq!(handler.state_value::<bool>(&key).as_deref(), Some(&true));
    }

    #[test]
    fn initialized_state_survives_commit() {
        let key = ComponentKey::new("toggle");
        let mut tree = StateHandler::new();
        let mut pass = tree.snapshot();
        pass.initialize_state(&key, Arc::new(7u8));

        tree.commit(pass);

        assert_eq!(tree.state_value::<u8>(&key).as_deref(), Some(&7));
    }
}
