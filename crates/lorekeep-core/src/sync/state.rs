//! Live campaign state container
//!
//! Every mutation publishes the new tree on a watch channel. Subscribers see
//! the latest tree only, so a slow consumer coalesces bursts of edits instead
//! of queueing them.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

/// The in-memory campaign tree, keyed by domain
pub type StateTree = Map<String, Value>;

struct Shared {
    tree: watch::Sender<Arc<StateTree>>,
    hydrated: watch::Sender<bool>,
}

/// Observable live state
#[derive(Clone)]
pub struct LiveState {
    shared: Arc<Shared>,
}

impl LiveState {
    /// Empty, not yet hydrated state
    #[must_use]
    pub fn new() -> Self {
        let (tree, _) = watch::channel(Arc::new(StateTree::new()));
        let (hydrated, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared { tree, hydrated }),
        }
    }

    /// Current tree
    #[must_use]
    pub fn snapshot(&self) -> Arc<StateTree> {
        self.shared.tree.borrow().clone()
    }

    /// Current tree as a JSON value
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.snapshot().as_ref().clone())
    }

    /// Mutate the tree in place and notify subscribers
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut StateTree),
    {
        self.shared.tree.send_modify(|tree| f(Arc::make_mut(tree)));
    }

    /// Set one domain
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.update(move |tree| {
            tree.insert(key, value);
        });
    }

    /// Read one domain
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.shared.tree.borrow().get(key).cloned()
    }

    /// Replace the whole tree
    pub fn replace(&self, tree: StateTree) {
        self.shared.tree.send_replace(Arc::new(tree));
    }

    /// Receive change notifications
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<StateTree>> {
        self.shared.tree.subscribe()
    }

    /// Set the hydration flag; returns `true` only for the first call
    pub fn mark_hydrated(&self) -> bool {
        self.shared.hydrated.send_if_modified(|hydrated| {
            if *hydrated {
                false
            } else {
                *hydrated = true;
                true
            }
        })
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        *self.shared.hydrated.borrow()
    }

    /// Wait until hydration has finished, successfully or not
    pub async fn wait_hydrated(&self) {
        let mut rx = self.shared.hydrated.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}
