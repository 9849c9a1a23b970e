//! Store - the observable state container.
//!
//! A [`Store`] owns one piece of state and has a single mutation path,
//! [`Store::update`]. Every update notifies each subscriber exactly once,
//! after the new state is in place. [`Listeners`] is the same subscription
//! list without state, used for event streams such as table events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Listener<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered list of callbacks for values of type `E`.
pub struct Listeners<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Callbacks run in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + Send + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Single-writer state container with change subscriptions.
pub struct Store<S> {
    state: S,
    listeners: Listeners<S>,
}

impl<S> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            listeners: Listeners::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Apply a mutation and notify subscribers once.
    pub fn update<R>(&mut self, mutate: impl FnOnce(&mut S) -> R) -> R {
        let result = mutate(&mut self.state);
        self.listeners.emit(&self.state);
        result
    }

    /// Replace the whole state and notify subscribers once.
    pub fn replace(&mut self, state: S) -> S {
        self.update(|current| std::mem::replace(current, state))
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&S) + Send + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Consume the store, dropping subscribers.
    pub fn into_state(self) -> S {
        self.state
    }
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
