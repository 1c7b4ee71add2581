//! Configuration values with change listeners
//!
//! An [`Updatable`] owns a configuration value together with the listeners
//! that want to hear about edits to it. Subscribing twice with the same
//! [`ListenerId`] replaces the earlier listener, so call sites can re-subscribe
//! freely without accumulating duplicates.

use crate::core::error::ConfigError;

/// Types that can check their own invariants.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Identifies a listener registered on an [`Updatable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

type Listener<T> = Box<dyn Fn(&T) + Send>;

/// A validated configuration value with a listener registry.
pub struct Updatable<T> {
    value: T,
    listeners: Vec<(ListenerId, Listener<T>)>,
    /// Notify listeners automatically after every successful edit
    pub auto_update: bool,
}

impl<T: Validate + Clone> Updatable<T> {
    /// Wrap a value, rejecting it if it is malformed.
    pub fn new(value: T) -> Result<Self, ConfigError> {
        value.validate()?;
        Ok(Self {
            value,
            listeners: Vec::new(),
            auto_update: true,
        })
    }

    /// Current value
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Register a listener. Returns `true` if `id` was not registered before.
    pub fn subscribe(&mut self, id: ListenerId, listener: impl Fn(&T) + Send + 'static) -> bool {
        if let Some(slot) = self.listeners.iter_mut().find(|(existing, _)| *existing == id) {
            slot.1 = Box::new(listener);
            false
        } else {
            self.listeners.push((id, Box::new(listener)));
            true
        }
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Apply an edit. The edit is made on a copy and only committed if the
    /// result validates; an invalid edit leaves the current value untouched.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> Result<(), ConfigError> {
        let mut candidate = self.value.clone();
        edit(&mut candidate);
        candidate.validate()?;
        self.value = candidate;

        if self.auto_update {
            self.notify();
        }
        Ok(())
    }

    /// Invoke every listener with the current value.
    pub fn notify(&self) {
        log::debug!("Notifying {} configuration listeners", self.listeners.len());
        for (_, listener) in &self.listeners {
            listener(&self.value);
        }
    }
}
