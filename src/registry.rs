//! Chart instance registry.
//!
//! Maps a surface key to the chart currently mounted there. At most one
//! instance is live per surface: binding a new instance first tears down the
//! old one, and the slot is empty while that teardown runs.

use std::collections::HashMap;

/// Release hook run when an instance leaves the registry
pub trait Teardown {
    fn teardown(&mut self);
}

/// Owned store of live chart instances, keyed by surface
#[derive(Debug)]
pub struct ChartRegistry<T: Teardown> {
    slots: HashMap<String, T>,
}

impl<T: Teardown> Default for ChartRegistry<T> {
    fn default() -> Self {
        ChartRegistry {
            slots: HashMap::new(),
        }
    }
}

impl<T: Teardown> ChartRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `instance` to `surface`, tearing down any previous instance
    /// before the new one is stored.
    pub fn bind(&mut self, surface: &str, instance: T) -> &mut T {
        if let Some(mut previous) = self.slots.remove(surface) {
            previous.teardown();
        }
        self.slots.entry(surface.to_string()).or_insert(instance)
    }

    pub fn get(&self, surface: &str) -> Option<&T> {
        self.slots.get(surface)
    }

    pub fn get_mut(&mut self, surface: &str) -> Option<&mut T> {
        self.slots.get_mut(surface)
    }

    /// Tear down and remove the instance bound to `surface`.
    /// Returns false if nothing was bound.
    pub fn release(&mut self, surface: &str) -> bool {
        match self.slots.remove(surface) {
            Some(mut instance) => {
                instance.teardown();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
