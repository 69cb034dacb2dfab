//! System trait and runner

use super::component_store::ComponentStore;

/// System processing components once per simulation step
pub trait System {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Called once before the first update; returns whether the system is active
    fn initialize(&mut self, store: &mut ComponentStore) -> bool;

    /// Run one step; returns false on failure
    fn update(&mut self, store: &mut ComponentStore) -> bool;
}

/// Ordered list of systems driven together
#[derive(Default)]
pub struct SystemRunner {
    systems: Vec<Box<dyn System>>,
    initialized: bool,
}

impl SystemRunner {
    /// Runner with no systems
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system; it runs after every system added before it
    pub fn add_system(&mut self, system: Box<dyn System>) -> &mut Self {
        log::debug!("Added system {}", system.name());
        self.systems.push(system);
        self
    }

    /// Names of the registered systems, in run order
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Initialize every system once
    ///
    /// Returns false if any system reported itself inactive.
    pub fn initialize(&mut self, store: &mut ComponentStore) -> bool {
        let mut all_active = true;
        for system in &mut self.systems {
            if !system.initialize(store) {
                log::warn!("System {} did not activate", system.name());
                all_active = false;
            }
        }
        self.initialized = true;
        all_active
    }

    /// Run one step of every system, initializing first if needed
    ///
    /// Every system runs even if an earlier one fails.
    pub fn update(&mut self, store: &mut ComponentStore) -> bool {
        if !self.initialized {
            self.initialize(store);
        }
        let mut ok = true;
        for system in &mut self.systems {
            if !system.update(store) {
                log::warn!("System {} update failed", system.name());
                ok = false;
            }
        }
        ok
    }

    /// Whether [`SystemRunner::initialize`] has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
