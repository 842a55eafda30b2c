//! Scenario registry: named configs validated at registration time.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use hearth_core::ScenarioConfig;

use crate::scenarios;

/// Keyed map of scenario name to validated config.
pub struct ScenarioRegistry {
    scenarios: BTreeMap<String, ScenarioConfig>,
}

impl ScenarioRegistry {
    /// Registry holding the built-in scenarios.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self {
            scenarios: BTreeMap::new(),
        };
        registry.register(scenarios::river_camp())?;
        registry.register(scenarios::frost_hollow())?;
        Ok(registry)
    }

    /// Validate and add a scenario; duplicate names are rejected.
    pub fn register(&mut self, config: ScenarioConfig) -> Result<()> {
        config.validate()?;
        if self.scenarios.contains_key(&config.name) {
            bail!("duplicate scenario name {:?}", config.name);
        }
        self.scenarios.insert(config.name.clone(), config);
        Ok(())
    }

    /// Look up a scenario by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScenarioConfig> {
        self.scenarios.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }
}
