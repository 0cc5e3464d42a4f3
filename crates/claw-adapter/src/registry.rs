//! ---
//! claw_section: "02-config-adapters"
//! claw_subsection: "module"
//! claw_type: "source"
//! claw_scope: "code"
//! claw_description: "Configuration adapters and adapter registry."
//! claw_version: "v0.0.0-prealpha"
//! claw_owner: "tbd"
//! ---
//! Lookup from instance type name to adapter constructor.
//!
//! The registry is an explicit value shared through `Arc`; there is no global
//! table. Every [`AdapterRegistry::create`] call hands out a fresh adapter so
//! concurrent renders never share working state.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::openclaw::OpenClawAdapter;
use crate::{ConfigAdapter, OPEN_CLAW};

/// Factory producing a fresh adapter instance.
pub type AdapterConstructor = Arc<dyn Fn() -> Box<dyn ConfigAdapter> + Send + Sync>;

pub struct AdapterRegistry {
    constructors: RwLock<HashMap<String, AdapterConstructor>>,
}

impl AdapterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with every adapter that ships in this crate.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(
            OPEN_CLAW,
            Arc::new(|| Box::new(OpenClawAdapter::new()) as Box<dyn ConfigAdapter>),
        );
        registry
    }

    /// Register `constructor` for `kind`, replacing any earlier entry.
    pub fn register(&self, kind: impl Into<String>, constructor: AdapterConstructor) {
        let kind = kind.into();
        debug!(kind = %kind, "registering config adapter");
        self.constructors.write().insert(kind, constructor);
    }

    /// Fresh adapter for `kind`. Surrounding whitespace in `kind` is ignored.
    pub fn create(&self, kind: &str) -> Result<Box<dyn ConfigAdapter>> {
        let kind = kind.trim();
        let constructor = self
            .constructors
            .read()
            .get(kind)
            .cloned()
            .ok_or_else(|| AdapterError::NotFound(kind.to_owned()))?;
        Ok(constructor())
    }

    pub fn is_supported(&self, kind: &str) -> bool {
        self.constructors.read().contains_key(kind.trim())
    }

    /// Registered type names in sorted order.
    pub fn supported_types(&self) -> BTreeSet<String> {
        self.constructors.read().keys().cloned().collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.supported_types())
            .finish()
    }
}
