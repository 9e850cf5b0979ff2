//! # Service Registry
//!
//! Catalog of logical service nodes and their declared dependencies, used by
//! bootstrapping code outside the core to sequence startup.
//!
//! ## Key Features
//!
//! - **Immutable definitions**: a service id is registered once
//! - **Referential integrity**: every dependency must exist when registered;
//!   a failing batch registers nothing
//! - **Acyclic catalog**: a batch that would close a dependency cycle is
//!   rejected as a whole
//! - **Deterministic startup order**: Kahn's algorithm with lexicographic
//!   tie-breaking
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::registry::{ServiceDefinition, ServiceRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ServiceRegistry::new();
//! registry.register_all(vec![
//!     ServiceDefinition::new("gateway", 8080, ["routing"]),
//!     ServiceDefinition::new("routing", 8081, Vec::<String>::new()),
//! ])?;
//!
//! assert_eq!(registry.topological_order()?, vec!["routing", "gateway"]);
//! # Ok(())
//! # }
//! ```

use crate::error::{CoreError, Result};
use crate::logging::log_registry_operation;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// A logical service node and the services it needs running first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: String,
    pub port: u16,
    pub dependencies: Vec<String>,
}

impl ServiceDefinition {
    pub fn new<I, S>(id: impl Into<String>, port: u16, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            port,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }
}

/// Thread-safe service catalog. Read-mostly, so guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, ServiceDefinition>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a static catalog, validating it as one batch
    pub fn with_services(definitions: Vec<ServiceDefinition>) -> Result<Self> {
        let registry = Self::new();
        registry.register_all(definitions)?;
        Ok(registry)
    }

    /// Register a single service whose dependencies are already registered
    pub fn register(&self, definition: ServiceDefinition) -> Result<()> {
        self.register_all(vec![definition])
    }

    /// Register a batch atomically. Dependencies may point at already
    /// registered services or at other members of the batch. Any duplicate id,
    /// empty id, self-dependency, unknown dependency or dependency cycle
    /// aborts the whole batch.
    pub fn register_all(&self, definitions: Vec<ServiceDefinition>) -> Result<()> {
        let mut services = self.services.write();

        let mut batch_ids = HashSet::with_capacity(definitions.len());
        for definition in &definitions {
            if definition.id.trim().is_empty() {
                return Err(CoreError::Validation(
                    "service id must not be empty".to_string(),
                ));
            }
            if services.contains_key(&definition.id) || !batch_ids.insert(definition.id.as_str()) {
                return Err(CoreError::Integrity(format!(
                    "service {} is already registered",
                    definition.id
                )));
            }
        }

        for definition in &definitions {
            for dependency in &definition.dependencies {
                if dependency == &definition.id {
                    return Err(CoreError::Integrity(format!(
                        "service {} cannot depend on itself",
                        definition.id
                    )));
                }
                if !services.contains_key(dependency) && !batch_ids.contains(dependency.as_str()) {
                    warn!(
                        service = %definition.id,
                        dependency = %dependency,
                        "Rejecting service batch with unknown dependency"
                    );
                    return Err(CoreError::UnknownDependency {
                        service: definition.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        if let Err(err) = startup_order(services.values().chain(&definitions)) {
            warn!(error = %err, "Rejecting service batch that closes a dependency cycle");
            return Err(err);
        }

        let count = definitions.len();
        for definition in definitions {
            services.insert(definition.id.clone(), definition);
        }
        drop(services);

        log_registry_operation(
            "register_all",
            None,
            "registered",
            Some(&format!("{count} services")),
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<ServiceDefinition> {
        self.services.read().get(id).cloned()
    }

    /// Snapshot of every definition, ordered by id
    pub fn all(&self) -> Vec<ServiceDefinition> {
        let services = self.services.read();
        let mut all: Vec<ServiceDefinition> = services.values().cloned().collect();
        drop(services);
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Confirm a service exists and every dependency it declares is registered
    pub fn validate_contract(&self, name: &str) -> Result<ServiceDefinition> {
        let services = self.services.read();
        let definition = services
            .get(name)
            .ok_or_else(|| CoreError::UnknownService(name.to_string()))?;

        if let Some(missing) = definition
            .dependencies
            .iter()
            .find(|dependency| !services.contains_key(*dependency))
        {
            return Err(CoreError::UnknownDependency {
                service: name.to_string(),
                dependency: missing.clone(),
            });
        }

        Ok(definition.clone())
    }

    /// Ids of services that declare a dependency on `id`, sorted
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        let services = self.services.read();
        let mut dependents: Vec<String> = services
            .values()
            .filter(|definition| definition.dependencies.iter().any(|d| d == id))
            .map(|definition| definition.id.clone())
            .collect();
        drop(services);
        dependents.sort();
        dependents
    }

    /// Startup order consistent with every dependency edge. Among services
    /// that are ready at the same time, the lexicographically smallest id goes
    /// first. A cycle yields `DependencyCycle` listing the unresolved services.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let order = startup_order(&self.all())?;
        debug!(order = ?order, "Computed service startup order");
        Ok(order)
    }

    /// Remove every definition
    pub fn clear(&self) {
        self.services.write().clear();
    }

}

/// Kahn's algorithm over `definitions`, smallest ready id first. Services left
/// with unresolved dependencies are reported as a `DependencyCycle`.
fn startup_order<'a, I>(definitions: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a ServiceDefinition>,
{
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for definition in definitions {
        in_degree.entry(definition.id.as_str()).or_insert(0);
        for dependency in &definition.dependencies {
            *in_degree.entry(definition.id.as_str()).or_insert(0) += 1;
            dependents
                .entry(dependency.as_str())
                .or_default()
                .push(definition.id.as_str());
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(next) = ready.pop_first() {
        order.push(next.to_string());
        for dependent in dependents.get(next).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() != in_degree.len() {
        let remaining: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        return Err(CoreError::DependencyCycle { remaining });
    }
    Ok(order)
}
