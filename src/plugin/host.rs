use std::collections::HashMap;

use axum::Router;
use serde_json::Value;
use tracing::{debug, info};

use super::base::{ApiResource, ResourcePlugin};
use crate::error::PluginError;
use crate::migrations::MigrationSource;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Owns the registered plugins and drives their lifecycle.
#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Box<dyn ResourcePlugin>>,
    order: Vec<usize>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn ResourcePlugin>) -> Result<(), PluginError> {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(PluginError::DuplicatePlugin(plugin.name().to_string()));
        }
        debug!("Registered plugin '{}'", plugin.name());
        self.plugins.push(plugin);
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }

    fn visit(&self, index: usize, marks: &mut [Mark], order: &mut Vec<usize>) -> Result<(), PluginError> {
        match marks[index] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                return Err(PluginError::DependencyCycle(
                    self.plugins[index].name().to_string(),
                ))
            }
            Mark::Unvisited => {}
        }

        marks[index] = Mark::Visiting;
        for dependency in self.plugins[index].dependencies() {
            let dep_index =
                self.position(&dependency)
                    .ok_or_else(|| PluginError::MissingDependency {
                        plugin: self.plugins[index].name().to_string(),
                        dependency: dependency.clone(),
                    })?;
            self.visit(dep_index, marks, order)?;
        }
        marks[index] = Mark::Done;
        order.push(index);
        Ok(())
    }

    /// Registration order, with every plugin placed after its dependencies.
    fn resolve_order(&self) -> Result<Vec<usize>, PluginError> {
        let mut marks = vec![Mark::Unvisited; self.plugins.len()];
        let mut order = Vec::with_capacity(self.plugins.len());
        for index in 0..self.plugins.len() {
            self.visit(index, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    /// Initialize every plugin in dependency order. Each plugin receives the
    /// section of `settings` keyed by its name, or `null` when there is none.
    pub fn initialize(&mut self, settings: &HashMap<String, Value>) -> Result<(), PluginError> {
        let order = self.resolve_order()?;
        for &index in &order {
            let plugin = &mut self.plugins[index];
            let section = settings.get(plugin.name()).cloned().unwrap_or(Value::Null);
            plugin.initialize(section)?;
            info!("Initialized plugin '{}'", plugin.name());
        }
        self.order = order;
        Ok(())
    }

    /// Merge the routers of all initialized plugins.
    pub fn router(&mut self) -> Result<Router, PluginError> {
        let mut router = Router::new();
        for &index in &self.order {
            router = router.merge(self.plugins[index].setup_endpoints()?);
        }
        Ok(router)
    }

    /// Migration sources of all registered plugins, each placed after the
    /// sources named by its `migration_dependencies`. Does not require
    /// `initialize`.
    pub fn migrations(&self) -> Result<Vec<MigrationSource>, PluginError> {
        let mut pending: Vec<(String, Vec<String>, MigrationSource)> = self
            .resolve_order()?
            .into_iter()
            .map(|i| {
                let plugin = &self.plugins[i];
                (
                    plugin.name().to_string(),
                    plugin.migration_dependencies(),
                    plugin.migration_source(),
                )
            })
            .collect();

        let known: Vec<String> = pending.iter().map(|(_, _, s)| s.name.clone()).collect();
        for (plugin, dependencies, _) in &pending {
            if let Some(missing) = dependencies.iter().find(|d| !known.contains(d)) {
                return Err(PluginError::MissingDependency {
                    plugin: plugin.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        let mut sources: Vec<MigrationSource> = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|(_, dependencies, _)| {
                dependencies
                    .iter()
                    .all(|d| sources.iter().any(|s| &s.name == d))
            });
            match ready {
                Some(index) => sources.push(pending.remove(index).2),
                None => return Err(PluginError::DependencyCycle(pending[0].0.clone())),
            }
        }
        Ok(sources)
    }

    pub fn api_resources(&self) -> Vec<ApiResource> {
        self.ordered().flat_map(|p| p.api_resources()).collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &dyn ResourcePlugin> + '_ {
        self.order.iter().map(|&i| self.plugins[i].as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::metrics_migrations;
    use std::sync::{Arc, Mutex};

    struct Stub {
        name: &'static str,
        deps: Vec<String>,
        migration_deps: Vec<String>,
        log: Arc<Mutex<Vec<(String, Value)>>>,
    }

    impl Stub {
        fn boxed(
            name: &'static str,
            deps: &[&str],
            log: &Arc<Mutex<Vec<(String, Value)>>>,
        ) -> Box<dyn ResourcePlugin> {
            Box::new(Stub {
                name,
                deps: deps.iter().map(|d| d.to_string()).collect(),
                migration_deps: Vec::new(),
                log: log.clone(),
            })
        }

        fn with_migration_deps(
            name: &'static str,
            migration_deps: &[&str],
            log: &Arc<Mutex<Vec<(String, Value)>>>,
        ) -> Box<dyn ResourcePlugin> {
            Box::new(Stub {
                name,
                deps: Vec::new(),
                migration_deps: migration_deps.iter().map(|d| d.to_string()).collect(),
                log: log.clone(),
            })
        }
    }

    impl ResourcePlugin for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }

        fn initialize(&mut self, settings: Value) -> Result<(), PluginError> {
            self.log.lock().unwrap().push((self.name.to_string(), settings));
            Ok(())
        }

        fn setup_endpoints(&mut self) -> Result<Router, PluginError> {
            Ok(Router::new())
        }

        fn migration_source(&self) -> MigrationSource {
            let mut source = metrics_migrations();
            source.name = self.name.to_string();
            source
        }

        fn migration_dependencies(&self) -> Vec<String> {
            self.migration_deps.clone()
        }
    }

    #[test]
    fn test_initializes_dependencies_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        host.register(Stub::boxed("votes", &["users"], &log)).unwrap();
        host.register(Stub::boxed("users", &[], &log)).unwrap();

        let mut settings = HashMap::new();
        settings.insert("users".to_string(), serde_json::json!({"a": 1}));
        host.initialize(&settings).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log[0], ("users".to_string(), serde_json::json!({"a": 1})));
        assert_eq!(log[1], ("votes".to_string(), Value::Null));

        let names: Vec<String> = host
            .migrations()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["users", "votes"]);
    }

    #[test]
    fn test_migrations_follow_migration_dependencies() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut host = PluginHost::new();
        host.register(Stub::with_migration_deps("tags", &["posts"], &log))
            .unwrap();
        host.register(Stub::with_migration_deps("posts", &[], &log))
            .unwrap();

        let names: Vec<String> = host
            .migrations()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["posts", "tags"]);
        assert!(log.lock().unwrap().is_empty());

        let mut host = PluginHost::new();
        host.register(Stub::with_migration_deps("tags", &["posts"], &log))
            .unwrap();
        assert!(matches!(
            host.migrations(),
            Err(PluginError::MissingDependency { .. })
        ));

        let mut host = PluginHost::new();
        host.register(Stub::with_migration_deps("a", &["b"], &log))
            .unwrap();
        host.register(Stub::with_migration_deps("b", &["a"], &log))
            .unwrap();
        assert!(matches!(
            host.migrations(),
            Err(PluginError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_rejects_duplicates_missing_dependencies_and_cycles() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut host = PluginHost::new();
        host.register(Stub::boxed("a", &[], &log)).unwrap();
        assert!(matches!(
            host.register(Stub::boxed("a", &[], &log)),
            Err(PluginError::DuplicatePlugin(_))
        ));

        let mut host = PluginHost::new();
        host.register(Stub::boxed("a", &["ghost"], &log)).unwrap();
        match host.initialize(&HashMap::new()) {
            Err(PluginError::MissingDependency { plugin, dependency }) => {
                assert_eq!(plugin, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("expected missing dependency, got {:?}", other.err()),
        }

        let mut host = PluginHost::new();
        host.register(Stub::boxed("a", &["b"], &log)).unwrap();
        host.register(Stub::boxed("b", &["a"], &log)).unwrap();
        assert!(matches!(
            host.initialize(&HashMap::new()),
            Err(PluginError::DependencyCycle(_))
        ));
        assert!(log.lock().unwrap().is_empty());
    }
}
