//! Instantiable node types.
//!
//! A [`PluginCatalog`] maps type ids and type names to plugin factories.
//! Containers hold an `Arc<PluginCatalog>` and hand it down to every child
//! they create, so a whole graph instantiates from one catalog.

use core::fmt;

use crate::error::{GraphError, GraphResult, Target};
use crate::key::Key;
use crate::plugin::EffectPlugin;

/// Identifier of a registered plugin type, assigned from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginTypeId(u32);

impl PluginTypeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PluginTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginTypeId({})", self.0)
    }
}

impl From<PluginTypeId> for Key {
    fn from(id: PluginTypeId) -> Self {
        Key::Id(id.0)
    }
}

type Factory = Box<dyn Fn() -> Box<dyn EffectPlugin> + Send + Sync>;

struct Entry {
    id: PluginTypeId,
    name: String,
    description: String,
    factory: Factory,
}

/// Metadata of one registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginType {
    /// Type id.
    pub id: PluginTypeId,
    /// Unique type name.
    pub name: String,
    /// One-line description.
    pub description: String,
}

/// Registry of plugin factories, indexed by type id and type name.
#[derive(Default)]
pub struct PluginCatalog {
    entries: Vec<Entry>,
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.name))
            .finish()
    }
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a unique type name.
    pub fn register<F, P>(
        &mut self,
        name: &str,
        description: &str,
        factory: F,
    ) -> GraphResult<PluginTypeId>
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: EffectPlugin + 'static,
    {
        self.register_boxed(name, description, move || -> Box<dyn EffectPlugin> {
            Box::new(factory())
        })
    }

    /// Register a factory that already returns a boxed plugin.
    pub fn register_boxed<F>(
        &mut self,
        name: &str,
        description: &str,
        factory: F,
    ) -> GraphResult<PluginTypeId>
    where
        F: Fn() -> Box<dyn EffectPlugin> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(GraphError::Malformed("type names must not be empty"));
        }
        if self.entries.iter().any(|e| e.name == name) {
            return Err(GraphError::DuplicateName(name.to_owned()));
        }
        let id = PluginTypeId(self.entries.len() as u32 + 1);
        self.entries.push(Entry {
            id,
            name: name.to_owned(),
            description: description.to_owned(),
            factory: Box::new(factory),
        });
        Ok(id)
    }

    fn entry(&self, key: &Key) -> GraphResult<&Entry> {
        self.entries
            .iter()
            .find(|e| key.matches(e.id.0, Some(&e.name)))
            .ok_or_else(|| GraphError::not_found(Target::NodeType, key))
    }

    /// Metadata of every registered type, in registration order.
    pub fn descriptors(&self) -> Vec<PluginType> {
        self.entries
            .iter()
            .map(|e| PluginType {
                id: e.id,
                name: e.name.clone(),
                description: e.description.clone(),
            })
            .collect()
    }

    /// Registered type ids.
    pub fn type_ids(&self) -> Vec<PluginTypeId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Registered type names.
    pub fn type_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Name of the type with this id.
    pub fn type_name_of(&self, id: PluginTypeId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.as_str())
    }

    /// Id of the type with this name.
    pub fn type_id_of(&self, name: &str) -> Option<PluginTypeId> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.id)
    }

    /// Returns true if a type matches `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.entry(key).is_ok()
    }

    /// Build a fresh plugin of the type matching `key`.
    pub fn instantiate(
        &self,
        key: &Key,
    ) -> GraphResult<(PluginTypeId, String, Box<dyn EffectPlugin>)> {
        let entry = self.entry(key)?;
        Ok((entry.id, entry.name.clone(), (entry.factory)()))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{NodeSetup, RenderContext};

    struct Nop;

    impl EffectPlugin for Nop {
        fn init(&mut self, _setup: &mut NodeSetup<'_>) -> GraphResult<()> {
            Ok(())
        }

        fn render(&mut self, _ctx: &mut RenderContext<'_>) {}
    }

    fn catalog() -> PluginCatalog {
        let mut catalog = PluginCatalog::new();
        catalog.register("nop", "does nothing", || Nop).unwrap();
        catalog.register("other", "also nothing", || Nop).unwrap();
        catalog
    }

    #[test]
    fn ids_follow_registration_order() {
        let catalog = catalog();
        let ids: Vec<u32> = catalog.type_ids().into_iter().map(|id| id.index()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(catalog.type_names(), vec!["nop", "other"]);
    }

    #[test]
    fn reverse_lookups() {
        let catalog = catalog();
        let id = catalog.type_id_of("other").unwrap();
        assert_eq!(catalog.type_name_of(id), Some("other"));
        assert_eq!(catalog.type_id_of("missing"), None);
    }

    #[test]
    fn boxed_factories_share_the_id_space() {
        let mut catalog = catalog();
        let id = catalog
            .register_boxed("boxed", "", || Box::new(Nop) as Box<dyn EffectPlugin>)
            .unwrap();
        assert_eq!(id.index(), 3);
        assert!(catalog.contains(&Key::from("boxed")));
    }

    #[test]
    fn duplicate_type_name_rejected() {
        let mut catalog = catalog();
        let err = catalog.register("nop", "again", || Nop).unwrap_err();
        assert_eq!(err, GraphError::DuplicateName("nop".to_string()));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn instantiate_by_id_or_name() {
        let catalog = catalog();
        let (id, name, _) = catalog.instantiate(&Key::Id(2)).unwrap();
        assert_eq!((id.index(), name.as_str()), (2, "other"));
        let (id, _, _) = catalog.instantiate(&Key::from("nop")).unwrap();
        assert_eq!(id.index(), 1);

        let err = catalog.instantiate(&Key::from("blur")).err().unwrap();
        assert_eq!(err.to_string(), "node type 'blur' not found");
    }
}
