use std::collections::HashMap;

use super::aliases::AliasTable;
use super::error::{RegistryError, Result};
use super::{TagId, TagRegistry, is_pseudo, normalize};

/// In-memory tag registry
///
/// Ids are assigned sequentially starting at 1. Used for tests and for
/// evaluating rules against tag sets that are never persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    ids: HashMap<String, TagId>,
    names: Vec<String>,
    aliases: AliasTable,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that resolves through an existing alias table
    #[must_use]
    pub fn with_aliases(aliases: AliasTable) -> Self {
        Self {
            aliases,
            ..Self::default()
        }
    }

    /// Add an alias mapping
    ///
    /// # Errors
    /// See [`AliasTable::add_alias`]
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> Result<()> {
        self.aliases.add_alias(alias, canonical)
    }

    #[must_use]
    pub const fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Number of registered tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn canonical(&self, name: &str) -> String {
        let normalized = normalize(name);
        self.aliases.canonicalize(&normalized).to_string()
    }
}

impl TagRegistry for MemoryRegistry {
    fn get(&self, name: &str) -> Result<Option<TagId>> {
        Ok(self.ids.get(&self.canonical(name)).copied())
    }

    fn get_or_create(&mut self, name: &str) -> Result<TagId> {
        let canonical = self.canonical(name);
        if canonical.is_empty() || is_pseudo(&canonical) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }

        if let Some(id) = self.ids.get(&canonical) {
            return Ok(*id);
        }

        let id = TagId::new(self.names.len() as u64 + 1)
            .ok_or_else(|| RegistryError::Backend("tag id overflow".to_string()))?;
        self.names.push(canonical.clone());
        self.ids.insert(canonical, id);
        Ok(id)
    }

    fn name(&self, id: TagId) -> Result<Option<String>> {
        let index = usize::try_from(id.get() - 1)
            .map_err(|_| RegistryError::Backend(format!("tag id {id} out of range")))?;
        Ok(self.names.get(index).cloned())
    }
}
