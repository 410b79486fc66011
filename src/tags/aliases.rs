use std::collections::{HashMap, HashSet};

use super::error::{RegistryError, Result};
use super::normalize;

/// Alias table mapping alternate spellings to canonical tag text
///
/// Both sides are stored normalized. Resolution is a single hop: an alias
/// target may never itself be an alias, so one lookup always lands on the
/// canonical name.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Maps alias → canonical tag (e.g., "kitty" → "cat")
    aliases: HashMap<String, String>,

    /// Maps canonical tag → set of aliases
    reverse_aliases: HashMap<String, HashSet<String>>,
}

impl AliasTable {
    /// Create a new empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from stored `(alias, canonical)` pairs
    ///
    /// # Errors
    /// Returns the first validation error among the pairs
    pub fn from_pairs<I, A, C>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut table = Self::new();
        for (alias, canonical) in pairs {
            table.add_alias(alias.as_ref(), canonical.as_ref())?;
        }
        Ok(table)
    }

    /// Add an alias mapping (e.g., "kitty" → "cat")
    ///
    /// # Errors
    /// Returns error if:
    /// - Either side normalizes to an empty name
    /// - Alias already exists with a different canonical
    /// - The canonical is itself an alias
    /// - Adding the alias would create a circular reference
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> Result<()> {
        let alias = normalize(alias);
        let canonical = normalize(canonical);

        if alias.is_empty() {
            return Err(RegistryError::InvalidName(alias));
        }
        if canonical.is_empty() {
            return Err(RegistryError::InvalidName(canonical));
        }
        if alias == canonical {
            return Err(RegistryError::CircularAlias(format!(
                "'{alias}' cannot be an alias of itself"
            )));
        }

        if let Some(existing) = self.aliases.get(&alias) {
            if *existing != canonical {
                return Err(RegistryError::AliasExists(alias, existing.clone()));
            }
            return Ok(());
        }

        if self.would_create_cycle(&alias, &canonical) {
            return Err(RegistryError::CircularAlias(format!(
                "Adding alias '{alias}' → '{canonical}' would create circular reference"
            )));
        }

        if let Some(target) = self.aliases.get(&canonical) {
            return Err(RegistryError::AliasChain(canonical, target.clone()));
        }

        if self.reverse_aliases.contains_key(&alias) {
            return Err(RegistryError::InvalidTag(format!(
                "'{alias}' is the target of other aliases and cannot become one"
            )));
        }

        self.reverse_aliases
            .entry(canonical.clone())
            .or_default()
            .insert(alias.clone());
        self.aliases.insert(alias, canonical);

        Ok(())
    }

    /// Remove an alias, returning the canonical it pointed to
    ///
    /// # Errors
    /// Returns error if alias doesn't exist
    pub fn remove_alias(&mut self, alias: &str) -> Result<String> {
        let alias = normalize(alias);
        let canonical = self
            .aliases
            .remove(&alias)
            .ok_or_else(|| RegistryError::AliasNotFound(alias.clone()))?;

        if let Some(aliases) = self.reverse_aliases.get_mut(&canonical) {
            aliases.remove(&alias);
            if aliases.is_empty() {
                self.reverse_aliases.remove(&canonical);
            }
        }

        Ok(canonical)
    }

    /// Resolve an already normalized name to its canonical form
    #[must_use]
    pub fn canonicalize<'a>(&'a self, normalized: &'a str) -> &'a str {
        self.aliases
            .get(normalized)
            .map_or(normalized, String::as_str)
    }

    /// Get all aliases of a canonical tag
    #[must_use]
    pub fn get_aliases(&self, canonical: &str) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .reverse_aliases
            .get(&normalize(canonical))
            .map_or_else(Vec::new, |set| set.iter().cloned().collect());
        aliases.sort();
        aliases
    }

    /// List all `(alias, canonical)` pairs, sorted by alias
    #[must_use]
    pub fn list_aliases(&self) -> Vec<(String, String)> {
        let mut aliases: Vec<_> = self
            .aliases
            .iter()
            .map(|(alias, canonical)| (alias.clone(), canonical.clone()))
            .collect();
        aliases.sort();
        aliases
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// True when `canonical` is already an alias of `alias`
    fn would_create_cycle(&self, alias: &str, canonical: &str) -> bool {
        self.reverse_aliases
            .get(alias)
            .is_some_and(|sources| sources.contains(canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();

        assert_eq!(table.canonicalize("kitty"), "cat");
        assert_eq!(table.canonicalize("cat"), "cat");
    }

    #[test]
    fn test_alias_sides_are_normalized() {
        let mut table = AliasTable::new();
        table.add_alias("  Kitty ", "CAT").unwrap();

        assert_eq!(table.canonicalize("kitty"), "cat");
        assert_eq!(table.list_aliases(), vec![("kitty".into(), "cat".into())]);
    }

    #[test]
    fn test_duplicate_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();

        // Same mapping is idempotent
        table.add_alias("kitty", "cat").unwrap();

        let result = table.add_alias("kitty", "feline");
        assert!(matches!(result, Err(RegistryError::AliasExists(_, _))));
    }

    #[test]
    fn test_self_alias_rejected() {
        let mut table = AliasTable::new();
        let result = table.add_alias("cat", "Cat");
        assert!(matches!(result, Err(RegistryError::CircularAlias(_))));
    }

    #[test]
    fn test_alias_target_cannot_be_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();

        let result = table.add_alias("kitten", "kitty");
        assert!(matches!(result, Err(RegistryError::AliasChain(_, _))));
    }

    #[test]
    fn test_circular_alias_direct() {
        let mut table = AliasTable::new();
        table.add_alias("a", "b").unwrap();

        let result = table.add_alias("b", "a");
        assert!(matches!(result, Err(RegistryError::CircularAlias(_))));
    }

    #[test]
    fn test_canonical_with_aliases_cannot_become_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();

        let result = table.add_alias("cat", "feline");
        assert!(matches!(result, Err(RegistryError::InvalidTag(_))));
    }

    #[test]
    fn test_empty_alias_rejected() {
        let mut table = AliasTable::new();
        let result = table.add_alias("(!)", "cat");
        assert!(matches!(result, Err(RegistryError::InvalidName(_))));
    }

    #[test]
    fn test_remove_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();
        table.add_alias("puss", "cat").unwrap();

        assert_eq!(table.remove_alias("kitty").unwrap(), "cat");

        assert_eq!(table.canonicalize("kitty"), "kitty");
        assert_eq!(table.canonicalize("puss"), "cat");
        assert_eq!(table.get_aliases("cat"), vec!["puss"]);
    }

    #[test]
    fn test_remove_missing_alias() {
        let mut table = AliasTable::new();
        let result = table.remove_alias("nope");
        assert!(matches!(result, Err(RegistryError::AliasNotFound(_))));
    }

    #[test]
    fn test_from_pairs() {
        let table = AliasTable::from_pairs([("kitty", "cat"), ("pup", "dog")]).unwrap();
        assert_eq!(table.canonicalize("pup"), "dog");
        assert_eq!(table.get_aliases("cat"), vec!["kitty"]);
    }
}
