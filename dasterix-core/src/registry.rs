//! Category registry: `(category, edition)` to schema.
//!
//! Registration happens at startup; during decoding the registry is only
//! read. Re-registering the same `(category, edition)` replaces the prior
//! entry; a lookup by category alone returns the most recently registered
//! edition. A failed registration leaves the registry untouched.

use crate::diag::SchemaError;
use crate::schema::CategorySchema;

#[derive(Debug, Default)]
pub struct Registry {
    // Registration order; lookups scan from the back so "most recently
    // registered" falls out for free.
    entries: Vec<CategorySchema>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Validates and stores a category schema.
    ///
    /// # Errors
    ///
    /// Propagates the schema's first consistency violation; the registry is
    /// unchanged in that case.
    pub fn register(&mut self, schema: CategorySchema) -> Result<(), SchemaError> {
        schema.validate()?;
        log::debug!(
            "registering cat {:03} edition {}",
            schema.category,
            schema.edition
        );
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.category == schema.category && e.edition == schema.edition)
        {
            *existing = schema;
        } else {
            self.entries.push(schema);
        }
        Ok(())
    }

    /// Most recently registered schema for `category`.
    pub fn lookup(&self, category: u8) -> Option<&CategorySchema> {
        self.entries.iter().rev().find(|e| e.category == category)
    }

    pub fn lookup_edition(&self, category: u8, edition: &str) -> Option<&CategorySchema> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.category == category && e.edition == edition)
    }

    /// Registered `(category, edition)` pairs in registration order.
    pub fn list(&self) -> Vec<(u8, &str)> {
        self.entries
            .iter()
            .map(|e| (e.category, e.edition.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ItemDef, ItemLayout, Rule, Uap, UapSlot};

    fn schema(category: u8, edition: &str) -> CategorySchema {
        let items = vec![ItemDef {
            id: "010".into(),
            name: "Test".into(),
            rule: Rule::Optional,
            layout: ItemLayout::Explicit,
        }];
        let uaps = vec![Uap {
            name: "default".into(),
            slots: vec![UapSlot::Item(0)],
        }];
        CategorySchema::new(category, edition, "Test", items, uaps, None, Vec::new())
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = Registry::new();
        reg.register(schema(48, "1.21")).unwrap();

        assert!(reg.lookup(48).is_some());
        assert!(reg.lookup(34).is_none());
    }

    #[test]
    fn latest_edition_wins() {
        let mut reg = Registry::new();
        reg.register(schema(48, "1.21")).unwrap();
        reg.register(schema(48, "1.31")).unwrap();

        assert_eq!(reg.lookup(48).unwrap().edition, "1.31");
        assert_eq!(reg.lookup_edition(48, "1.21").unwrap().edition, "1.21");
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn reregistration_replaces() {
        let mut reg = Registry::new();
        reg.register(schema(48, "1.21")).unwrap();

        let mut replacement = schema(48, "1.21");
        replacement.name = "Replaced".into();
        reg.register(replacement).unwrap();

        assert_eq!(reg.list().len(), 1);
        assert_eq!(reg.lookup(48).unwrap().name, "Replaced");
    }

    #[test]
    fn failed_registration_preserves_state() {
        let mut reg = Registry::new();
        reg.register(schema(48, "1.21")).unwrap();

        let invalid =
            CategorySchema::new(62, "1.0", "Bad", Vec::new(), Vec::new(), None, Vec::new());
        assert!(reg.register(invalid).is_err());

        assert_eq!(reg.list().len(), 1);
        assert!(reg.lookup(62).is_none());
    }
}
