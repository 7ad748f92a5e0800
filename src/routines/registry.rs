use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::models::RoutineDocument;

const BUILT_IN: &[(&str, &str)] = &[
    (
        "full-body-functional",
        include_str!("../../data/routines/full_body_functional.json"),
    ),
    (
        "functional-alternative",
        include_str!("../../data/routines/functional_alternative.json"),
    ),
];

/// Routines shipped with the app, keyed by id. Checked before any user store.
#[derive(Debug, Clone, Default)]
pub struct RoutineRegistry {
    documents: BTreeMap<String, RoutineDocument>,
}

impl RoutineRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn built_in() -> Result<Self> {
        let mut registry = Self::empty();
        for (id, raw) in BUILT_IN {
            let document: RoutineDocument = serde_json::from_str(raw)
                .with_context(|| format!("built-in routine '{id}' is not valid JSON"))?;
            registry.insert(*id, document);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, id: impl Into<String>, document: RoutineDocument) {
        self.documents.insert(id.into(), document);
    }

    pub fn with(mut self, id: impl Into<String>, document: RoutineDocument) -> Self {
        self.insert(id, document);
        self
    }

    pub fn get(&self, id: &str) -> Option<&RoutineDocument> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{routines::validate, settings::RestDefaults};

    #[test]
    fn built_in_routines_parse_and_validate() {
        let registry = RoutineRegistry::built_in().unwrap();
        assert_eq!(registry.len(), BUILT_IN.len());

        for id in registry.ids() {
            let document = registry.get(id).unwrap().clone();
            let routine = validate(document, id, &RestDefaults::default())
                .unwrap_or_else(|err| panic!("{id}: {err}"));
            assert_eq!(routine.id, id);
            assert!(routine.blocks[0].is_preparation);
            assert_eq!(routine.rest_between_blocks, 60);
            assert!(registry.contains(id));
        }
        assert!(!registry.contains("my-own-routine"));
    }
}
