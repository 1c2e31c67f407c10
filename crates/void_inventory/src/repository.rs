//! Item template lookup

use crate::error::{InventoryError, Result};
use crate::item::ItemTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only source of item templates
pub trait TemplateRepository: Send + Sync {
    /// Look up a template by id
    fn template(&self, id: &str) -> Option<&ItemTemplate>;

    /// Whether the id is known
    fn contains(&self, id: &str) -> bool {
        self.template(id).is_some()
    }
}

/// In-memory template table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ItemTemplate>", into = "Vec<ItemTemplate>")]
pub struct TemplateCatalog {
    templates: HashMap<String, ItemTemplate>,
}

impl TemplateCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of templates
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| InventoryError::Persistence(e.to_string()))
    }

    /// Add a template, builder style
    pub fn with(mut self, template: ItemTemplate) -> Self {
        self.insert(template);
        self
    }

    /// Add or replace a template. Returns the replaced one.
    pub fn insert(&mut self, template: ItemTemplate) -> Option<ItemTemplate> {
        if template.width == 0 || template.height == 0 {
            log::warn!("template {} has an empty footprint, clamping to 1x1", template.id);
        }
        self.templates.insert(template.id.clone(), template)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate all templates
    pub fn iter(&self) -> impl Iterator<Item = &ItemTemplate> {
        self.templates.values()
    }
}

impl TemplateRepository for TemplateCatalog {
    fn template(&self, id: &str) -> Option<&ItemTemplate> {
        self.templates.get(id)
    }
}

impl From<Vec<ItemTemplate>> for TemplateCatalog {
    fn from(templates: Vec<ItemTemplate>) -> Self {
        templates.into_iter().fold(Self::new(), Self::with)
    }
}

impl From<TemplateCatalog> for Vec<ItemTemplate> {
    fn from(catalog: TemplateCatalog) -> Self {
        let mut templates: Vec<_> = catalog.templates.into_values().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }
}
