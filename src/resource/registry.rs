//! Resource Registry - Load resource schemas from JSON
//!
//! Table columns, form fields, filter presets and import actions of every
//! resource panel are declared in embedded JSON. Adding a panel for a new
//! resource type means adding a schema here plus a [`super::Resource`] impl.

use super::ResourceKind;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/cms.json")];

/// Color definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColorDef {
    pub value: String,
    pub color: [u8; 3],
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
    #[serde(default)]
    pub color_map: Option<String>,
}

/// How a form field is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single line of text
    Text,
    /// Free text with newlines
    Multiline,
    /// Boolean toggle
    Flag,
    /// Comma separated placeholder names
    Variables,
    /// One of `options`
    Choice,
}

/// Form field definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Part of the natural key: editable on create, read-only on edit
    #[serde(default)]
    pub natural_key: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Confirmation config for actions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfirmConfig {
    /// Message to show in confirmation dialog
    #[serde(default)]
    pub message: Option<String>,
    /// If true, default selection is Yes; if false, default is No
    #[serde(default)]
    pub default_yes: bool,
    /// If true, action is destructive (shown in red)
    #[serde(default)]
    pub destructive: bool,
}

/// Import action definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    /// Action name, also the last segment of its endpoint path
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub shortcut: Option<String>,
    #[serde(default)]
    pub confirm: Option<ConfirmConfig>,
}

/// Resource schema from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub name_field: String,
    pub category_label: String,
    /// Filter options offered even when no loaded entity uses them
    #[serde(default)]
    pub category_presets: Vec<String>,
    /// Fields the free-text search looks at
    pub search_fields: Vec<String>,
    /// Server-side offset paging is available
    #[serde(default)]
    pub paged: bool,
    pub columns: Vec<ColumnDef>,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl ResourceDef {
    pub fn action(&self, key: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.key == key)
    }

    pub fn action_by_shortcut(&self, shortcut: char) -> Option<&ActionDef> {
        let mut buf = [0u8; 4];
        let shortcut = &*shortcut.encode_utf8(&mut buf);
        self.actions
            .iter()
            .find(|a| a.shortcut.as_deref() == Some(shortcut))
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub color_maps: HashMap<String, Vec<ColorDef>>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            color_maps: HashMap::new(),
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.color_maps.extend(partial.color_maps);
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource schema by registry key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Schema of a built-in resource kind.
///
/// Every [`ResourceKind`] has an embedded schema; a missing one is a build
/// defect caught by the registry tests.
pub fn resource_def(kind: ResourceKind) -> &'static ResourceDef {
    get_resource(kind.key())
        .unwrap_or_else(|| panic!("No embedded schema for resource '{}'", kind.key()))
}

/// Get a color map by name
pub fn get_color_map(name: &str) -> Option<&'static Vec<ColorDef>> {
    get_registry().color_maps.get(name)
}

/// Get color for a value based on color map name
pub fn get_color_for_value(color_map_name: &str, value: &str) -> Option<[u8; 3]> {
    get_color_map(color_map_name)?
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.color)
}
