//! # Settings
//!
//! The settings live in an ordinary managed document (mode
//! [`SessionMode::Settings`](crate::SessionMode)), so they can be edited,
//! undone and serialized like any other data. [`Settings`] is the typed view
//! read out of that document.

use crate::format::{format_for_name, DataFormat, FormatError};
use crate::history::{HistoryConfig, DEFAULT_CAPACITY, DEFAULT_DEBOUNCE};
use crate::mutations::PropertySorting;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Typed view of the settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// `json` or `yaml`
    pub data_format: String,

    pub code_editor: CodeEditorSettings,

    pub gui_editor: GuiEditorSettings,

    pub meta_schema: MetaSchemaSettings,

    pub history: HistorySettings,

    /// Panel layout per session mode
    pub panels: BTreeMap<String, Vec<PanelSettings>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeEditorSettings {
    pub font_size: u32,

    /// Spaces per level in the text form (0 = compact)
    pub indentation: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuiEditorSettings {
    pub maximum_depth: u32,
    pub property_sorting: PropertySorting,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaSchemaSettings {
    pub allow_boolean_schema: bool,
    pub allow_multiple_types: bool,
    pub show_additional_properties_button: bool,
    pub object_types_comfort: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistorySettings {
    pub capacity: usize,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSettings {
    pub panel_type: String,
    pub mode: String,
    pub size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let panels = ["file_editor", "schema_editor", "settings"]
            .into_iter()
            .map(|mode| {
                let panel = |panel_type: &str| PanelSettings {
                    panel_type: panel_type.to_string(),
                    mode: mode.to_string(),
                    size: 50,
                };
                (mode.to_string(), vec![panel("text_editor"), panel("gui_editor")])
            })
            .collect();

        Self {
            data_format: "json".to_string(),
            code_editor: CodeEditorSettings::default(),
            gui_editor: GuiEditorSettings::default(),
            meta_schema: MetaSchemaSettings::default(),
            history: HistorySettings::default(),
            panels,
        }
    }
}

impl Default for CodeEditorSettings {
    fn default() -> Self {
        Self {
            font_size: 14,
            indentation: 2,
        }
    }
}

impl Default for GuiEditorSettings {
    fn default() -> Self {
        Self {
            maximum_depth: 20,
            property_sorting: PropertySorting::SchemaOrder,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl Settings {
    /// Read settings out of a settings document.
    ///
    /// Missing fields take their defaults. A document that does not fit the
    /// settings shape at all yields the defaults as a whole.
    pub fn from_document(document: &Value) -> Self {
        match Settings::deserialize(document) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Settings document is not usable, falling back to defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Text format selected by `dataFormat` and `codeEditor.indentation`
    pub fn format(&self) -> Result<Box<dyn DataFormat>, FormatError> {
        format_for_name(&self.data_format, self.code_editor.indentation)
    }

    pub fn property_sorting(&self) -> PropertySorting {
        self.gui_editor.property_sorting
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            capacity: self.history.capacity,
            debounce: Duration::from_millis(self.history.debounce_ms),
        }
    }
}

/// Initial content of the settings document
pub fn default_settings_document() -> Value {
    let panels = |mode: &str| {
        json!([
            {"panelType": "text_editor", "mode": mode, "size": 50},
            {"panelType": "gui_editor", "mode": mode, "size": 50}
        ])
    };
    json!({
        "dataFormat": "json",
        "codeEditor": {
            "fontSize": 14,
            "indentation": 2
        },
        "guiEditor": {
            "maximumDepth": 20,
            "propertySorting": "schemaOrder"
        },
        "metaSchema": {
            "allowBooleanSchema": false,
            "allowMultipleTypes": false,
            "showAdditionalPropertiesButton": false,
            "objectTypesComfort": false
        },
        "history": {
            "capacity": DEFAULT_CAPACITY,
            "debounceMs": DEFAULT_DEBOUNCE.as_millis() as u64
        },
        "panels": {
            "file_editor": panels("file_editor"),
            "schema_editor": panels("schema_editor"),
            "settings": panels("settings")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document_matches_typed_defaults() {
        assert_eq!(Settings::from_document(&default_settings_document()), Settings::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let settings = Settings::from_document(&json!({
            "dataFormat": "yaml",
            "guiEditor": {"propertySorting": "dataOrder"}
        }));
        assert_eq!(settings.data_format, "yaml");
        assert_eq!(settings.property_sorting(), PropertySorting::DataOrder);
        assert_eq!(settings.gui_editor.maximum_depth, 20);
        assert_eq!(settings.code_editor.indentation, 2);
        assert_eq!(settings.format().unwrap().name(), "yaml");
    }

    #[test]
    fn test_unusable_document_falls_back() {
        let settings = Settings::from_document(&json!({"codeEditor": {"fontSize": "large"}}));
        assert_eq!(settings, Settings::default());
        assert_eq!(Settings::from_document(&json!([1, 2])), Settings::default());
    }

    #[test]
    fn test_history_config() {
        let settings = Settings::from_document(&json!({"history": {"capacity": 5, "debounceMs": 250}}));
        assert_eq!(
            settings.history_config(),
            HistoryConfig {
                capacity: 5,
                debounce: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn test_unknown_format_name() {
        let settings = Settings::from_document(&json!({"dataFormat": "toml"}));
        assert!(settings.format().is_err());
    }
}
