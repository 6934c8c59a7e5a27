use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the attribute that identifies the described column. It must be the
/// first attribute of every definitions header.
pub const IDENTIFIER_ATTRIBUTE: &str = "column";

/// Attributes a definitions file may carry, in canonical order.
pub const RECOGNIZED_ATTRIBUTES: [&str; 4] = [IDENTIFIER_ATTRIBUTE, "type", "label", "description"];

/// Returns `true` when `name` belongs to [`RECOGNIZED_ATTRIBUTES`].
pub fn is_recognized_attribute(name: &str) -> bool {
    RECOGNIZED_ATTRIBUTES.contains(&name)
}

/// One row of a local data-dictionary file.
///
/// `column` is serialized first so that any written form keeps the identifier
/// as the leading attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Identifier of the described column.
    pub column: String,
    /// Declared semantic type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Human readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDefinition {
    /// Creates a definition for `column` with no optional attributes.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            field_type: None,
            label: None,
            description: None,
        }
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Translates the definition into the catalog's field representation.
    ///
    /// Nested metadata is only populated from attributes present on the
    /// definition; a definition carrying nothing but its column yields a bare
    /// `{"id": ...}` entry.
    pub fn to_catalog_field(&self) -> CatalogField {
        let info = FieldInfo {
            type_override: self.field_type.clone(),
            label: self.label.clone(),
            notes: self.description.clone(),
            extra: Map::new(),
        };
        CatalogField {
            id: self.column.clone(),
            info: (!info.is_empty()).then_some(info),
        }
    }
}

/// Translates an ordered definition set into catalog fields, preserving order.
pub fn to_catalog_fields(definitions: &[FieldDefinition]) -> Vec<CatalogField> {
    definitions
        .iter()
        .map(FieldDefinition::to_catalog_field)
        .collect()
}

/// One physical column of a remote tabular resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub id: String,
    /// Remote attributes this tool does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaField {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

/// Descriptive metadata nested under a stored dictionary field.
///
/// The catalog reports absent entries as empty strings; [`FieldInfo::effective`]
/// normalises those away.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldInfo {
    fn is_empty(&self) -> bool {
        self.type_override.is_none()
            && self.label.is_none()
            && self.notes.is_none()
            && self.extra.is_empty()
    }

    /// Returns the value only when it carries non-blank text.
    pub fn effective(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|text| !text.is_empty())
    }
}

/// One entry of the data dictionary currently stored by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FieldInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DictionaryField {
    pub fn new(id: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type: field_type.into(),
            info: None,
            extra: Map::new(),
        }
    }

    pub fn with_info(mut self, info: FieldInfo) -> Self {
        self.info = Some(info);
        self
    }

    /// The stored `info.type_override`, when it carries non-blank text.
    pub fn type_override(&self) -> Option<&str> {
        self.info
            .as_ref()
            .and_then(|info| FieldInfo::effective(&info.type_override))
    }

    /// Rebuilds the local definition this stored field corresponds to.
    ///
    /// The declared type is the stored override when one is set, falling back
    /// to the stored column type, so re-uploading an untouched download
    /// detects no type change.
    pub fn to_definition(&self) -> FieldDefinition {
        let info = self.info.as_ref();
        let field_type = self.type_override().unwrap_or(&self.field_type);
        FieldDefinition {
            column: self.id.clone(),
            field_type: Some(field_type.to_string()),
            label: info
                .and_then(|info| FieldInfo::effective(&info.label))
                .map(str::to_string),
            description: info
                .and_then(|info| FieldInfo::effective(&info.notes))
                .map(str::to_string),
        }
    }
}

/// A field as sent to the catalog when the dictionary is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogField {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FieldInfo>,
}

/// A declared type that differs from the type currently stored for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    pub column: String,
    pub old_type: String,
    pub new_type: String,
}

impl TypeChange {
    pub fn new(
        column: impl Into<String>,
        old_type: impl Into<String>,
        new_type: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            old_type: old_type.into(),
            new_type: new_type.into(),
        }
    }
}

impl fmt::Display for TypeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.column, self.old_type, self.new_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_definition_translates_without_info() {
        let field = FieldDefinition::new("a").to_catalog_field();
        assert_eq!(serde_json::to_value(&field).unwrap(), json!({"id": "a"}));
    }

    #[test]
    fn present_attributes_populate_nested_info() {
        let field = FieldDefinition::new("b")
            .with_type("varchar")
            .with_description("Borough name")
            .to_catalog_field();
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"id": "b", "info": {"type_override": "varchar", "notes": "Borough name"}})
        );
    }

    #[test]
    fn definition_serializes_column_first() {
        let text = serde_json::to_string(&FieldDefinition::new("a").with_label("A")).unwrap();
        assert!(text.starts_with(r#"{"column":"a""#));
    }

    #[test]
    fn stored_field_keeps_unknown_attributes() {
        let raw = json!({
            "id": "CREATED_ON",
            "type": "timestamp",
            "info": {"label": "Date created", "notes": "", "type_override": ""},
            "schema": {"is_index": false}
        });
        let field: DictionaryField = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(field.field_type, "timestamp");
        assert_eq!(serde_json::to_value(&field).unwrap(), raw);
    }

    #[test]
    fn stored_field_rebuilds_definition_ignoring_blank_info() {
        let field: DictionaryField = serde_json::from_value(json!({
            "id": "CREATED_ON",
            "type": "timestamp",
            "info": {"label": "Date created", "notes": "", "type_override": ""}
        }))
        .unwrap();
        assert_eq!(
            field.to_definition(),
            FieldDefinition::new("CREATED_ON")
                .with_type("timestamp")
                .with_label("Date created")
        );
    }

    #[test]
    fn stored_override_wins_over_column_type() {
        let field = DictionaryField::new("zip", "int").with_info(FieldInfo {
            type_override: Some("text".into()),
            ..FieldInfo::default()
        });
        assert_eq!(field.to_definition().field_type.as_deref(), Some("text"));
    }
}
