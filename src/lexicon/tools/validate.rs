//! Pre-write checks for local data-dictionary definitions.
//!
//! [`validate`] runs the header shape check, then referential integrity
//! against the resource schema, then type-change detection against the stored
//! dictionary. The first failing check decides the rejection; type-change
//! detection never rejects and only reports what the change gate must confirm.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::lexicon::tools::error::{Result, ToolError};
use crate::lexicon::tools::model::{
    DictionaryField, FieldDefinition, IDENTIFIER_ATTRIBUTE, SchemaField, TypeChange,
    is_recognized_attribute,
};

/// Why a definition set was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Header attributes outside the recognized set, in header order.
    UnknownColumns { attributes: Vec<String> },
    /// The header does not lead with the identifier attribute.
    HeaderOrder { found: String },
    /// Described columns missing from the schema, sorted.
    UnknownFields { fields: Vec<String> },
}

impl From<Rejection> for ToolError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::UnknownColumns { attributes } => ToolError::UnknownColumns { attributes },
            Rejection::HeaderOrder { found } => ToolError::HeaderOrder {
                expected: IDENTIFIER_ATTRIBUTE.to_string(),
                found,
            },
            Rejection::UnknownFields { fields } => ToolError::UnknownFields { fields },
        }
    }
}

/// Definitions that passed every structural check, with the type changes
/// that still need confirmation before they may be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub definitions: Vec<FieldDefinition>,
    pub pending_changes: Vec<TypeChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted(Accepted),
    Rejected(Rejection),
}

impl ValidationOutcome {
    /// Converts a rejection into the matching [`ToolError`].
    pub fn into_result(self) -> Result<Accepted> {
        match self {
            ValidationOutcome::Accepted(accepted) => Ok(accepted),
            ValidationOutcome::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

/// Checks local definitions against the remote schema and stored dictionary.
pub fn validate(
    definitions: Vec<FieldDefinition>,
    header: &[String],
    schema: &[SchemaField],
    dictionary: &[DictionaryField],
) -> ValidationOutcome {
    if let Err(rejection) = check_header(header) {
        return ValidationOutcome::Rejected(rejection);
    }
    if let Err(rejection) = check_fields(&definitions, schema) {
        return ValidationOutcome::Rejected(rejection);
    }
    let pending_changes = detect_type_changes(&definitions, dictionary);
    debug!(
        definition_count = definitions.len(),
        pending = pending_changes.len(),
        "definitions accepted"
    );
    ValidationOutcome::Accepted(Accepted {
        definitions,
        pending_changes,
    })
}

fn check_header(header: &[String]) -> std::result::Result<(), Rejection> {
    let mut unknown: Vec<String> = Vec::new();
    for name in header {
        if !is_recognized_attribute(name) && !unknown.contains(name) {
            unknown.push(name.clone());
        }
    }
    if !unknown.is_empty() {
        return Err(Rejection::UnknownColumns {
            attributes: unknown,
        });
    }

    match header.first() {
        Some(first) if first == IDENTIFIER_ATTRIBUTE => Ok(()),
        other => Err(Rejection::HeaderOrder {
            found: other.cloned().unwrap_or_default(),
        }),
    }
}

fn check_fields(
    definitions: &[FieldDefinition],
    schema: &[SchemaField],
) -> std::result::Result<(), Rejection> {
    let known: HashSet<&str> = schema.iter().map(|field| field.id.as_str()).collect();
    let missing: BTreeSet<&str> = definitions
        .iter()
        .map(|definition| definition.column.as_str())
        .filter(|column| !known.contains(column))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Rejection::UnknownFields {
            fields: missing.into_iter().map(str::to_string).collect(),
        })
    }
}

/// Lists declared types that differ from the stored type of the same column,
/// in definition order. Columns without a declared type, or without a stored
/// entry, never produce a change. A declared type equal to the stored
/// `type_override` restates what the catalog already holds and is not a change
/// either.
pub fn detect_type_changes(
    definitions: &[FieldDefinition],
    dictionary: &[DictionaryField],
) -> Vec<TypeChange> {
    let stored: HashMap<&str, &DictionaryField> = dictionary
        .iter()
        .map(|field| (field.id.as_str(), field))
        .collect();
    definitions
        .iter()
        .filter_map(|definition| {
            let new_type = definition.field_type.as_deref()?;
            let field = *stored.get(definition.column.as_str())?;
            let unchanged = field.field_type == new_type || field.type_override() == Some(new_type);
            (!unchanged).then(|| TypeChange::new(&definition.column, &field.field_type, new_type))
        })
        .collect()
}

pub(crate) fn stored_types(dictionary: &[DictionaryField]) -> HashMap<&str, &str> {
    dictionary
        .iter()
        .map(|field| (field.id.as_str(), field.field_type.as_str()))
        .collect()
}
